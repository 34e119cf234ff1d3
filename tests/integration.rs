//! Integration tests for glyphdiff.
//!
//! These tests exercise the full comparison pipeline through the public API.

use glyphdiff::align::character_alignment;
use glyphdiff::compare::{compare_batch, compare_texts};
use glyphdiff::confusion::{
    build_confusion_matrix, glyph_frequencies, overall_baseline_agreement,
    per_glyph_baseline_agreement, read_confusion_matrix, to_probability_matrix,
    write_confusion_matrix, ConfusionMatrix,
};
use glyphdiff::models::{
    ComparisonParams, DiffSettings, EditOperation, Granularity, NormalizationOptions,
};
use glyphdiff::refine::edit_script;
use glyphdiff::similarity::{corrected_similarity, weighted_similarity};
use glyphdiff::variant::analyze_variants;
use glyphdiff::weights::weight_table;

fn equal(text: &str) -> EditOperation {
    EditOperation::Equal {
        text: text.to_string(),
    }
}

fn substitution(text1: &str, text2: &str) -> EditOperation {
    EditOperation::Substitution {
        text1: text1.to_string(),
        text2: text2.to_string(),
    }
}

/// Concatenate one side of an edit script.
fn side(ops: &[EditOperation], first: bool) -> String {
    ops.iter()
        .filter_map(|op| if first { op.text1() } else { op.text2() })
        .collect()
}

fn skewed_matrix() -> ConfusionMatrix {
    ConfusionMatrix::new(
        vec!["a".to_string(), "e".to_string()],
        vec![vec![0, 10], vec![0, 10]],
    )
    .unwrap()
}

fn mixed_matrix() -> ConfusionMatrix {
    ConfusionMatrix::new(
        vec![
            "a".to_string(),
            "e".to_string(),
            "o".to_string(),
            "[DEL]".to_string(),
        ],
        vec![
            vec![20, 3, 2, 1],
            vec![2, 25, 1, 0],
            vec![4, 0, 18, 2],
            vec![1, 1, 0, 0],
        ],
    )
    .unwrap()
}

#[test]
fn test_identical_character_comparison() {
    let result = compare_texts("cat", "cat", &ComparisonParams::default(), None, false);

    assert_eq!(result.operations, vec![equal("cat")]);
    assert_eq!(result.report.distance, 0);
    assert!((result.report.s_obs - 1.0).abs() < 0.001);
}

#[test]
fn test_single_substitution() {
    let result = compare_texts("cat", "cot", &ComparisonParams::default(), None, false);

    assert_eq!(
        result.operations,
        vec![equal("c"), substitution("a", "o"), equal("t")]
    );
    assert_eq!(result.report.distance, 1);
    assert!((result.report.s_obs - 0.667).abs() < 0.001);
}

#[test]
fn test_word_substitution() {
    let params = ComparisonParams {
        granularity: Granularity::Word,
        ..Default::default()
    };
    let result = compare_texts("the quick fox", "the slow fox", &params, None, false);

    assert_eq!(
        result.operations,
        vec![equal("the"), substitution("quick", "slow"), equal("fox")]
    );
    assert!((result.report.wer.unwrap() - 33.33).abs() < 0.01);
}

#[test]
fn test_bias_correction_penalizes_chance_agreement() {
    let matrix = skewed_matrix();
    let result = compare_texts(
        "aaeaeaea",
        "aeaeaaea",
        &ComparisonParams::default(),
        Some(&matrix),
        false,
    );

    let report = &result.report;
    assert!((report.s_obs - 0.75).abs() < 0.001);
    assert!((report.s_baseline.unwrap() - 1.0).abs() < 0.001);
    assert!(report.s_corr.unwrap() < report.s_obs);
    // a saturated baseline leaves nothing to compare against
    assert_eq!(report.bias_flag, None);
}

#[test]
fn test_ligature_change_tally() {
    let options = NormalizationOptions {
        fold_ligatures: true,
        ..Default::default()
    };
    let analysis = analyze_variants("æsthetic", "aesthetic", &options, &DiffSettings::default());

    assert_eq!(analysis.change_tallies.get("æ→ae"), Some(&1));
    assert_eq!(analysis.category_totals.ligatures, 1);
}

#[test]
fn test_edit_script_rebuilds_both_texts() {
    let pairs = [
        ("the quick brown fox", "the quack brown fax"),
        ("manuscript", "manuſcript"),
        ("", "inserted"),
        ("deleted", ""),
        ("abcdef", "xyz"),
    ];

    for granularity in [Granularity::Character, Granularity::Word] {
        let params = ComparisonParams {
            granularity,
            options: NormalizationOptions {
                keep_whitespace: true,
                ..Default::default()
            },
            ..Default::default()
        };
        for (text1, text2) in pairs {
            let ops = edit_script(text1, text2, &params);
            assert_eq!(side(&ops, true), text1, "{:?} side 1", granularity);
            assert_eq!(side(&ops, false), text2, "{:?} side 2", granularity);
        }
    }
}

#[test]
fn test_alignment_covers_both_texts() {
    let ops = edit_script("chapter", "chaptre", &ComparisonParams::default());
    let pairs = character_alignment(&ops);

    let left: String = pairs.iter().filter_map(|p| p.char1).collect();
    let right: String = pairs.iter().filter_map(|p| p.char2).collect();
    assert_eq!(left, "chapter");
    assert_eq!(right, "chaptre");
    assert!(pairs.iter().all(|p| p.char1.is_some() || p.char2.is_some()));
}

#[test]
fn test_probability_rows_sum_to_one() {
    let p = to_probability_matrix(&mixed_matrix());

    for row in p.rows() {
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 0.001);
    }
}

#[test]
fn test_baseline_within_unit_interval() {
    let matrix = mixed_matrix();
    let p = to_probability_matrix(&matrix);
    let frequencies = glyph_frequencies("a sea of oaths", "a see of oeths");

    let per_glyph = per_glyph_baseline_agreement(&p, matrix.glyphs());
    let baseline = overall_baseline_agreement(&frequencies, &per_glyph);
    assert!((0.0..=1.0).contains(&baseline));
}

#[test]
fn test_weight_table_is_symmetric() {
    let matrix = mixed_matrix();
    let p = to_probability_matrix(&matrix);
    let frequencies = glyph_frequencies("a sea of oaths", "a see of oeths");
    let table = weight_table(&p, &frequencies, matrix.glyphs());

    for x in matrix.glyphs() {
        for y in matrix.glyphs() {
            let wxy = table.weight(x, y).unwrap();
            let wyx = table.weight(y, x).unwrap();
            assert!((wxy - wyx).abs() < 0.001);
            assert!((0.0..=1.0).contains(&wxy));
        }
    }
}

#[test]
fn test_weighted_similarity_in_range() {
    let matrix = mixed_matrix();
    let p = to_probability_matrix(&matrix);
    let frequencies = glyph_frequencies("oat", "eat");
    let table = weight_table(&p, &frequencies, matrix.glyphs());

    let ops = edit_script("oat", "eat", &ComparisonParams::default());
    let score = weighted_similarity(&character_alignment(&ops), &table);
    assert!((0.0..=1.0).contains(&score));
}

#[test]
fn test_corrected_similarity_properties() {
    // perfect agreement stays perfect
    assert!((corrected_similarity(1.0, 0.4).unwrap() - 1.0).abs() < 0.001);
    // agreement at chance level scores zero
    assert!(corrected_similarity(0.4, 0.4).unwrap().abs() < 0.001);
    // below a near-certain baseline there is no real agreement
    assert!(corrected_similarity(0.7, 0.99).unwrap().abs() < 0.001);
    assert!(corrected_similarity(1.5, 0.5).is_err());
}

#[test]
fn test_confusion_matrix_round_trip() {
    let matrix = build_confusion_matrix(
        "the cat sat on the mat",
        "tbe cot sat on tha mat",
        &DiffSettings::default(),
    )
    .unwrap();

    let mut buf = Vec::new();
    write_confusion_matrix(&matrix, "round trip", &mut buf).unwrap();
    let back = read_confusion_matrix(buf.as_slice()).unwrap();

    assert_eq!(back, matrix);
    assert_eq!(back.count("h", "b"), 1);
    assert_eq!(back.count("a", "o"), 1);
}

#[test]
fn test_normalization_makes_variants_equal() {
    let params = ComparisonParams {
        options: NormalizationOptions {
            fold_ligatures: true,
            fold_archaic_letters: true,
            fold_logograms: true,
            keep_capitalization: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = compare_texts("Cæſar & Brutus", "caesar and brutus", &params, None, false);

    assert_eq!(result.report.distance, 0);
    assert!(result.operations.iter().all(|op| !op.is_change()));
}

#[test]
fn test_batch_comparison() {
    let witnesses = vec![
        "in principio erat verbum".to_string(),
        "in principio erat uerbum".to_string(),
        "In principio erat verbvm".to_string(),
    ];
    let params = ComparisonParams::default();
    let results = compare_batch(&witnesses[0], &witnesses, &params, None, false);

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].report.distance, 0);
    assert_eq!(results[1].report.distance, 1);
    assert_eq!(results[2].report.distance, 2);
}

#[test]
fn test_diff_timeout_degrades_gracefully() {
    // distinct alphabets and no shared ends, so the diff reaches bisection
    let text1: String = std::iter::once('æ')
        .chain((0..3000).map(|i| (b'a' + (i % 7) as u8) as char))
        .collect();
    let text2: String = (0..3000)
        .map(|i| (b'h' + (i * 3 % 11) as u8) as char)
        .collect();
    let params = ComparisonParams {
        diff: DiffSettings {
            timeout_ms: Some(0),
            semantic_cleanup: true,
        },
        ..Default::default()
    };

    let result = compare_texts(&text1, &text2, &params, None, false);

    assert!(result.operations.is_empty());
    assert!(result.variants.change_tallies.is_empty());
    assert_eq!(result.variants.text1_tallies.get("æ"), Some(&1));
    // distances come from Levenshtein, not the abandoned diff
    assert_eq!(result.report.distance, 3001);
}
