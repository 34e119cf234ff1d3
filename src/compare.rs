//! Comparison orchestration.
//!
//! This module runs the full pipeline for a pair of texts: normalization,
//! edit script, variant analysis, and the similarity report. When a
//! confusion matrix is supplied, character comparisons also get the
//! chance-corrected and weighted scores.

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::align::character_alignment;
use crate::confusion::{
    glyph_error_rates, glyph_frequencies, overall_baseline_agreement,
    per_glyph_baseline_agreement, to_probability_matrix, ConfusionMatrix,
};
use crate::lexical::{capitalized_word_changes, character_counts, word_metrics};
use crate::models::*;
use crate::normalize::normalize;
use crate::refine::edit_script_normalized;
use crate::similarity::{
    bias_flag, character_distance, character_error_rate, corrected_similarity,
    normalized_edit_distance, observed_similarity, token_distance, weighted_similarity,
    word_error_rate,
};
use crate::tokenize::tokenize;
use crate::variant::analyze_variants;
use crate::weights::{weight_table_with_progress, WeightTableCache};

/// Compare two texts.
pub fn compare_texts(
    text1: &str,
    text2: &str,
    params: &ComparisonParams,
    confusion: Option<&ConfusionMatrix>,
    show_progress: bool,
) -> ComparisonResult {
    run_comparison(text1, text2, params, confusion, None, show_progress)
}

/// Compare two texts, reusing weight tables across calls.
pub fn compare_texts_cached(
    text1: &str,
    text2: &str,
    params: &ComparisonParams,
    confusion: Option<&ConfusionMatrix>,
    cache: &mut WeightTableCache,
    show_progress: bool,
) -> ComparisonResult {
    run_comparison(text1, text2, params, confusion, Some(cache), show_progress)
}

/// Compare one reference text against many witnesses in parallel.
/// Results come back in witness order.
pub fn compare_batch(
    reference: &str,
    witnesses: &[String],
    params: &ComparisonParams,
    confusion: Option<&ConfusionMatrix>,
    show_progress: bool,
) -> Vec<ComparisonResult> {
    let progress = if show_progress {
        let pb = ProgressBar::new(witnesses.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results: Vec<ComparisonResult> = witnesses
        .par_iter()
        .map(|witness| {
            let result = compare_texts(reference, witness, params, confusion, false);
            if let Some(ref pb) = progress {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    results
}

fn run_comparison(
    text1: &str,
    text2: &str,
    params: &ComparisonParams,
    confusion: Option<&ConfusionMatrix>,
    cache: Option<&mut WeightTableCache>,
    show_progress: bool,
) -> ComparisonResult {
    let norm1 = normalize(text1, &params.options, params.granularity);
    let norm2 = normalize(text2, &params.options, params.granularity);

    if show_progress {
        eprintln!("Computing {:?} diff...", params.granularity);
    }
    let operations = edit_script_normalized(&norm1, &norm2, params);

    if show_progress {
        eprintln!("Tallying variant forms...");
    }
    let variants = analyze_variants(text1, text2, &params.options, &params.diff);

    let mut result = ComparisonResult {
        version: env!("CARGO_PKG_VERSION").to_string(),
        parameters: params.clone(),
        operations: Vec::new(),
        report: SimilarityReport::default(),
        variants,
        word_metrics: None,
        case_changes: None,
        character_stats: None,
        glyph_error_rates: Vec::new(),
    };

    match params.granularity {
        Granularity::Character => {
            let (report, rates) =
                character_report(&norm1, &norm2, &operations, confusion, cache, show_progress);
            result.report = report;
            result.glyph_error_rates = rates;
            result.case_changes = Some(case_changes(&operations));
            result.character_stats = Some(character_stats(text1, text2, &params.options));
        }
        Granularity::Word => {
            if confusion.is_some() {
                debug!("Confusion matrix ignored at word granularity");
            }
            let (report, metrics) = word_report(&norm1, &norm2, &operations, params);
            result.report = report;
            result.word_metrics = Some(metrics);
        }
    }

    debug!(
        "Comparison done: distance {}, S_obs {:.4}",
        result.report.distance, result.report.s_obs
    );
    result.operations = operations;
    result
}

fn character_report(
    norm1: &str,
    norm2: &str,
    operations: &[EditOperation],
    confusion: Option<&ConfusionMatrix>,
    cache: Option<&mut WeightTableCache>,
    show_progress: bool,
) -> (SimilarityReport, Vec<GlyphErrorRate>) {
    let length1 = norm1.chars().count();
    let length2 = norm2.chars().count();
    let distance = character_distance(norm1, norm2);
    let s_obs = observed_similarity(distance, length1, length2);

    let mut report = SimilarityReport {
        length1,
        length2,
        distance,
        s_obs,
        cer: character_error_rate(distance, length1),
        ned: Some(normalized_edit_distance(distance, length1, length2)),
        ..Default::default()
    };

    let Some(matrix) = confusion.filter(|m| !m.is_empty()) else {
        return (report, Vec::new());
    };

    let p = to_probability_matrix(matrix);
    let frequencies = glyph_frequencies(norm1, norm2);
    let per_glyph = per_glyph_baseline_agreement(&p, matrix.glyphs());
    let s_baseline = overall_baseline_agreement(&frequencies, &per_glyph);
    report.s_baseline = Some(s_baseline);

    match corrected_similarity(s_obs, s_baseline) {
        Ok(s_corr) => {
            report.s_corr = Some(s_corr);
            report.bias_flag = bias_flag(s_obs, s_baseline, s_corr);
        }
        Err(e) => warn!("Corrected similarity unavailable: {}", e),
    }

    if show_progress {
        eprintln!(
            "Building {}x{} weight table...",
            matrix.len(),
            matrix.len()
        );
    }
    let table = match cache {
        Some(cache) => {
            let table = cache.get_or_build(&p, &frequencies, matrix.glyphs(), show_progress);
            debug!(
                "Weight table cache: {} hits, {} misses",
                cache.hits(),
                cache.misses()
            );
            table
        }
        None => Arc::new(weight_table_with_progress(
            &p,
            &frequencies,
            matrix.glyphs(),
            show_progress,
        )),
    };

    let alignment = character_alignment(operations);
    report.s_adj = Some(weighted_similarity(&alignment, &table));

    (report, glyph_error_rates(&p, matrix.glyphs()))
}

fn word_report(
    norm1: &str,
    norm2: &str,
    operations: &[EditOperation],
    params: &ComparisonParams,
) -> (SimilarityReport, WordMetrics) {
    // statistics always ignore whitespace tokens
    let stats_params = ComparisonParams {
        options: NormalizationOptions {
            keep_whitespace: false,
            ..params.options
        },
        ..params.clone()
    };
    let tokens1 = tokenize(norm1, Granularity::Word, &stats_params.options);
    let tokens2 = tokenize(norm2, Granularity::Word, &stats_params.options);

    let recomputed;
    let stats_ops: &[EditOperation] = if params.options.keep_whitespace {
        recomputed = edit_script_normalized(norm1, norm2, &stats_params);
        &recomputed
    } else {
        operations
    };

    let metrics = word_metrics(
        &tokens1,
        &tokens2,
        stats_ops,
        params.options.keep_capitalization,
    );
    let distance = token_distance(&tokens1, &tokens2);

    let report = SimilarityReport {
        length1: tokens1.len(),
        length2: tokens2.len(),
        distance,
        s_obs: observed_similarity(distance, tokens1.len(), tokens2.len()),
        wer: Some(word_error_rate(
            metrics.substitutions,
            metrics.deletions,
            metrics.insertions,
            metrics.words1,
        )),
        ..Default::default()
    };

    (report, metrics)
}

/// Raw character inventories and capitalized-word changes of the raw texts.
fn character_stats(text1: &str, text2: &str, options: &NormalizationOptions) -> CharacterStats {
    // words without punctuation or whitespace tokens, case as configured
    let word_options = NormalizationOptions {
        keep_punctuation: false,
        keep_whitespace: false,
        ..*options
    };
    let words1 = normalize(text1, &word_options, Granularity::Word);
    let words2 = normalize(text2, &word_options, Granularity::Word);
    let tokens1 = tokenize(&words1, Granularity::Word, &word_options);
    let tokens2 = tokenize(&words2, Granularity::Word, &word_options);

    CharacterStats {
        character_counts1: character_counts(text1),
        character_counts2: character_counts(text2),
        capitalized_words: capitalized_word_changes(&tokens1, &tokens2),
    }
}

/// Count single-character substitutions that only change letter case.
pub fn case_changes(operations: &[EditOperation]) -> CaseChanges {
    let mut changes = CaseChanges::default();

    for op in operations {
        let EditOperation::Substitution { text1, text2 } = op else {
            continue;
        };
        let (mut c1, mut c2) = (text1.chars(), text2.chars());
        let (Some(from), None, Some(to), None) = (c1.next(), c1.next(), c2.next(), c2.next())
        else {
            continue;
        };
        if from == to || !from.to_lowercase().eq(to.to_lowercase()) {
            continue;
        }

        let key = format!("{}→{}", from, to);
        if to.is_lowercase() {
            changes.to_lower += 1;
            *changes.to_lower_details.entry(key).or_insert(0) += 1;
        } else {
            changes.to_upper += 1;
            *changes.to_upper_details.entry(key).or_insert(0) += 1;
        }
    }

    changes.total = changes.to_lower + changes.to_upper;
    changes
}
