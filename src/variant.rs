//! Tallying historical variant forms and the changes between them.
//!
//! Works on the raw texts, never the normalized ones, so the tallies show
//! what each witness actually wrote.

use crate::diff::{diff_chars, Chunk, DiffOp};
use crate::models::{CategoryTotals, DiffSettings, NormalizationOptions, VariantAnalysis};
use crate::normalize::{all_variant_forms, ARCHAIC_LETTERS, LIGATURES, LOGOGRAMS, UVW_FORMS};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Key used in change tallies.
#[inline]
pub fn change_key(from: &str, to: &str) -> String {
    format!("{}→{}", from, to)
}

/// Non-overlapping, case-sensitive occurrences of every variant form.
/// Forms that do not occur are omitted.
pub fn tally_variant_forms(text: &str) -> BTreeMap<String, usize> {
    all_variant_forms()
        .filter_map(|&(form, _)| {
            let count = text.matches(form).count();
            (count > 0).then(|| (form.to_string(), count))
        })
        .collect()
}

/// Full variant analysis of two raw texts.
pub fn analyze_variants(
    text1: &str,
    text2: &str,
    options: &NormalizationOptions,
    settings: &DiffSettings,
) -> VariantAnalysis {
    let mut analysis = VariantAnalysis {
        text1_tallies: tally_variant_forms(text1),
        text2_tallies: tally_variant_forms(text2),
        ..Default::default()
    };

    // literal matching with semantic grouping, whatever the caller chose
    let strict = DiffSettings {
        semantic_cleanup: true,
        ..*settings
    };
    match diff_chars(text1, text2, &strict) {
        Ok(chunks) => tally_changes(&chunks, options, &mut analysis.change_tallies),
        Err(e) => warn!("Variant change analysis skipped: {}", e),
    }

    analysis.category_totals = category_totals(&analysis.change_tallies);
    debug!(
        "Variant analysis: {} forms in text 1, {} in text 2, {} change kinds",
        analysis.text1_tallies.len(),
        analysis.text2_tallies.len(),
        analysis.change_tallies.len()
    );
    analysis
}

/// Scan adjacent delete/insert pairs (either order) for variant changes.
pub fn tally_changes(
    chunks: &[Chunk<char>],
    options: &NormalizationOptions,
    tallies: &mut BTreeMap<String, usize>,
) {
    let mut i = 0;
    while i + 1 < chunks.len() {
        let pair = match (chunks[i].op, chunks[i + 1].op) {
            (DiffOp::Delete, DiffOp::Insert) => Some((chunks[i].text(), chunks[i + 1].text())),
            (DiffOp::Insert, DiffOp::Delete) => Some((chunks[i + 1].text(), chunks[i].text())),
            _ => None,
        };

        match pair {
            Some((deleted, inserted)) => {
                tally_pair(&deleted, &inserted, options, tallies);
                i += 2;
            }
            None => i += 1,
        }
    }
}

fn tally_pair(
    deleted: &str,
    inserted: &str,
    options: &NormalizationOptions,
    tallies: &mut BTreeMap<String, usize>,
) {
    let mut bump = |from: &str, to: &str| *tallies.entry(change_key(from, to)).or_insert(0) += 1;

    for table in [LOGOGRAMS, LIGATURES, ARCHAIC_LETTERS, UVW_FORMS] {
        for &(form, expansion) in table {
            if deleted.contains(form) && inserted.contains(expansion) {
                bump(form, expansion);
            }
            if deleted.contains(expansion) && inserted.contains(form) {
                bump(expansion, form);
            }
        }
    }

    if options.fold_u_to_v || options.fold_j_to_i {
        let deleted = deleted.to_lowercase();
        let inserted = inserted.to_lowercase();
        let swaps: &[(char, char)] = match (options.fold_u_to_v, options.fold_j_to_i) {
            (true, true) => &[('u', 'v'), ('v', 'u'), ('i', 'j'), ('j', 'i')],
            (true, false) => &[('u', 'v'), ('v', 'u')],
            _ => &[('i', 'j'), ('j', 'i')],
        };
        for &(from, to) in swaps {
            if deleted.contains(from) && inserted.contains(to) {
                bump(&from.to_string(), &to.to_string());
            }
        }
    }
}

fn table_total(tallies: &BTreeMap<String, usize>, table: &[(&str, &str)]) -> usize {
    table
        .iter()
        .map(|&(form, expansion)| {
            tallies.get(&change_key(form, expansion)).copied().unwrap_or(0)
                + tallies.get(&change_key(expansion, form)).copied().unwrap_or(0)
        })
        .sum()
}

/// Sum the change tallies per category.
pub fn category_totals(tallies: &BTreeMap<String, usize>) -> CategoryTotals {
    let get = |key: &str| tallies.get(key).copied().unwrap_or(0);
    CategoryTotals {
        ligatures: table_total(tallies, LIGATURES),
        logograms: table_total(tallies, LOGOGRAMS),
        archaic: table_total(tallies, ARCHAIC_LETTERS),
        uv_swaps: get("u→v") + get("v→u"),
        ij_swaps: get("i→j") + get("j→i"),
        uvw_changes: table_total(tallies, UVW_FORMS),
    }
}
