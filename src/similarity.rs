//! Observed, chance-corrected, and weighted similarity scores.

use crate::confusion::{DELETED_GLYPH, INSERTED_GLYPH};
use crate::models::{AlignmentPair, BiasFlag};
use crate::weights::WeightTable;
use thiserror::Error;

const EPSILON: f64 = 1e-9;

/// Above this baseline almost every agreement is expected by chance, so a
/// score below it is treated as no real agreement.
pub const PREDICTABLE_ERROR_THRESHOLD: f64 = 0.98;

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SimilarityError {
    #[error("Similarity inputs must lie in [0, 1] (s_obs = {s_obs}, s_baseline = {s_baseline})")]
    OutOfRange { s_obs: f64, s_baseline: f64 },
}

/// Levenshtein distance over characters.
#[inline]
pub fn character_distance(text1: &str, text2: &str) -> usize {
    strsim::levenshtein(text1, text2)
}

/// Levenshtein distance over tokens.
pub fn token_distance(tokens1: &[&str], tokens2: &[&str]) -> usize {
    strsim::generic_levenshtein(&tokens1.to_vec(), &tokens2.to_vec())
}

/// `1 - d / max(len1, len2)`; two empty texts are identical, one empty text
/// shares nothing with a non-empty one.
pub fn observed_similarity(distance: usize, len1: usize, len2: usize) -> f64 {
    match (len1, len2) {
        (0, 0) => 1.0,
        (0, _) | (_, 0) => 0.0,
        _ => 1.0 - distance as f64 / len1.max(len2) as f64,
    }
}

/// Rescale `s_obs` so that chance agreement maps to 0 and perfect agreement
/// to 1, clamped to [0, 1].
pub fn corrected_similarity(s_obs: f64, s_baseline: f64) -> Result<f64, SimilarityError> {
    let unit = 0.0..=1.0;
    if !unit.contains(&s_obs) || !unit.contains(&s_baseline) {
        return Err(SimilarityError::OutOfRange { s_obs, s_baseline });
    }

    if (1.0 - s_baseline).abs() < EPSILON {
        return Ok(if (1.0 - s_obs).abs() < EPSILON { 1.0 } else { 0.0 });
    }
    if s_baseline > PREDICTABLE_ERROR_THRESHOLD && s_obs < s_baseline {
        return Ok(0.0);
    }

    Ok(((s_obs - s_baseline) / (1.0 - s_baseline)).clamp(0.0, 1.0))
}

/// Mean pair weight over an alignment.
///
/// A gap is looked up as `[DEL]` (absent from text 2) or `[INS]` (absent
/// from text 1). Pairs with a glyph the table does not know score 1 when the
/// two sides are equal and 0 otherwise.
pub fn weighted_similarity(alignment: &[AlignmentPair], table: &WeightTable) -> f64 {
    if alignment.is_empty() {
        return 0.0;
    }

    let total: f64 = alignment
        .iter()
        .map(|pair| {
            let fallback = if pair.char1 == pair.char2 { 1.0 } else { 0.0 };
            let weight = match (pair.char1, pair.char2) {
                (Some(x), Some(y)) => table.weight_chars(x, y),
                (Some(x), None) => {
                    let mut buf = [0u8; 4];
                    table.weight(x.encode_utf8(&mut buf), DELETED_GLYPH)
                }
                (None, Some(y)) => {
                    let mut buf = [0u8; 4];
                    table.weight(INSERTED_GLYPH, y.encode_utf8(&mut buf))
                }
                (None, None) => None,
            };
            weight.unwrap_or(fallback)
        })
        .sum();

    total / alignment.len() as f64
}

/// Character error rate in percent; undefined for an empty reference.
pub fn character_error_rate(distance: usize, len1: usize) -> Option<f64> {
    (len1 > 0).then(|| distance as f64 / len1 as f64 * 100.0)
}

/// Edit distance over the longer length, in percent.
pub fn normalized_edit_distance(distance: usize, len1: usize, len2: usize) -> f64 {
    match len1.max(len2) {
        0 => 0.0,
        max => distance as f64 / max as f64 * 100.0,
    }
}

/// `(S + D + I) / N` in percent, 0 for an empty reference.
pub fn word_error_rate(
    substitutions: usize,
    deletions: usize,
    insertions: usize,
    reference_words: usize,
) -> f64 {
    if reference_words == 0 {
        return 0.0;
    }
    (substitutions + deletions + insertions) as f64 / reference_words as f64 * 100.0
}

#[inline]
fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Compare S_corr against S_obs at three decimals. Only meaningful for a
/// baseline strictly inside (0, 1).
pub fn bias_flag(s_obs: f64, s_baseline: f64, s_corr: f64) -> Option<BiasFlag> {
    if s_baseline <= 0.0 || s_baseline >= 1.0 {
        return None;
    }
    let (obs, corr) = (round3(s_obs), round3(s_corr));
    Some(if corr < obs {
        BiasFlag::Inflated
    } else if corr > obs {
        BiasFlag::Deflated
    } else {
        BiasFlag::Neutral
    })
}
