//! Data structures for the glyphdiff comparison pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit at which two texts are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Whitespace-delimited word tokens
    Word,
    /// Individual characters of the normalized text (default)
    #[default]
    Character,
}

/// Character-level transformations applied to both texts before comparison.
///
/// The `fold_*` flags rewrite historical or typographic variant forms into
/// their modern expansions; the `keep_*` flags decide which surface features
/// take part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationOptions {
    pub fold_ligatures: bool,       // æ → ae, ﬁ → fi
    pub fold_logograms: bool,       // & → and, ⁊ → et
    pub fold_archaic_letters: bool, // ſ → s, ꝛ → r
    pub normalize_uv_w: bool,       // uu / vv → w
    pub fold_u_to_v: bool,
    pub fold_j_to_i: bool,
    pub keep_capitalization: bool,
    pub keep_punctuation: bool,
    pub keep_whitespace: bool,
    pub collapse_whitespace: bool,
}

impl Default for NormalizationOptions {
    fn default() -> Self {
        Self {
            fold_ligatures: false,
            fold_logograms: false,
            fold_archaic_letters: false,
            normalize_uv_w: false,
            fold_u_to_v: false,
            fold_j_to_i: false,
            keep_capitalization: true,
            keep_punctuation: true,
            keep_whitespace: false,
            collapse_whitespace: false,
        }
    }
}

/// Tuning for the sequence-diff primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffSettings {
    /// Give up after this many milliseconds (None = no deadline)
    pub timeout_ms: Option<u64>,
    /// Run the semantic cleanup pass on character diffs
    pub semantic_cleanup: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            semantic_cleanup: true,
        }
    }
}

/// Per-comparison configuration, constructed by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonParams {
    pub granularity: Granularity,
    pub options: NormalizationOptions,
    pub diff: DiffSettings,
}

/// One classified unit of difference between the two texts.
///
/// Concatenating the text1 sides (Equal, Deletion, Substitution) in order
/// rebuilds the normalized first text; the text2 sides rebuild the second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EditOperation {
    Equal { text: String },
    Deletion { text: String },
    Insertion { text: String },
    Substitution { text1: String, text2: String },
}

impl EditOperation {
    /// Text contributed by the first witness, if any.
    pub fn text1(&self) -> Option<&str> {
        match self {
            EditOperation::Equal { text } | EditOperation::Deletion { text } => Some(text),
            EditOperation::Substitution { text1, .. } => Some(text1),
            EditOperation::Insertion { .. } => None,
        }
    }

    /// Text contributed by the second witness, if any.
    pub fn text2(&self) -> Option<&str> {
        match self {
            EditOperation::Equal { text } | EditOperation::Insertion { text } => Some(text),
            EditOperation::Substitution { text2, .. } => Some(text2),
            EditOperation::Deletion { .. } => None,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, EditOperation::Equal { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EditOperation::Equal { .. } => "equal",
            EditOperation::Deletion { .. } => "deletion",
            EditOperation::Insertion { .. } => "insertion",
            EditOperation::Substitution { .. } => "substitution",
        }
    }
}

/// A position-aligned character pair; `None` marks the absent side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentPair {
    pub char1: Option<char>,
    pub char2: Option<char>,
}

impl AlignmentPair {
    pub fn new(char1: Option<char>, char2: Option<char>) -> Self {
        Self { char1, char2 }
    }
}

/// Whether chance agreement under the error profile inflates or deflates S_obs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasFlag {
    Inflated,
    Deflated,
    Neutral,
}

/// Similarity scores for one comparison.
///
/// Bias-aware fields are `None` when no confusion matrix was supplied or the
/// comparison ran at word granularity. Rates are percentages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimilarityReport {
    pub length1: usize,
    pub length2: usize,
    pub distance: usize,
    pub s_obs: f64,
    pub s_baseline: Option<f64>,
    pub s_corr: Option<f64>,
    pub s_adj: Option<f64>,
    pub cer: Option<f64>,
    pub ned: Option<f64>,
    pub wer: Option<f64>,
    pub bias_flag: Option<BiasFlag>,
}

/// Change totals per variant category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub ligatures: usize,
    pub logograms: usize,
    pub archaic: usize,
    pub uv_swaps: usize,
    pub ij_swaps: usize,
    pub uvw_changes: usize,
}

/// Tallies of historical variant forms in the raw texts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantAnalysis {
    /// Raw occurrences of each variant form in text 1
    pub text1_tallies: BTreeMap<String, usize>,
    /// Raw occurrences of each variant form in text 2
    pub text2_tallies: BTreeMap<String, usize>,
    /// Changes keyed "from→to"
    pub change_tallies: BTreeMap<String, usize>,
    pub category_totals: CategoryTotals,
}

/// Single-character substitutions that differ only by case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseChanges {
    pub to_lower: usize,
    pub to_upper: usize,
    pub total: usize,
    pub to_lower_details: BTreeMap<String, usize>,
    pub to_upper_details: BTreeMap<String, usize>,
}

/// Word-granularity statistics (percentages where noted).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordMetrics {
    pub words1: usize,
    pub words2: usize,
    pub substitutions: usize,
    pub deletions: usize,
    pub insertions: usize,
    pub jaccard_similarity: f64,  // %
    pub cosine_similarity: f64,   // %
    pub vocabulary_overlap: f64,  // %
    pub type_token_ratio1: f64,   // %
    pub type_token_ratio2: f64,   // %
    pub average_word_length1: f64,
    pub average_word_length2: f64,
    /// Word length → number of words
    pub word_length_distribution1: BTreeMap<usize, usize>,
    pub word_length_distribution2: BTreeMap<usize, usize>,
}

/// Capitalized words present in one text and not matched in the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalizedWordChanges {
    pub removed: usize,
    pub added: usize,
    pub unchanged: usize,
    pub removed_words: BTreeMap<String, usize>,
    pub added_words: BTreeMap<String, usize>,
    pub unchanged_words: BTreeMap<String, usize>,
}

/// Character-granularity extras: raw character inventories and
/// capitalized-word bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub character_counts1: BTreeMap<String, usize>,
    pub character_counts2: BTreeMap<String, usize>,
    pub capitalized_words: CapitalizedWordChanges,
}

/// Estimated misreading rate of one glyph under the error profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlyphErrorRate {
    pub glyph: String,
    pub error_rate: f64,
}

/// Full comparison result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub version: String,
    pub parameters: ComparisonParams,
    pub operations: Vec<EditOperation>,
    pub report: SimilarityReport,
    pub variants: VariantAnalysis,
    pub word_metrics: Option<WordMetrics>,
    pub case_changes: Option<CaseChanges>,
    pub character_stats: Option<CharacterStats>,
    pub glyph_error_rates: Vec<GlyphErrorRate>,
}
