//! Glyphdiff Text Comparison Library
//!
//! Compares OCR transcriptions and manuscript witnesses at word or
//! character granularity. Texts are normalized for historical variant
//! forms, diffed into a typed edit script, and scored. Given a confusion
//! matrix of typical misreadings, character comparisons are also corrected
//! for agreement expected by chance.
//!
//! # Example
//!
//! ```
//! use glyphdiff::prelude::*;
//!
//! let params = ComparisonParams::default();
//! let result = compare_texts("cat", "cot", &params, None, false);
//!
//! assert_eq!(result.report.distance, 1);
//! assert_eq!(result.operations.len(), 3);
//! ```
//!
//! # Bias-aware Example
//!
//! ```no_run
//! use glyphdiff::prelude::*;
//! use std::path::Path;
//!
//! let matrix = load_confusion_matrix(Path::new("confusion.json")).unwrap();
//! let params = ComparisonParams::default();
//!
//! let result = compare_texts("ground truth", "gr0und trnth", &params, Some(&matrix), false);
//! println!("S_obs {:.3}  S_corr {:?}", result.report.s_obs, result.report.s_corr);
//! ```

pub mod align;
pub mod compare;
pub mod confusion;
pub mod diff;
pub mod lexical;
pub mod models;
pub mod normalize;
pub mod output;
pub mod refine;
pub mod similarity;
pub mod tokenize;
pub mod variant;
pub mod weights;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::align::{character_alignment, summarize_alignment, AlignmentSummary};
    pub use crate::compare::{case_changes, compare_batch, compare_texts, compare_texts_cached};
    pub use crate::confusion::{
        build_confusion_matrix, glyph_error_rates, glyph_frequencies, glyph_reliabilities,
        load_confusion_matrix, overall_baseline_agreement, per_glyph_baseline_agreement,
        read_confusion_matrix, save_confusion_matrix, to_probability_matrix,
        write_confusion_matrix, ConfusionError, ConfusionMatrix, GlyphFrequencies,
        ProbabilityMatrix, DELETED_GLYPH, INSERTED_GLYPH,
    };
    pub use crate::diff::{diff_chars, diff_main, diff_tokens, Chunk, DiffError, DiffOp};
    pub use crate::lexical::{
        capitalized_word_changes, character_counts, cosine_similarity, jaccard_similarity,
        type_token_ratio, vocabulary_overlap, word_frequencies, word_length_distribution,
        word_metrics,
    };
    pub use crate::models::{
        AlignmentPair, BiasFlag, CapitalizedWordChanges, CaseChanges, CategoryTotals,
        CharacterStats, ComparisonParams, ComparisonResult, DiffSettings, EditOperation,
        GlyphErrorRate, Granularity, NormalizationOptions, SimilarityReport, VariantAnalysis,
        WordMetrics,
    };
    pub use crate::normalize::{all_variant_forms, normalize};
    pub use crate::output::{
        format_operation, print_operations, print_summary, write_json, write_json_batch,
        write_json_file, write_operations_csv, write_operations_csv_file, OutputError,
    };
    pub use crate::refine::{edit_script, edit_script_normalized, refine};
    pub use crate::similarity::{
        character_distance, character_error_rate, corrected_similarity,
        normalized_edit_distance, observed_similarity, token_distance, weighted_similarity,
        word_error_rate, SimilarityError,
    };
    pub use crate::tokenize::tokenize;
    pub use crate::variant::{analyze_variants, tally_variant_forms};
    pub use crate::weights::{weight_table, weight_table_with_progress, WeightTable, WeightTableCache};
}

// Re-export commonly used types at the crate root
pub use models::{ComparisonParams, ComparisonResult, EditOperation, Granularity, NormalizationOptions};
