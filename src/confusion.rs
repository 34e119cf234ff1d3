//! Confusion matrices: counting, loading, and the Bayesian baseline.
//!
//! A confusion matrix records, for each true glyph (row), how often it was
//! transcribed as each observed glyph (column). Row-normalizing the counts
//! gives the error profile `P[true][observed]` used throughout the bias
//! correction.

use crate::diff::{diff_chars, DiffError, DiffOp};
use crate::models::{DiffSettings, GlyphErrorRate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Column for glyphs present in the truth but missing from the transcription.
pub const DELETED_GLYPH: &str = "[DEL]";
/// Row for glyphs present in the transcription but missing from the truth.
pub const INSERTED_GLYPH: &str = "[INS]";

#[derive(Error, Debug)]
pub enum ConfusionError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Matrix has {rows} rows but {glyphs} glyphs")]
    RowCount { rows: usize, glyphs: usize },

    #[error("Matrix row {row} has {len} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("Glyph {0:?} is listed more than once")]
    DuplicateGlyph(String),

    #[error("Diff failed: {0}")]
    Diff(#[from] DiffError),
}

/// Square matrix of transcription counts indexed by glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    glyphs: Vec<String>,
    counts: Vec<Vec<u64>>,
    index: HashMap<String, usize>,
}

impl ConfusionMatrix {
    /// Validate and build. Both lists empty is the empty matrix.
    pub fn new(glyphs: Vec<String>, counts: Vec<Vec<u64>>) -> Result<Self, ConfusionError> {
        if counts.len() != glyphs.len() {
            return Err(ConfusionError::RowCount {
                rows: counts.len(),
                glyphs: glyphs.len(),
            });
        }
        for (row, values) in counts.iter().enumerate() {
            if values.len() != glyphs.len() {
                return Err(ConfusionError::RaggedRow {
                    row,
                    len: values.len(),
                    expected: glyphs.len(),
                });
            }
        }

        let mut index = HashMap::with_capacity(glyphs.len());
        for (i, glyph) in glyphs.iter().enumerate() {
            if index.insert(glyph.clone(), i).is_some() {
                return Err(ConfusionError::DuplicateGlyph(glyph.clone()));
            }
        }

        Ok(Self {
            glyphs,
            counts,
            index,
        })
    }

    pub fn glyphs(&self) -> &[String] {
        &self.glyphs
    }

    pub fn counts(&self) -> &[Vec<u64>] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn index_of(&self, glyph: &str) -> Option<usize> {
        self.index.get(glyph).copied()
    }

    /// Count for `truth` read as `observed`; 0 for unknown glyphs.
    pub fn count(&self, truth: &str, observed: &str) -> u64 {
        match (self.index_of(truth), self.index_of(observed)) {
            (Some(i), Some(j)) => self.counts[i][j],
            _ => 0,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().sum()
    }
}

/// Row-stochastic error profile derived from a confusion matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbabilityMatrix {
    rows: Vec<Vec<f64>>,
}

impl ProbabilityMatrix {
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `P[truth][observed]`, 0 outside the matrix.
    #[inline]
    pub fn get(&self, truth: usize, observed: usize) -> f64 {
        self.rows
            .get(truth)
            .and_then(|row| row.get(observed))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Divide each row by its sum; an all-zero row becomes uniform.
pub fn to_probability_matrix(matrix: &ConfusionMatrix) -> ProbabilityMatrix {
    let rows = matrix
        .counts()
        .iter()
        .map(|row| {
            let sum: u64 = row.iter().sum();
            if sum == 0 {
                vec![1.0 / row.len() as f64; row.len()]
            } else {
                row.iter().map(|&c| c as f64 / sum as f64).collect()
            }
        })
        .collect();
    ProbabilityMatrix { rows }
}

/// Relative frequency of each character over both texts combined.
pub type GlyphFrequencies = BTreeMap<String, f64>;

pub fn glyph_frequencies(text1: &str, text2: &str) -> GlyphFrequencies {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut total = 0usize;
    for c in text1.chars().chain(text2.chars()) {
        *counts.entry(c.to_string()).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return GlyphFrequencies::new();
    }
    counts
        .into_iter()
        .map(|(glyph, n)| (glyph, n as f64 / total as f64))
        .collect()
}

/// Chance that two independent readings of a glyph agree: `Σ_k P[g][k]²`.
pub fn per_glyph_baseline_agreement(
    p: &ProbabilityMatrix,
    glyphs: &[String],
) -> BTreeMap<String, f64> {
    glyphs
        .iter()
        .enumerate()
        .map(|(i, glyph)| {
            let agreement = p
                .rows()
                .get(i)
                .map(|row| row.iter().map(|x| x * x).sum())
                .unwrap_or(0.0);
            (glyph.clone(), agreement)
        })
        .collect()
}

/// Frequency-weighted chance agreement over the texts' characters.
/// Characters absent from the matrix contribute nothing.
pub fn overall_baseline_agreement(
    frequencies: &GlyphFrequencies,
    per_glyph: &BTreeMap<String, f64>,
) -> f64 {
    let mut contributions: Vec<(&str, f64)> = frequencies
        .iter()
        .map(|(glyph, f)| (glyph.as_str(), f * per_glyph.get(glyph).copied().unwrap_or(0.0)))
        .collect();
    let baseline: f64 = contributions.iter().map(|(_, c)| c).sum();

    contributions.sort_by(|a, b| b.1.total_cmp(&a.1));
    debug!(
        "Baseline agreement {:.4}, top contributors: {:?}",
        baseline,
        &contributions[..contributions.len().min(5)]
    );
    baseline
}

/// Probability that each glyph is read correctly: `P[g][g]`.
pub fn glyph_reliabilities(p: &ProbabilityMatrix, glyphs: &[String]) -> BTreeMap<String, f64> {
    glyphs
        .iter()
        .enumerate()
        .map(|(i, glyph)| (glyph.clone(), p.get(i, i)))
        .collect()
}

/// `1 - reliability` per glyph, worst first.
pub fn glyph_error_rates(p: &ProbabilityMatrix, glyphs: &[String]) -> Vec<GlyphErrorRate> {
    let mut rates: Vec<GlyphErrorRate> = glyph_reliabilities(p, glyphs)
        .into_iter()
        .map(|(glyph, reliability)| GlyphErrorRate {
            glyph,
            error_rate: 1.0 - reliability,
        })
        .collect();
    rates.sort_by(|a, b| {
        b.error_rate
            .total_cmp(&a.error_rate)
            .then_with(|| a.glyph.cmp(&b.glyph))
    });
    rates
}

fn glyph_order(a: &str, b: &str) -> std::cmp::Ordering {
    let rank = |g: &str| match g {
        DELETED_GLYPH => 1,
        INSERTED_GLYPH => 2,
        _ => 0,
    };
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

/// Count glyph correspondences between a ground truth and a transcription.
///
/// Equal characters count on the diagonal; a deletion followed by an
/// insertion pairs up position by position, with any surplus going to the
/// `[DEL]` column or `[INS]` row.
pub fn build_confusion_matrix(
    truth: &str,
    transcription: &str,
    settings: &DiffSettings,
) -> Result<ConfusionMatrix, ConfusionError> {
    let strict = DiffSettings {
        semantic_cleanup: true,
        ..*settings
    };
    let chunks = diff_chars(truth, transcription, &strict)?;

    let mut counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    let mut bump = |t: String, o: String| *counts.entry((t, o)).or_insert(0) += 1;

    let mut i = 0;
    while i < chunks.len() {
        let chunk = &chunks[i];
        match chunk.op {
            DiffOp::Equal => {
                for &c in &chunk.items {
                    bump(c.to_string(), c.to_string());
                }
            }
            DiffOp::Delete => match chunks.get(i + 1).filter(|next| next.op == DiffOp::Insert) {
                Some(next) => {
                    let (deleted, inserted) = (&chunk.items, &next.items);
                    for j in 0..deleted.len().max(inserted.len()) {
                        match (deleted.get(j), inserted.get(j)) {
                            (Some(d), Some(n)) => bump(d.to_string(), n.to_string()),
                            (Some(d), None) => bump(d.to_string(), DELETED_GLYPH.to_string()),
                            (None, Some(n)) => bump(INSERTED_GLYPH.to_string(), n.to_string()),
                            (None, None) => {}
                        }
                    }
                    i += 1;
                }
                None => {
                    for &c in &chunk.items {
                        bump(c.to_string(), DELETED_GLYPH.to_string());
                    }
                }
            },
            DiffOp::Insert => {
                for &c in &chunk.items {
                    bump(INSERTED_GLYPH.to_string(), c.to_string());
                }
            }
        }
        i += 1;
    }

    let mut glyphs: Vec<String> = counts
        .keys()
        .flat_map(|(t, o)| [t.clone(), o.clone()])
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    glyphs.sort_by(|a, b| glyph_order(a, b));

    let position: HashMap<&str, usize> = glyphs
        .iter()
        .enumerate()
        .map(|(i, g)| (g.as_str(), i))
        .collect();
    let mut matrix = vec![vec![0u64; glyphs.len()]; glyphs.len()];
    for ((t, o), n) in &counts {
        matrix[position[t.as_str()]][position[o.as_str()]] = *n;
    }

    info!(
        "Built {}x{} confusion matrix from {} correspondences",
        glyphs.len(),
        glyphs.len(),
        counts.values().sum::<u64>()
    );
    ConfusionMatrix::new(glyphs, matrix)
}

/// On-disk form of a confusion matrix.
#[derive(Debug, Serialize, Deserialize)]
struct ConfusionMatrixBundle {
    #[serde(default)]
    comment: String,
    glyphs: Vec<String>,
    matrix: Vec<Vec<u64>>,
}

pub fn read_confusion_matrix<R: Read>(reader: R) -> Result<ConfusionMatrix, ConfusionError> {
    let bundle: ConfusionMatrixBundle = serde_json::from_reader(reader)?;
    ConfusionMatrix::new(bundle.glyphs, bundle.matrix)
}

pub fn load_confusion_matrix(path: &Path) -> Result<ConfusionMatrix, ConfusionError> {
    let file = File::open(path)?;
    let matrix = read_confusion_matrix(BufReader::new(file))?;
    info!(
        "Loaded {}x{} confusion matrix from {}",
        matrix.len(),
        matrix.len(),
        path.display()
    );
    Ok(matrix)
}

pub fn write_confusion_matrix<W: Write>(
    matrix: &ConfusionMatrix,
    comment: &str,
    writer: W,
) -> Result<(), ConfusionError> {
    let bundle = ConfusionMatrixBundle {
        comment: comment.to_string(),
        glyphs: matrix.glyphs().to_vec(),
        matrix: matrix.counts().to_vec(),
    };
    serde_json::to_writer_pretty(writer, &bundle)?;
    Ok(())
}

pub fn save_confusion_matrix(
    matrix: &ConfusionMatrix,
    comment: &str,
    path: &Path,
) -> Result<(), ConfusionError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_confusion_matrix(matrix, comment, &mut writer)?;
    writer.flush()?;
    Ok(())
}
