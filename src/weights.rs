//! Pairwise glyph weights from a Bayesian likelihood ratio.
//!
//! For an observed pair `(x, y)` the weight compares how likely the pair is
//! when both readings come from the same true glyph against how likely it is
//! when they come from different ones:
//!
//! ```text
//! same(x,y) = Σ_i π_i P[i][x] P[i][y]
//! diff(x,y) = p(x) p(y) - Σ_k π_k² P[k][x] P[k][y]
//! w(x,y)    = LR / (1 + LR),  LR = same / diff
//! ```
//!
//! with `π` the glyph frequencies of the texts and `p(x) = Σ_i π_i P[i][x]`.

use crate::confusion::{GlyphFrequencies, ProbabilityMatrix};
use indicatif::{ProgressBar, ProgressStyle};
use lru::LruCache;
use rayon::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Symmetric G×G table of weights in [0, 1].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightTable {
    glyphs: Vec<String>,
    index: HashMap<String, usize>,
    weights: Vec<f64>, // row-major, glyphs.len()²
}

impl WeightTable {
    pub fn glyphs(&self) -> &[String] {
        &self.glyphs
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Weight for a glyph pair, `None` if either glyph is unknown.
    pub fn weight(&self, x: &str, y: &str) -> Option<f64> {
        let i = *self.index.get(x)?;
        let j = *self.index.get(y)?;
        Some(self.weights[i * self.glyphs.len() + j])
    }

    #[inline]
    pub fn weight_chars(&self, x: char, y: char) -> Option<f64> {
        let mut bx = [0u8; 4];
        let mut by = [0u8; 4];
        self.weight(x.encode_utf8(&mut bx), y.encode_utf8(&mut by))
    }
}

pub fn weight_table(
    p: &ProbabilityMatrix,
    frequencies: &GlyphFrequencies,
    glyphs: &[String],
) -> WeightTable {
    weight_table_with_progress(p, frequencies, glyphs, false)
}

/// Build the table, one row per rayon task. Only the upper triangle is
/// computed; the lower one is its mirror.
pub fn weight_table_with_progress(
    p: &ProbabilityMatrix,
    frequencies: &GlyphFrequencies,
    glyphs: &[String],
    show_progress: bool,
) -> WeightTable {
    let g = glyphs.len().min(p.len());
    if g == 0 {
        return WeightTable::default();
    }

    let pi: Vec<f64> = glyphs[..g]
        .iter()
        .map(|glyph| frequencies.get(glyph).copied().unwrap_or(0.0))
        .collect();
    let p_obs: Vec<f64> = (0..g)
        .map(|x| (0..g).map(|i| pi[i] * p.get(i, x)).sum())
        .collect();

    let pb = if show_progress {
        let pb = ProgressBar::new(g as u64);
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

    let upper: Vec<Vec<f64>> = (0..g)
        .into_par_iter()
        .map(|x| {
            let row = (x..g).map(|y| pair_weight(p, &pi, &p_obs, x, y)).collect();
            if let Some(ref pb) = pb {
                pb.inc(1);
            }
            row
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let mut weights = vec![0.0; g * g];
    for (x, row) in upper.iter().enumerate() {
        for (offset, &w) in row.iter().enumerate() {
            let y = x + offset;
            weights[x * g + y] = w;
            weights[y * g + x] = w;
        }
    }

    let glyphs = glyphs[..g].to_vec();
    let index = glyphs
        .iter()
        .enumerate()
        .map(|(i, glyph)| (glyph.clone(), i))
        .collect();

    debug!("Built {}x{} weight table", g, g);
    WeightTable {
        glyphs,
        index,
        weights,
    }
}

#[inline]
fn pair_weight(p: &ProbabilityMatrix, pi: &[f64], p_obs: &[f64], x: usize, y: usize) -> f64 {
    let mut same = 0.0;
    let mut overlap = 0.0;
    for (i, &prior) in pi.iter().enumerate() {
        let both = p.get(i, x) * p.get(i, y);
        same += prior * both;
        overlap += prior * prior * both;
    }
    let diff = p_obs[x] * p_obs[y] - overlap;

    if same == 0.0 && diff == 0.0 {
        0.0
    } else if diff <= 0.0 {
        1.0
    } else {
        let lr = same / diff;
        (lr / (1.0 + lr)).clamp(0.0, 1.0)
    }
}

/// Exact inputs of a weight table, compared bit for bit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheInputs {
    glyphs: Vec<String>,
    probabilities: Vec<Vec<u64>>,
    frequencies: Vec<(String, u64)>,
}

impl CacheInputs {
    fn new(p: &ProbabilityMatrix, frequencies: &GlyphFrequencies, glyphs: &[String]) -> Self {
        Self {
            glyphs: glyphs.to_vec(),
            probabilities: p
                .rows()
                .iter()
                .map(|row| row.iter().map(|v| v.to_bits()).collect())
                .collect(),
            frequencies: frequencies
                .iter()
                .map(|(glyph, f)| (glyph.clone(), f.to_bits()))
                .collect(),
        }
    }

    fn key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Memoizes weight tables by the exact bits of their inputs.
///
/// Entries are found by hash and confirmed against the stored inputs, so a
/// hash collision rebuilds instead of returning another input's table.
pub struct WeightTableCache {
    entries: LruCache<u64, (CacheInputs, Arc<WeightTable>)>,
    hits: u64,
    misses: u64,
}

impl WeightTableCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get_or_build(
        &mut self,
        p: &ProbabilityMatrix,
        frequencies: &GlyphFrequencies,
        glyphs: &[String],
        show_progress: bool,
    ) -> Arc<WeightTable> {
        let inputs = CacheInputs::new(p, frequencies, glyphs);
        let key = inputs.key();
        if let Some((stored, table)) = self.entries.get(&key) {
            if *stored == inputs {
                self.hits += 1;
                return Arc::clone(table);
            }
            debug!("Weight table cache collision on key {:#x}", key);
        }

        self.misses += 1;
        let table = Arc::new(weight_table_with_progress(p, frequencies, glyphs, show_progress));
        self.entries.put(key, (inputs, Arc::clone(&table)));
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for WeightTableCache {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(16).unwrap_or(NonZeroUsize::MIN))
    }
}
