//! Deterministic, dependency-free text embedding.
//!
//! Approximates semantic similarity from two lexical signals so retrieval
//! works offline and in tests:
//!
//! - a word signal: for each of the first 100 whitespace tokens, the sum of
//!   its character codes feeds `sin(hash * (i + 1) + word_index * 0.1)`,
//!   averaged over the token count;
//! - a trigram signal: for every overlapping 3-unit window of the first 500
//!   code units, the sum of the units feeds `cos(hash * (i + 1))`, averaged
//!   over the slice length.
//!
//! Character codes, windows and slice lengths are all counted in UTF-16
//! code units, so text outside the Basic Multilingual Plane (emoji) hashes
//! the same way stored embeddings were produced.
//!
//! Each dimension `i` is then scaled by `1 + 0.1 * sin(i / N * π)` and the
//! vector normalized to unit length. Other systems reproduce this exact
//! arithmetic, so any change here breaks stored embeddings.

use std::f64::consts::PI;

use async_trait::async_trait;
use recall_core::defaults::{EMBED_DIMENSION, EMBED_HASH_MODEL, EMBED_MAX_CHARS, EMBED_MAX_WORDS};
use recall_core::{EmbeddingBackend, Result, Vector};
use tracing::debug;

/// Hash-based embedder producing unit vectors of a fixed dimension.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self {
            dimension: EMBED_DIMENSION,
        }
    }
}

impl HashEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a non-standard dimension. Vectors of different dimensions are
    /// never comparable.
    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    /// Embed a single text.
    ///
    /// Text that is empty after trimming has no meaningful embedding and
    /// yields the empty vector.
    pub fn embed(&self, text: &str) -> Vector {
        let clean = text.to_lowercase();
        let clean = clean.trim();
        if clean.is_empty() {
            debug!("Empty text, no embedding produced");
            return Vec::new();
        }

        let word_hashes: Vec<f64> = clean
            .split_whitespace()
            .take(EMBED_MAX_WORDS)
            .map(char_code_sum)
            .collect();

        let units: Vec<u16> = clean.encode_utf16().take(EMBED_MAX_CHARS).collect();
        let trigram_hashes: Vec<f64> = units
            .windows(3)
            .map(|w| w.iter().map(|&u| f64::from(u)).sum())
            .collect();

        let word_count = word_hashes.len() as f64;
        let char_count = units.len() as f64;
        let n = self.dimension as f64;

        let mut vector: Vector = (0..self.dimension)
            .map(|i| {
                let scale = (i + 1) as f64;
                let mut value = 0.0;

                for (word_idx, hash) in word_hashes.iter().enumerate() {
                    value += (hash * scale + word_idx as f64 * 0.1).sin() / word_count;
                }
                for hash in &trigram_hashes {
                    value += (hash * scale).cos() / char_count;
                }

                value * (1.0 + (i as f64 / n * PI).sin() * 0.1)
            })
            .collect();

        l2_normalize(&mut vector);
        vector
    }
}

/// Sum of UTF-16 code units.
fn char_code_sum(s: &str) -> f64 {
    s.encode_utf16().map(f64::from).sum()
}

/// Divide by the Euclidean norm; a zero vector stays zero.
fn l2_normalize(v: &mut [f64]) {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

#[async_trait]
impl EmbeddingBackend for HashEmbedder {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        EMBED_HASH_MODEL
    }
}
