//! Vector similarity primitives.

use recall_core::{Error, Result};

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean length.
pub fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Scale `v` to unit length in place. A zero vector is left unchanged.
pub fn normalize(v: &mut [f64]) {
    let norm = magnitude(v);
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Cosine similarity in [-1, 1].
///
/// Empty or differently sized vectors are an error: they come from
/// different embedders, or from an item whose embedding was never computed,
/// and must not be compared at all. A zero-magnitude vector scores 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::Search("cannot compare an empty vector".to_string()));
    }
    if a.len() != b.len() {
        return Err(Error::Search(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let denom = magnitude(a) * magnitude(b);
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok((dot(a, b) / denom).clamp(-1.0, 1.0))
}
