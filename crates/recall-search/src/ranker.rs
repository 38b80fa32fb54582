//! Top-k ranking of stored item vectors against a query vector.

use std::cmp::Ordering;

use recall_core::{EmbeddedItem, ScoredItem};
use tracing::{debug, trace};

use crate::similarity::cosine_similarity;

/// Default number of results returned by a ranking.
pub const DEFAULT_TOP_K: usize = recall_core::defaults::RETRIEVAL_TOP_K;

/// Ranks candidate items by similarity to a query vector.
///
/// Implementations must:
/// - exclude candidates whose vector is empty or differs in dimension from
///   the query (never score them as 0),
/// - order by descending score, breaking ties by candidate order,
/// - return at most `k` results.
///
/// The brute-force implementation is exact; an approximate index can
/// implement the same trait.
pub trait SimilarityRanker: Send + Sync {
    fn rank(&self, query: &[f64], candidates: Vec<EmbeddedItem>, k: usize) -> Vec<ScoredItem>;
}

/// Exact O(n·d) cosine ranking over every candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BruteForceRanker;

impl SimilarityRanker for BruteForceRanker {
    fn rank(&self, query: &[f64], candidates: Vec<EmbeddedItem>, k: usize) -> Vec<ScoredItem> {
        let candidate_count = candidates.len();
        let results = rank_by_similarity(
            query,
            candidates.into_iter().map(|mut item| {
                let vector = std::mem::take(&mut item.embedding);
                (vector, item)
            }),
            k,
        )
        .into_iter()
        .map(|(item, score)| ScoredItem { item, score })
        .collect::<Vec<_>>();

        debug!(
            candidate_count,
            result_count = results.len(),
            k,
            "Similarity ranking complete"
        );
        results
    }
}

/// Rank arbitrary payloads by the cosine similarity of their vectors.
///
/// Scoring is independent per candidate; the final sort is stable so tied
/// scores keep their input order.
pub fn rank_by_similarity<P, I>(query: &[f64], candidates: I, k: usize) -> Vec<(P, f64)>
where
    I: IntoIterator<Item = (Vec<f64>, P)>,
{
    if query.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(P, f64)> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(idx, (vector, payload))| match cosine_similarity(query, &vector) {
            Ok(score) => Some((payload, score)),
            Err(e) => {
                trace!(candidate = idx, error = %e, "Excluding candidate from ranking");
                None
            }
        })
        .collect();

    // Vec::sort_by is stable.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}
