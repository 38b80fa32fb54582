//! # recall-search
//!
//! Semantic ranking for recall.
//!
//! This crate provides:
//! - Cosine similarity over `f64` vectors, with zero-magnitude and
//!   dimension-mismatch guards
//! - The [`SimilarityRanker`] trait and an exact brute-force implementation
//!
//! ## Example
//!
//! ```
//! use recall_search::{BruteForceRanker, SimilarityRanker};
//! use recall_core::EmbeddedItem;
//! use uuid::Uuid;
//!
//! let items = vec![EmbeddedItem {
//!     id: Uuid::nil(),
//!     title: "Fox".into(),
//!     content: "The quick brown fox.".into(),
//!     embedding: vec![1.0, 0.0],
//! }];
//! let ranked = BruteForceRanker.rank(&[1.0, 0.0], items, 5);
//! assert_eq!(ranked[0].item.title, "Fox");
//! ```

pub mod ranker;
pub mod similarity;

pub use ranker::{rank_by_similarity, BruteForceRanker, SimilarityRanker, DEFAULT_TOP_K};
pub use similarity::{cosine_similarity, dot, magnitude, normalize};
