//! # recall-inference
//!
//! Embedding and text-generation backends for recall.
//!
//! This crate provides:
//! - A deterministic offline hash embedder (384 dimensions)
//! - An [`Embedder`] facade over the hash embedder or an external service,
//!   with an optional LRU cache
//! - An OpenAI-compatible backend (Groq by default) for generation and
//!   external embeddings
//! - Prompt templates and a deadline-bounded [`Generator`] for summaries,
//!   tags and answers
//! - Configuration from `recall.toml` or environment variables
//!
//! # Feature Flags
//!
//! - `mock`: expose [`mock::MockInferenceBackend`] to other crates' tests
//!
//! # Example
//!
//! ```rust
//! use recall_inference::HashEmbedder;
//!
//! let embedder = HashEmbedder::new();
//! let vector = embedder.embed("The quick brown fox");
//! assert_eq!(vector.len(), 384);
//! ```

pub mod cache;
pub mod config;
pub mod embedder;
pub mod generator;
pub mod hash_embedder;
pub mod openai;
pub mod prompts;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use cache::EmbeddingCache;
pub use config::{ConfigError, EmbeddingConfig, GenerationConfig, InferenceConfig};
pub use embedder::Embedder;
pub use generator::{Enrichment, Generator};
pub use hash_embedder::HashEmbedder;
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use prompts::{answer_prompt, build_context, ContextEntry, Prompt};
