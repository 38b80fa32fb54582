//! # recall-core
//!
//! Core types, traits, and abstractions for the recall knowledge base.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other recall crates depend on: the knowledge item model, the
//! error taxonomy, and the collaborator interfaces (persistence, embedding,
//! generation, rate limiting) the retrieval orchestrator is composed from.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tag, parse_tag_list};
pub use traits::*;
