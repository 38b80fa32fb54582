//! # recall-service
//!
//! Retrieval-augmented question answering over a knowledge base.
//!
//! This crate provides:
//! - [`KnowledgeService`], the orchestrator for ingestion, regeneration,
//!   question answering and item management
//! - Per-client rate governors ([`FixedWindowGovernor`], [`GcraGovernor`])
//! - [`InMemoryRepository`], a process-lifetime [`KnowledgeRepository`]
//! - [`ServiceConfig`] loaded from environment variables
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use recall_core::{ItemType, NewKnowledgeItem};
//! use recall_inference::{Embedder, Generator};
//! use recall_service::{InMemoryRepository, KnowledgeService};
//!
//! # tokio_test();
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn tokio_test() {
//! let service = KnowledgeService::new(
//!     Arc::new(InMemoryRepository::new(384)),
//!     Embedder::hash(),
//!     Generator::unavailable(),
//! );
//! service
//!     .ingest(NewKnowledgeItem::new(
//!         "Fox",
//!         "The quick brown fox jumps over the lazy dog.",
//!         ItemType::Note,
//!     ))
//!     .await
//!     .unwrap();
//!
//! let answer = service.answer("Tell me about the fox", "127.0.0.1").await.unwrap();
//! assert_eq!(answer.sources[0].title, "Fox");
//! # }
//! ```
//!
//! [`KnowledgeRepository`]: recall_core::KnowledgeRepository

pub mod config;
pub mod memory_store;
pub mod rate_limit;
pub mod service;

pub use config::{ConfigError, RateLimitConfig, RateLimitStrategy, ServiceConfig};
pub use memory_store::InMemoryRepository;
pub use rate_limit::{build_governor, FixedWindowGovernor, GcraGovernor, RateRecord};
pub use service::{effective_client_key, KnowledgeService};
