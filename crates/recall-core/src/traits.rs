//! Core traits for recall abstractions.
//!
//! These traits define the collaborator interfaces the retrieval
//! orchestrator is composed from, enabling pluggable backends and
//! testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// KNOWLEDGE REPOSITORY
// =============================================================================

/// Record store for knowledge items keyed by id.
///
/// Implementations must reject any write whose embedding is neither empty
/// nor exactly the store's configured dimension, and must apply an
/// [`ItemPatch`] as a single write.
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Persist a new item, assigning id and timestamps.
    async fn create(&self, draft: ItemDraft) -> Result<KnowledgeItem>;

    /// Fetch an item by id.
    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeItem>>;

    /// List items with filtering, ordering and pagination.
    async fn list(&self, req: ListItemsRequest) -> Result<ListItemsResponse>;

    /// Apply a partial update. Fails with `ItemNotFound` if absent.
    async fn update(&self, id: Uuid, patch: ItemPatch) -> Result<KnowledgeItem>;

    /// Delete an item. Returns false if it did not exist.
    async fn delete(&self, id: Uuid) -> Result<bool>;

    /// Projection of every item used by similarity search, in insertion order.
    async fn embedded_items(&self) -> Result<Vec<EmbeddedItem>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Sampling parameters for a single generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        }
    }
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate text with system context and explicit sampling parameters.
    ///
    /// Backends that ignore sampling parameters can rely on the default.
    async fn generate_with_options(
        &self,
        system: &str,
        prompt: &str,
        _options: GenerationOptions,
    ) -> Result<String> {
        self.generate_with_system(system, prompt).await
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

// =============================================================================
// RATE GOVERNOR
// =============================================================================

/// Per-client request gate protecting billed generation calls.
///
/// `allow` is side-effecting: an allowed call consumes one unit of the
/// client's allowance.
pub trait RateGovernor: Send + Sync {
    /// Record a request from `client_key` and report whether it may proceed.
    fn allow(&self, client_key: &str) -> bool;

    /// Forget clients whose state no longer affects admission. Returns the
    /// number of records removed.
    fn purge_expired(&self) -> usize {
        0
    }
}

/// Governor that admits everything, used when rate limiting is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateGovernor for Unlimited {
    fn allow(&self, _client_key: &str) -> bool {
        true
    }
}
