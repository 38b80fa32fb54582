//! Process-wide LRU cache of computed embeddings.
//!
//! Keyed by the exact input text. The lock is only held for the lookup or
//! insert itself, never across the embedding call.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use recall_core::Vector;
use tokio::sync::Mutex;

/// Shared embedding cache. Cloning shares the underlying table.
#[derive(Clone)]
pub struct EmbeddingCache {
    cache: Arc<Mutex<LruCache<String, Vector>>>,
}

impl EmbeddingCache {
    /// Create a cache holding up to `capacity` vectors.
    ///
    /// Returns `None` for a zero capacity (caching disabled).
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            cache: Arc::new(Mutex::new(LruCache::new(capacity))),
        })
    }

    pub async fn get(&self, text: &str) -> Option<Vector> {
        self.cache.lock().await.get(text).cloned()
    }

    /// Store a vector. Empty vectors are failures, not results, and are
    /// never cached.
    pub async fn put(&self, text: &str, vector: &Vector) {
        if vector.is_empty() {
            return;
        }
        self.cache.lock().await.put(text.to_string(), vector.clone());
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }

    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }
}
