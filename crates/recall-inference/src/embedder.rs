//! Embedding facade used by the retrieval orchestrator.
//!
//! Wraps either the offline [`HashEmbedder`] or an external
//! [`EmbeddingBackend`] behind one infallible `embed` call. External
//! failures produce the empty "no embedding" sentinel; they never fall
//! back to the hash embedder, since mixing the two in one store would make
//! stored vectors incomparable.

use std::sync::Arc;
use std::time::Instant;

use recall_core::{EmbeddingBackend, Error, Result, Vector};
use tracing::{debug, warn};

use crate::cache::EmbeddingCache;
use crate::hash_embedder::HashEmbedder;

#[derive(Clone)]
enum Backend {
    Hash(HashEmbedder),
    External(Arc<dyn EmbeddingBackend>),
}

/// Text to unit-vector embedding with a fixed output dimension.
#[derive(Clone)]
pub struct Embedder {
    backend: Backend,
    cache: Option<EmbeddingCache>,
}

impl Default for Embedder {
    fn default() -> Self {
        Self::hash()
    }
}

impl Embedder {
    /// Offline deterministic embedder (384 dimensions).
    pub fn hash() -> Self {
        Self::from_hash(HashEmbedder::new())
    }

    pub fn from_hash(embedder: HashEmbedder) -> Self {
        Self {
            backend: Backend::Hash(embedder),
            cache: None,
        }
    }

    /// Delegate to an external embedding service.
    pub fn external(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend: Backend::External(backend),
            cache: None,
        }
    }

    /// Use the external backend when configured, the hash embedder otherwise.
    pub fn from_optional(backend: Option<Arc<dyn EmbeddingBackend>>) -> Self {
        match backend {
            Some(backend) => Self::external(backend),
            None => Self::hash(),
        }
    }

    /// Attach a shared LRU cache.
    pub fn with_cache(mut self, cache: Option<EmbeddingCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Output dimension of every non-empty vector this embedder returns.
    pub fn dimension(&self) -> usize {
        match &self.backend {
            Backend::Hash(h) => h.dimension(),
            Backend::External(b) => b.dimension(),
        }
    }

    pub fn model_name(&self) -> &str {
        match &self.backend {
            Backend::Hash(h) => h.model_name(),
            Backend::External(b) => b.model_name(),
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self.backend, Backend::External(_))
    }

    /// Embed `text`, returning the empty vector when no embedding can be
    /// produced. Failures are logged.
    pub async fn embed(&self, text: &str) -> Vector {
        match self.try_embed(text).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "embedder",
                    model = self.model_name(),
                    error = %e,
                    "Embedding unavailable, continuing without vector"
                );
                Vec::new()
            }
        }
    }

    /// Embed `text`, surfacing external failures as [`Error::Embedding`].
    ///
    /// Blank text is not an error; it yields the empty vector.
    pub async fn try_embed(&self, text: &str) -> Result<Vector> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(text).await {
                debug!(dimension = hit.len(), "Embedding cache hit");
                return Ok(hit);
            }
        }

        let start = Instant::now();
        let vector = match &self.backend {
            Backend::Hash(h) => h.embed(text),
            Backend::External(backend) => {
                if text.trim().is_empty() {
                    return Ok(Vec::new());
                }
                external_embed(backend.as_ref(), text).await?
            }
        };

        debug!(
            subsystem = "inference",
            component = "embedder",
            op = "embed",
            model = self.model_name(),
            dimension = vector.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding computed"
        );

        if let Some(cache) = &self.cache {
            cache.put(text, &vector).await;
        }
        Ok(vector)
    }
}

async fn external_embed(backend: &dyn EmbeddingBackend, text: &str) -> Result<Vector> {
    let mut vectors = backend.embed_texts(&[text.to_string()]).await?;
    if vectors.len() != 1 {
        return Err(Error::Embedding(format!(
            "expected 1 embedding, backend returned {}",
            vectors.len()
        )));
    }
    let mut vector = vectors.remove(0);
    if vector.len() != backend.dimension() {
        return Err(Error::Embedding(format!(
            "backend {} returned {} dimensions, expected {}",
            backend.model_name(),
            vector.len(),
            backend.dimension()
        )));
    }

    let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    Ok(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedBackend {
        output: Option<Vec<Vector>>,
        dimension: usize,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(output: Option<Vec<Vector>>, dimension: usize) -> Self {
            Self {
                output,
                dimension,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for FixedBackend {
        async fn embed_texts(&self, _texts: &[String]) -> Result<Vec<Vector>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.output
                .clone()
                .ok_or_else(|| Error::Embedding("service down".to_string()))
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_hash_default() {
        let embedder = Embedder::default();
        assert!(!embedder.is_external());
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embedder.embed("hello world").await.len(), 384);
    }

    #[tokio::test]
    async fn test_external_vectors_are_normalized() {
        let backend = Arc::new(FixedBackend::new(Some(vec![vec![3.0, 4.0]]), 2));
        let embedder = Embedder::external(backend);
        let v = embedder.embed("anything").await;
        assert!((v[0] - 0.6).abs() < 1e-12);
        assert!((v[1] - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_external_failure_yields_empty_sentinel() {
        let embedder = Embedder::external(Arc::new(FixedBackend::new(None, 2)));
        assert!(embedder.embed("anything").await.is_empty());
        assert!(matches!(
            embedder.try_embed("anything").await,
            Err(Error::Embedding(_))
        ));
    }

    #[tokio::test]
    async fn test_external_wrong_dimension_rejected() {
        let backend = Arc::new(FixedBackend::new(Some(vec![vec![1.0, 0.0, 0.0]]), 2));
        let embedder = Embedder::external(backend);
        assert!(embedder.embed("anything").await.is_empty());
    }

    #[tokio::test]
    async fn test_external_blank_text_skips_backend() {
        let backend = Arc::new(FixedBackend::new(Some(vec![vec![1.0, 0.0]]), 2));
        let embedder = Embedder::external(backend.clone());
        assert!(embedder.embed("   ").await.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cache_avoids_repeat_backend_calls() {
        let backend = Arc::new(FixedBackend::new(Some(vec![vec![1.0, 0.0]]), 2));
        let embedder = Embedder::external(backend.clone()).with_cache(EmbeddingCache::new(8));

        let first = embedder.embed("same text").await;
        let second = embedder.embed("same text").await;
        assert_eq!(first, second);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let backend = Arc::new(FixedBackend::new(None, 2));
        let embedder = Embedder::external(backend.clone()).with_cache(EmbeddingCache::new(8));

        embedder.embed("retry me").await;
        embedder.embed("retry me").await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_from_optional() {
        assert!(!Embedder::from_optional(None).is_external());
        let backend: Arc<dyn EmbeddingBackend> = Arc::new(FixedBackend::new(None, 2));
        let embedder = Embedder::from_optional(Some(backend));
        assert!(embedder.is_external());
        assert_eq!(embedder.dimension(), 2);
        assert_eq!(embedder.model_name(), "fixed");
    }
}
