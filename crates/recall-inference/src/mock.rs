//! Mock inference backend for deterministic testing.
//!
//! Implements both [`GenerationBackend`] and [`EmbeddingBackend`], records
//! every call, and can simulate latency and failures.
//!
//! ## Usage
//!
//! ```rust
//! use recall_inference::mock::MockInferenceBackend;
//! use recall_inference::prompts::TAGS_SYSTEM;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_dimension(384)
//!     .with_fixed_response("A short summary.")
//!     .with_system_response(TAGS_SYSTEM, "fox, animals");
//! assert_eq!(backend.generate_call_count(), 0);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use recall_core::{EmbeddingBackend, Error, GenerationBackend, GenerationOptions, Result, Vector};

/// Mock inference backend for testing.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    system_responses: HashMap<String, String>,
    failing_systems: HashSet<String>,
    default_response: String,
    latency_ms: u64,
    failure_rate: f64,
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub system: String,
    pub input: String,
    pub options: GenerationOptions,
    pub timestamp: std::time::Instant,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            system_responses: HashMap::new(),
            failing_systems: HashSet::new(),
            default_response: "Mock response".to_string(),
            latency_ms: 0,
            failure_rate: 0.0,
        }
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the response returned when no system-specific response matches.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Respond with `output` whenever the system prompt equals `system`.
    pub fn with_system_response(
        mut self,
        system: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .system_responses
            .insert(system.into(), output.into());
        self
    }

    /// Fail every generation call whose system prompt equals `system`.
    pub fn with_failing_system(mut self, system: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_systems
            .insert(system.into());
        self
    }

    /// Set simulated latency for all operations.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.log().clear()
    }

    /// Get number of embed calls.
    pub fn embed_call_count(&self) -> usize {
        self.count("embed")
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.count("generate")
    }

    fn count(&self, operation: &str) -> usize {
        self.log().iter().filter(|c| c.operation == operation).count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log_call(&self, operation: &str, system: &str, input: &str, options: GenerationOptions) {
        self.log().push(MockCall {
            operation: operation.to_string(),
            system: system.to_string(),
            input: input.to_string(),
            options,
            timestamp: std::time::Instant::now(),
        });
    }

    fn should_fail(&self) -> bool {
        use rand::Rng;
        if self.config.failure_rate > 0.0 {
            rand::thread_rng().gen::<f64>() < self.config.failure_rate
        } else {
            false
        }
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_options(system, prompt, GenerationOptions::default())
            .await
    }

    async fn generate_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String> {
        self.log_call("generate", system, prompt, options);
        self.simulate_latency().await;

        if self.should_fail() || self.config.failing_systems.contains(system) {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }

        Ok(self
            .config
            .system_responses
            .get(system)
            .unwrap_or(&self.config.default_response)
            .clone())
    }

    fn model_name(&self) -> &str {
        "mock-generation"
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            self.log_call("embed", "", text, GenerationOptions::default());
            self.simulate_latency().await;
            if self.should_fail() {
                return Err(Error::Embedding("Simulated failure for testing".to_string()));
            }
            out.push(MockEmbeddingGenerator::generate(text, self.config.dimension));
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

/// Mock embedding generator with deterministic output.
pub struct MockEmbeddingGenerator;

impl MockEmbeddingGenerator {
    /// Generate a deterministic unit vector from text.
    pub fn generate(text: &str, dimension: usize) -> Vector {
        let mut vec = vec![0.0; dimension];
        if dimension == 0 {
            return vec;
        }

        for (i, c) in text.chars().enumerate() {
            let idx = (c as usize + i) % dimension;
            vec[idx] += 0.1;
        }

        let magnitude = vec.iter().map(|x| x * x).sum::<f64>().sqrt();
        if magnitude > 0.0 {
            vec.iter_mut().for_each(|x| *x /= magnitude);
        }
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_backend_embed() {
        let backend = MockInferenceBackend::new().with_dimension(128);
        let embeddings = backend.embed_texts(&["test".to_string()]).await.unwrap();
        assert_eq!(embeddings[0].len(), 128);
        assert_eq!(backend.embed_call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_backend_system_mapping() {
        let backend = MockInferenceBackend::new()
            .with_fixed_response("default")
            .with_system_response("tags", "a, b");

        assert_eq!(backend.generate_with_system("tags", "x").await.unwrap(), "a, b");
        assert_eq!(backend.generate_with_system("other", "x").await.unwrap(), "default");
        assert_eq!(backend.generate_call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_failing_system() {
        let backend = MockInferenceBackend::new().with_failing_system("answer");
        assert!(backend.generate_with_system("answer", "q").await.is_err());
        assert!(backend.generate_with_system("summary", "q").await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_backend_failure_simulation() {
        let backend = MockInferenceBackend::new().with_failure_rate(1.0);
        assert!(backend.embed_texts(&["test".to_string()]).await.is_err());
        assert!(backend.generate_with_system("s", "p").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_call_log_clear() {
        let backend = MockInferenceBackend::new();
        backend.generate_with_system("s", "p").await.unwrap();
        assert_eq!(backend.get_calls().len(), 1);
        backend.clear_calls();
        assert!(backend.get_calls().is_empty());
    }

    #[test]
    fn test_embedding_generator_deterministic_and_normalized() {
        let e1 = MockEmbeddingGenerator::generate("test", 256);
        let e2 = MockEmbeddingGenerator::generate("test", 256);
        assert_eq!(e1, e2);
        let magnitude = e1.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((magnitude - 1.0).abs() < 1e-9);
    }
}
