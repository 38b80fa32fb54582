//! OpenAI-compatible inference backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use recall_core::defaults::{GEN_BASE_URL, GEN_MODEL, INFERENCE_HTTP_TIMEOUT_SECS};
use recall_core::{EmbeddingBackend, Error, GenerationBackend, GenerationOptions, Result, Vector};

use super::error::{to_recall_error, OpenAIErrorCode};
use super::types::*;

/// Default embedding model when the endpoint also serves embeddings.
pub const DEFAULT_EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding dimension for text-embedding-3-small.
pub const DEFAULT_DIMENSION: usize = 1536;

/// Generation calls slower than this are logged as slow.
const SLOW_GENERATION_MS: u64 = 10_000;

/// Configuration for an OpenAI-compatible backend.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for generation.
    pub gen_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: GEN_BASE_URL.to_string(),
            api_key: None,
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            gen_model: GEN_MODEL.to_string(),
            embed_dimension: DEFAULT_DIMENSION,
            timeout_seconds: INFERENCE_HTTP_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible inference backend (Groq, OpenAI, vLLM, Ollama /v1).
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            base_url = %config.base_url,
            gen_model = %config.gen_model,
            "Initializing OpenAI-compatible backend"
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        req.header("Content-Type", "application/json")
    }

    async fn error_from_response(response: reqwest::Response) -> Error {
        let status = response.status();
        let body: OpenAIErrorResponse = response
            .json()
            .await
            .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
        let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
        warn!(
            subsystem = "inference",
            component = "openai",
            status = status.as_u16(),
            retryable = code.is_retryable(),
            error = %body.error.message,
            "Upstream API returned an error"
        );
        to_recall_error(code, &format!("{}: {}", status, body.error.message))
    }

    fn map_send_error(e: reqwest::Error, timeout_seconds: u64, operation: &str) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                operation: operation.to_string(),
                duration_ms: timeout_seconds * 1000,
            }
        } else {
            Error::Request(format!("Request failed: {}", e))
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "openai", op = "embed_texts", model = %self.config.embed_model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = EmbeddingRequest {
            model: self.config.embed_model.clone(),
            input: texts.to_vec(),
            encoding_format: Some("float".to_string()),
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Embedding(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let err = Self::error_from_response(response).await;
            return Err(Error::Embedding(err.to_string()));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        // Sort by index to ensure correct ordering
        let mut data = result.data;
        data.sort_by_key(|d| d.index);
        let vectors: Vec<Vector> = data.into_iter().map(|d| d.embedding).collect();

        debug!(
            result_count = vectors.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedding complete"
        );
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_options(system, prompt, GenerationOptions::default())
            .await
    }

    #[instrument(skip(self, system, prompt, options), fields(subsystem = "inference", component = "openai", op = "generate", model = %self.config.gen_model, prompt_len = prompt.len()))]
    async fn generate_with_options(
        &self,
        system: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String> {
        let start = Instant::now();

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: self.config.gen_model.clone(),
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, self.config.timeout_seconds, "chat completion"))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| Error::Inference("Response contained no message content".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > SLOW_GENERATION_MS {
            warn!(
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                slow = true,
                "Slow generation operation"
            );
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}
