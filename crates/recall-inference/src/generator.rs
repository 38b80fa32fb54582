//! Deadline-bounded access to an optional generation backend.
//!
//! Summary and tag generation absorb every failure: an item is always
//! creatable without them. `complete` surfaces failures so the caller can
//! choose its own fallback text.

use std::sync::Arc;
use std::time::{Duration, Instant};

use recall_core::defaults::GEN_TIMEOUT_SECS;
use recall_core::{parse_tag_list, Error, GenerationBackend, Result};
use tracing::{debug, warn};

use crate::prompts::{summary_prompt, tags_prompt, Prompt};

/// AI-derived fields computed from item content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub summary: Option<String>,
    pub tags: Vec<String>,
}

/// Optional generation capability with a per-call deadline.
#[derive(Clone)]
pub struct Generator {
    backend: Option<Arc<dyn GenerationBackend>>,
    timeout: Duration,
}

impl Generator {
    pub fn new(backend: Option<Arc<dyn GenerationBackend>>) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(GEN_TIMEOUT_SECS),
        }
    }

    /// Generator with no backend; every call degrades.
    pub fn unavailable() -> Self {
        Self::new(None)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn model_name(&self) -> Option<&str> {
        self.backend.as_deref().map(|b| b.model_name())
    }

    /// Run one prompt under the default deadline.
    pub async fn complete(&self, prompt: &Prompt) -> Result<String> {
        self.complete_with_timeout(prompt, self.timeout).await
    }

    /// Run one prompt under `timeout`, mapping expiry to [`Error::Timeout`].
    pub async fn complete_with_timeout(&self, prompt: &Prompt, timeout: Duration) -> Result<String> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| Error::Inference("no generation backend configured".to_string()))?;

        let start = Instant::now();
        let call = backend.generate_with_options(prompt.system, &prompt.user, prompt.options);
        let text = match tokio::time::timeout(timeout, call).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::Timeout {
                    operation: format!("generation ({})", backend.model_name()),
                    duration_ms: timeout.as_millis() as u64,
                })
            }
        };

        debug!(
            subsystem = "inference",
            component = "generator",
            model = backend.model_name(),
            prompt_len = prompt.user.len(),
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(text)
    }

    /// Three-sentence summary, or `None` when unavailable, failed or empty.
    pub async fn summarize(&self, content: &str) -> Option<String> {
        if !self.is_available() {
            return None;
        }
        match self.complete(&summary_prompt(content)).await {
            Ok(text) => Some(text.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                warn!(subsystem = "inference", op = "summarize", error = %e, "Summary generation failed");
                None
            }
        }
    }

    /// Up to five lowercase single-word tags; empty on any failure.
    pub async fn suggest_tags(&self, content: &str) -> Vec<String> {
        if !self.is_available() {
            return Vec::new();
        }
        match self.complete(&tags_prompt(content)).await {
            Ok(text) => parse_tag_list(&text),
            Err(e) => {
                warn!(subsystem = "inference", op = "suggest_tags", error = %e, "Tag generation failed");
                Vec::new()
            }
        }
    }

    /// Summary and tags, generated concurrently.
    pub async fn enrich(&self, content: &str) -> Enrichment {
        let (summary, tags) = tokio::join!(self.summarize(content), self.suggest_tags(content));
        Enrichment { summary, tags }
    }
}
