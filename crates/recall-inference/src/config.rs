//! Inference configuration.
//!
//! Configuration can be loaded from:
//! - a TOML file (`RECALL_CONFIG`, or `./recall.toml`) with an `[inference]` table
//! - environment variables (`GROQ_API_KEY`, `RECALL_*`)
//!
//! # Example
//!
//! ```rust,no_run
//! use recall_inference::config::InferenceConfig;
//!
//! // Load from the config file if present, otherwise from the environment
//! let config = InferenceConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = InferenceConfig::from_file(std::path::Path::new("recall.toml")).expect("Failed to load");
//!
//! // Or from environment variables
//! let config = InferenceConfig::from_env();
//! ```
//!
//! A minimal file:
//!
//! ```toml
//! [inference]
//! timeout_secs = 60
//!
//! [inference.generation]
//! base_url = "https://api.groq.com/openai/v1"
//! api_key = "${GROQ_API_KEY}"
//! model = "llama-3.3-70b-versatile"
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use recall_core::defaults::{GEN_API_KEY_ENV, GEN_BASE_URL, GEN_MODEL, INFERENCE_HTTP_TIMEOUT_SECS};
use recall_core::{EmbeddingBackend, GenerationBackend};

use crate::openai::{OpenAIBackend, OpenAIConfig, DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "RECALL_CONFIG";

/// Config file looked up in the working directory when `RECALL_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "recall.toml";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Chat-completion endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL for the OpenAI-compatible API.
    #[serde(default = "GenerationConfig::default_base_url")]
    pub base_url: String,
    /// API key; generation is disabled without one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model used for summaries, tags and answers.
    #[serde(default = "GenerationConfig::default_model")]
    pub model: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            api_key: None,
            model: Self::default_model(),
        }
    }
}

impl GenerationConfig {
    fn default_base_url() -> String {
        GEN_BASE_URL.to_string()
    }

    fn default_model() -> String {
        GEN_MODEL.to_string()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_url("generation base_url", &self.base_url)?;
        if self.model.is_empty() {
            return Err(ConfigError::Validation(
                "generation model cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// External embedding endpoint settings. Absent means the hash embedder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "EmbeddingConfig::default_model")]
    pub model: String,
    #[serde(default = "EmbeddingConfig::default_dimension")]
    pub dimension: usize,
}

impl EmbeddingConfig {
    fn default_model() -> String {
        DEFAULT_EMBED_MODEL.to_string()
    }

    fn default_dimension() -> usize {
        DEFAULT_DIMENSION
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_url("embedding base_url", &self.base_url)?;
        if self.model.is_empty() {
            return Err(ConfigError::Validation(
                "embedding model cannot be empty".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(ConfigError::Validation(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Main inference configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceConfig {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingConfig>,
    /// HTTP request timeout for both endpoints.
    #[serde(default = "InferenceConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            embedding: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl InferenceConfig {
    fn default_timeout_secs() -> u64 {
        INFERENCE_HTTP_TIMEOUT_SECS
    }

    /// `RECALL_CONFIG` if set, otherwise `./recall.toml`.
    pub fn default_config_path() -> PathBuf {
        env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!(
                subsystem = "config",
                path = %path.display(),
                "Loading inference config from file"
            );
            Self::from_file(&path)
        } else {
            debug!(
                subsystem = "config",
                path = %path.display(),
                "Config file not found, using environment variables"
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file with an `[inference]` table.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text after `${VAR}` substitution.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            inference: InferenceConfig,
        }

        let content = substitute_env_vars(content);
        let root: TomlRoot = toml::from_str(&content)?;
        let config = root.inference.normalized();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let generation = GenerationConfig {
            base_url: non_empty("RECALL_GENERATION_URL")
                .unwrap_or_else(GenerationConfig::default_base_url),
            api_key: non_empty(GEN_API_KEY_ENV),
            model: non_empty("RECALL_GENERATION_MODEL")
                .unwrap_or_else(GenerationConfig::default_model),
        };

        let embedding = non_empty("RECALL_EMBEDDING_URL").map(|base_url| EmbeddingConfig {
            base_url,
            api_key: non_empty("RECALL_EMBEDDING_API_KEY"),
            model: non_empty("RECALL_EMBEDDING_MODEL")
                .unwrap_or_else(EmbeddingConfig::default_model),
            dimension: non_empty("RECALL_EMBEDDING_DIMENSION")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(EmbeddingConfig::default_dimension),
        });

        let timeout_secs = non_empty("RECALL_INFERENCE_TIMEOUT_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(Self::default_timeout_secs);

        Self {
            generation,
            embedding,
            timeout_secs,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.generation.validate()?;
        if let Some(embedding) = &self.embedding {
            embedding.validate()?;
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a generation backend will be built.
    pub fn generation_enabled(&self) -> bool {
        self.generation.api_key.is_some()
    }

    /// Generation backend, or `None` when no API key is configured.
    pub fn build_generation_backend(
        &self,
    ) -> recall_core::Result<Option<Arc<dyn GenerationBackend>>> {
        if !self.generation_enabled() {
            info!(
                subsystem = "config",
                "No generation API key configured; AI features disabled"
            );
            return Ok(None);
        }
        let backend: Arc<dyn GenerationBackend> = Arc::new(OpenAIBackend::new(OpenAIConfig {
            base_url: self.generation.base_url.clone(),
            api_key: self.generation.api_key.clone(),
            gen_model: self.generation.model.clone(),
            timeout_seconds: self.timeout_secs,
            ..Default::default()
        })?);
        Ok(Some(backend))
    }

    /// External embedding backend, or `None` to use the hash embedder.
    pub fn build_embedding_backend(
        &self,
    ) -> recall_core::Result<Option<Arc<dyn EmbeddingBackend>>> {
        let Some(embedding) = &self.embedding else {
            return Ok(None);
        };
        let backend: Arc<dyn EmbeddingBackend> = Arc::new(OpenAIBackend::new(OpenAIConfig {
            base_url: embedding.base_url.clone(),
            api_key: embedding.api_key.clone(),
            embed_model: embedding.model.clone(),
            embed_dimension: embedding.dimension,
            timeout_seconds: self.timeout_secs,
            ..Default::default()
        })?);
        Ok(Some(backend))
    }

    /// Blank API keys (e.g. from an unset `${VAR}`) count as absent.
    fn normalized(mut self) -> Self {
        fn drop_blank(key: &mut Option<String>) {
            if key.as_deref().is_some_and(|k| k.trim().is_empty()) {
                *key = None;
            }
        }
        drop_blank(&mut self.generation.api_key);
        if let Some(embedding) = self.embedding.as_mut() {
            drop_blank(&mut embedding.api_key);
        }
        self
    }
}

/// Replace `${VAR}` with the variable's value, or an empty string when unset.
pub fn substitute_env_vars(content: &str) -> String {
    let Ok(re) = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}") else {
        return content.to_string();
    };
    re.replace_all(content, |caps: &regex::Captures<'_>| {
        env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

fn validate_url(field: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://, got: {url}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = InferenceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, InferenceConfig::default());
        assert!(!config.generation_enabled());
        assert!(config.embedding.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_enables_generation_and_embedding() {
        let config = InferenceConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("RECALL_GENERATION_MODEL", "llama-test"),
            ("RECALL_EMBEDDING_URL", "http://localhost:8080/v1"),
            ("RECALL_EMBEDDING_DIMENSION", "768"),
            ("RECALL_INFERENCE_TIMEOUT_SECS", "15"),
        ]));

        assert!(config.generation_enabled());
        assert_eq!(config.generation.model, "llama-test");
        assert_eq!(config.generation.base_url, GEN_BASE_URL);
        let embedding = config.embedding.as_ref().unwrap();
        assert_eq!(embedding.dimension, 768);
        assert_eq!(embedding.model, DEFAULT_EMBED_MODEL);
        assert_eq!(config.timeout_secs, 15);
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = InferenceConfig::from_lookup(lookup(&[("GROQ_API_KEY", "  ")]));
        assert!(!config.generation_enabled());
    }

    #[test]
    fn test_unparseable_numbers_fall_back_to_defaults() {
        let config = InferenceConfig::from_lookup(lookup(&[
            ("RECALL_EMBEDDING_URL", "http://localhost:8080/v1"),
            ("RECALL_EMBEDDING_DIMENSION", "lots"),
            ("RECALL_INFERENCE_TIMEOUT_SECS", "-1"),
        ]));
        assert_eq!(config.embedding.unwrap().dimension, DEFAULT_DIMENSION);
        assert_eq!(config.timeout_secs, INFERENCE_HTTP_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_toml_str() {
        let config = InferenceConfig::from_toml_str(
            r#"
            [inference]
            timeout_secs = 20

            [inference.generation]
            api_key = "literal-key"
            model = "mixtral"

            [inference.embedding]
            base_url = "http://localhost:11434/v1"
            model = "nomic-embed-text"
            dimension = 768
            "#,
        )
        .unwrap();

        assert_eq!(config.timeout_secs, 20);
        assert_eq!(config.generation.base_url, GEN_BASE_URL);
        assert_eq!(config.generation.api_key.as_deref(), Some("literal-key"));
        assert_eq!(config.generation.model, "mixtral");
        assert_eq!(config.embedding.unwrap().model, "nomic-embed-text");
    }

    #[test]
    fn test_unset_substitution_disables_generation() {
        let config = InferenceConfig::from_toml_str(
            r#"
            [inference.generation]
            api_key = "${RECALL_TEST_SURELY_UNSET_VARIABLE}"
            "#,
        )
        .unwrap();
        assert!(config.generation.api_key.is_none());
    }

    #[test]
    fn test_substitute_leaves_plain_text_alone() {
        assert_eq!(substitute_env_vars("model = \"x\""), "model = \"x\"");
        assert_eq!(
            substitute_env_vars("key = \"${RECALL_TEST_SURELY_UNSET_VARIABLE}\""),
            "key = \"\""
        );
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = InferenceConfig::from_toml_str("").unwrap();
        assert_eq!(config, InferenceConfig::default());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = InferenceConfig::default();
        config.generation.base_url = "ftp://nope".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));

        let mut config = InferenceConfig::default();
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = InferenceConfig::default();
        config.embedding = Some(EmbeddingConfig {
            base_url: "http://localhost/v1".to_string(),
            api_key: None,
            model: "m".to_string(),
            dimension: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = InferenceConfig::from_toml_str("[inference\n").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_builders_follow_configuration() {
        let config = InferenceConfig::default();
        assert!(config.build_generation_backend().unwrap().is_none());
        assert!(config.build_embedding_backend().unwrap().is_none());

        let config = InferenceConfig::from_lookup(lookup(&[
            ("GROQ_API_KEY", "gsk-test"),
            ("RECALL_EMBEDDING_URL", "http://localhost:8080/v1"),
            ("RECALL_EMBEDDING_DIMENSION", "64"),
        ]));
        let generation = config.build_generation_backend().unwrap().unwrap();
        assert_eq!(generation.model_name(), GEN_MODEL);
        let embedding = config.build_embedding_backend().unwrap().unwrap();
        assert_eq!(embedding.dimension(), 64);
    }
}
