//! Service configuration.
//!
//! Read from environment variables (after `.env` is loaded by the binary):
//!
//! | Variable | Default |
//! |----------|---------|
//! | `RECALL_TOP_K` | 5 |
//! | `RECALL_CONTEXT_CHARS` | 500 |
//! | `RECALL_GENERATION_TIMEOUT_SECS` | 30 |
//! | `RECALL_EMBED_CACHE_SIZE` | 1024 (0 disables) |
//! | `RATE_LIMIT_ENABLED` | true |
//! | `RATE_LIMIT_REQUESTS` | 15 |
//! | `RATE_LIMIT_PERIOD_SECS` | 60 |
//! | `RATE_LIMIT_STRATEGY` | `fixed` (`fixed` or `gcra`) |

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use recall_core::defaults::{
    CONTEXT_CHAR_BUDGET, EMBED_CACHE_SIZE, GEN_TIMEOUT_SECS, RATE_LIMIT_PERIOD_SECS,
    RATE_LIMIT_REQUESTS, RETRIEVAL_TOP_K,
};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rate-limiting algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitStrategy {
    /// Counter reset at the end of each window
    #[default]
    FixedWindow,
    /// Continuous replenishment (generic cell rate algorithm)
    Gcra,
}

impl FromStr for RateLimitStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fixed" | "fixed_window" | "fixed-window" => Ok(Self::FixedWindow),
            "gcra" => Ok(Self::Gcra),
            _ => Err(ConfigError::InvalidValue {
                name: "RATE_LIMIT_STRATEGY".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for RateLimitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FixedWindow => write!(f, "fixed"),
            Self::Gcra => write!(f, "gcra"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Requests allowed per client per period
    pub requests: u32,
    pub period_secs: u64,
    pub strategy: RateLimitStrategy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests: RATE_LIMIT_REQUESTS,
            period_secs: RATE_LIMIT_PERIOD_SECS,
            strategy: RateLimitStrategy::default(),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.requests == 0 {
            return Err(ConfigError::Validation(
                "RATE_LIMIT_REQUESTS must be greater than zero".to_string(),
            ));
        }
        if self.period_secs == 0 {
            return Err(ConfigError::Validation(
                "RATE_LIMIT_PERIOD_SECS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Orchestrator tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    /// Items forwarded to the generator per question
    pub top_k: usize,
    /// Characters of each item's content included in answer context
    pub context_char_budget: usize,
    /// Deadline for every generation call
    pub generation_timeout: Duration,
    /// LRU embedding cache capacity; zero disables the cache
    pub embedding_cache_size: usize,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            top_k: RETRIEVAL_TOP_K,
            context_char_budget: CONTEXT_CHAR_BUDGET,
            generation_timeout: Duration::from_secs(GEN_TIMEOUT_SECS),
            embedding_cache_size: EMBED_CACHE_SIZE,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Unset or
    /// blank variables take their defaults; unparseable ones are errors.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            top_k: parse_var(&lookup, "RECALL_TOP_K")?.unwrap_or(defaults.top_k),
            context_char_budget: parse_var(&lookup, "RECALL_CONTEXT_CHARS")?
                .unwrap_or(defaults.context_char_budget),
            generation_timeout: parse_var(&lookup, "RECALL_GENERATION_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            embedding_cache_size: parse_var(&lookup, "RECALL_EMBED_CACHE_SIZE")?
                .unwrap_or(defaults.embedding_cache_size),
            rate_limit: RateLimitConfig {
                enabled: parse_bool(&lookup, "RATE_LIMIT_ENABLED")?
                    .unwrap_or(defaults.rate_limit.enabled),
                requests: parse_var(&lookup, "RATE_LIMIT_REQUESTS")?
                    .unwrap_or(defaults.rate_limit.requests),
                period_secs: parse_var(&lookup, "RATE_LIMIT_PERIOD_SECS")?
                    .unwrap_or(defaults.rate_limit.period_secs),
                strategy: parse_var(&lookup, "RATE_LIMIT_STRATEGY")?
                    .unwrap_or(defaults.rate_limit.strategy),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_k == 0 {
            return Err(ConfigError::Validation(
                "RECALL_TOP_K must be greater than zero".to_string(),
            ));
        }
        if self.context_char_budget == 0 {
            return Err(ConfigError::Validation(
                "RECALL_CONTEXT_CHARS must be greater than zero".to_string(),
            ));
        }
        if self.generation_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "RECALL_GENERATION_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }
        self.rate_limit.validate()
    }
}

fn raw_var<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T, F>(lookup: &F, name: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    raw_var(lookup, name)
        .map(|value| {
            value.parse().map_err(|_| ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_bool<F>(lookup: &F, name: &str) -> ConfigResult<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    raw_var(lookup, name)
        .map(|value| match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                name: name.to_string(),
                value,
            }),
        })
        .transpose()
}
