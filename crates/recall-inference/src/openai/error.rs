//! Mapping of OpenAI-compatible API failures onto recall errors.

use recall_core::Error;

/// Upstream error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Provider-side quota or rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Convert an upstream failure to a recall [`Error`].
///
/// Provider quota errors stay `Inference`: they are generation failures,
/// not denials by this process's own rate governor.
pub fn to_recall_error(code: OpenAIErrorCode, message: &str) -> Error {
    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::RateLimitExceeded => {
            Error::Inference(format!("Provider rate limit exceeded: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::ContextLengthExceeded => {
            Error::Inference(format!("Context too long: {}", message))
        }
        OpenAIErrorCode::ServerError => Error::Inference(format!("Server error: {}", message)),
        OpenAIErrorCode::Unknown => Error::Inference(message.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_from_status() {
        assert_eq!(
            OpenAIErrorCode::from_response(401, "invalid_api_key"),
            OpenAIErrorCode::AuthenticationError
        );
        assert_eq!(
            OpenAIErrorCode::from_response(429, "rate_limit_exceeded"),
            OpenAIErrorCode::RateLimitExceeded
        );
        assert_eq!(
            OpenAIErrorCode::from_response(404, "model_not_found"),
            OpenAIErrorCode::ModelNotFound
        );
        assert_eq!(
            OpenAIErrorCode::from_response(400, "context_length_exceeded"),
            OpenAIErrorCode::ContextLengthExceeded
        );
        assert_eq!(
            OpenAIErrorCode::from_response(503, "service_unavailable"),
            OpenAIErrorCode::ServerError
        );
        assert_eq!(
            OpenAIErrorCode::from_response(418, "im_a_teapot"),
            OpenAIErrorCode::Unknown
        );
    }

    #[test]
    fn test_retryable() {
        assert!(OpenAIErrorCode::RateLimitExceeded.is_retryable());
        assert!(OpenAIErrorCode::ServerError.is_retryable());
        assert!(!OpenAIErrorCode::AuthenticationError.is_retryable());
        assert!(!OpenAIErrorCode::ModelNotFound.is_retryable());
    }

    #[test]
    fn test_provider_rate_limit_is_not_governor_denial() {
        let err = to_recall_error(OpenAIErrorCode::RateLimitExceeded, "slow down");
        assert!(!err.is_rate_limited());
        assert!(matches!(err, Error::Inference(_)));
    }

    #[test]
    fn test_auth_failure_is_config_error() {
        let err = to_recall_error(OpenAIErrorCode::AuthenticationError, "Invalid key");
        assert!(matches!(err, Error::Config(ref m) if m.contains("Authentication failed")));
    }
}
