//! Centralized default constants for recall.
//!
//! **This module is the single source of truth** for all shared default values.
//! Every crate references these constants instead of defining its own magic
//! numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section.

// =============================================================================
// EMBEDDING
// =============================================================================

/// Output dimension of the deterministic hash embedder.
pub const EMBED_DIMENSION: usize = 384;

/// Maximum whitespace-delimited tokens contributing to the word signal.
pub const EMBED_MAX_WORDS: usize = 100;

/// Maximum characters contributing to the trigram signal.
pub const EMBED_MAX_CHARS: usize = 500;

/// Model name reported by the hash embedder.
pub const EMBED_HASH_MODEL: &str = "hash-trigram-384";

/// Default number of cached query/content embeddings.
pub const EMBED_CACHE_SIZE: usize = 1024;

// =============================================================================
// GENERATION
// =============================================================================

/// Default OpenAI-compatible endpoint (Groq).
pub const GEN_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default chat completion model.
pub const GEN_MODEL: &str = "llama-3.3-70b-versatile";

/// Environment variable holding the generation API key.
pub const GEN_API_KEY_ENV: &str = "GROQ_API_KEY";

/// Timeout for a single generation call.
pub const GEN_TIMEOUT_SECS: u64 = 30;

/// HTTP client timeout for inference requests.
pub const INFERENCE_HTTP_TIMEOUT_SECS: u64 = 60;

/// Summary prompt sampling temperature.
pub const SUMMARY_TEMPERATURE: f32 = 0.4;

/// Summary response token cap.
pub const SUMMARY_MAX_TOKENS: u32 = 150;

/// Tag prompt sampling temperature.
pub const TAGS_TEMPERATURE: f32 = 0.3;

/// Tag response token cap.
pub const TAGS_MAX_TOKENS: u32 = 50;

/// Characters of content sent to the tag prompt.
pub const TAGS_INPUT_CHARS: usize = 500;

/// Answer prompt sampling temperature.
pub const ANSWER_TEMPERATURE: f32 = 0.2;

/// Answer response token cap.
pub const ANSWER_MAX_TOKENS: u32 = 300;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of ranked items forwarded as answer context.
pub const RETRIEVAL_TOP_K: usize = 5;

/// Per-item content budget (characters) inside the answer context.
pub const CONTEXT_CHAR_BUDGET: usize = 500;

/// Fixed answer when the knowledge base holds no items.
pub const NO_ITEMS_ANSWER: &str = "No knowledge items found in the system.";

/// Fixed answer when no stored item has a comparable embedding.
pub const NO_RELEVANT_ITEMS_ANSWER: &str = "No relevant knowledge items found.";

/// Fixed answer when no generation backend is configured.
pub const AI_UNAVAILABLE_ANSWER: &str = "AI unavailable.";

/// Fixed apology when answer generation fails or times out.
pub const GENERATION_FAILED_ANSWER: &str = "Unable to generate answer.";

// =============================================================================
// VALIDATION
// =============================================================================

/// Minimum title length in characters.
pub const TITLE_MIN_CHARS: usize = 3;

/// Minimum content length in characters.
pub const CONTENT_MIN_CHARS: usize = 10;

/// Minimum question length in characters.
pub const QUESTION_MIN_CHARS: usize = 5;

/// Maximum tags stored per item.
pub const MAX_TAGS: usize = 5;

// =============================================================================
// PAGINATION
// =============================================================================

/// Default page size for item listings.
pub const PAGE_LIMIT: usize = 10;

/// Upper bound on a requested page size.
pub const PAGE_LIMIT_MAX: usize = 100;

// =============================================================================
// RATE LIMITING
// =============================================================================

/// Requests allowed per client per window.
pub const RATE_LIMIT_REQUESTS: u32 = 15;

/// Window length in seconds.
pub const RATE_LIMIT_PERIOD_SECS: u64 = 60;

/// Admissions between sweeps of expired rate records.
pub const RATE_LIMIT_PURGE_EVERY: u64 = 1024;

/// Client key used when the caller identity cannot be determined.
pub const UNKNOWN_CLIENT_KEY: &str = "unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_minimums_are_ordered() {
        assert!(TITLE_MIN_CHARS < CONTENT_MIN_CHARS);
        assert!(QUESTION_MIN_CHARS > 0);
    }

    #[test]
    fn test_page_limits() {
        assert!(PAGE_LIMIT <= PAGE_LIMIT_MAX);
    }

    #[test]
    fn test_context_budget_matches_tag_input() {
        assert_eq!(CONTEXT_CHAR_BUDGET, TAGS_INPUT_CHARS);
        assert!(EMBED_MAX_CHARS >= CONTEXT_CHAR_BUDGET);
    }
}
