//! Structured logging schema and field name constants for recall.
//!
//! All crates use these field names for consistent structured logging,
//! so log aggregation can query by the same field names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Unexpected internal failure, requires operator attention |
//! | WARN  | Recoverable issue, degraded answer or rate-limit denial |
//! | INFO  | Lifecycle events, completed mutations (ingest, regenerate, delete) |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-candidate scoring, discarded tags |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "service", "search", "inference", "governor", "store", "config"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "knowledge_service", "ranker", "openai", "hash_embedder"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "ingest", "answer", "regenerate", "embed_texts", "generate"
pub const OPERATION: &str = "op";

/// Caller identity used by the rate governor.
pub const CLIENT_KEY: &str = "client_key";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Knowledge item UUID being operated on.
pub const ITEM_ID: &str = "item_id";

/// Question text.
pub const QUERY: &str = "query";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a ranking or listing.
pub const RESULT_COUNT: &str = "result_count";

/// Number of candidates considered before ranking.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Number of input texts sent to an embedding model.
pub const INPUT_COUNT: &str = "input_count";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Embedding dimension produced or expected.
pub const DIMENSION: &str = "dimension";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for generation or embedding.
pub const MODEL: &str = "model";

/// HTTP status code from an upstream API.
pub const STATUS: &str = "status";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Whether the operation succeeded.
pub const SUCCESS: &str = "success";

/// Error message (when success = false).
pub const ERROR_MSG: &str = "error";

/// How a degraded answer was produced.
/// Values: "unavailable", "failed", "timed_out"
pub const OUTCOME: &str = "outcome";

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_field_names_are_distinct() {
        let fields = [
            SUBSYSTEM, COMPONENT, OPERATION, CLIENT_KEY, ITEM_ID, QUERY, DURATION_MS,
            RESULT_COUNT, CANDIDATE_COUNT, INPUT_COUNT, PROMPT_LEN, RESPONSE_LEN, DIMENSION,
            MODEL, STATUS, SUCCESS, ERROR_MSG, OUTCOME,
        ];
        let unique: HashSet<_> = fields.iter().collect();
        assert_eq!(unique.len(), fields.len());
        assert!(fields.iter().all(|f| f.chars().all(|c| c.is_ascii_lowercase() || c == '_')));
    }

    #[test]
    fn test_field_names_match_call_site_keys() {
        // tracing macros take identifier keys, so call sites spell these out.
        assert_eq!(SUBSYSTEM, "subsystem");
        assert_eq!(COMPONENT, "component");
        assert_eq!(OPERATION, "op");
        assert_eq!(CLIENT_KEY, "client_key");
        assert_eq!(ITEM_ID, "item_id");
        assert_eq!(DURATION_MS, "duration_ms");
        assert_eq!(RESULT_COUNT, "result_count");
        assert_eq!(CANDIDATE_COUNT, "candidate_count");
        assert_eq!(PROMPT_LEN, "prompt_len");
        assert_eq!(MODEL, "model");
        assert_eq!(ERROR_MSG, "error");
    }
}
