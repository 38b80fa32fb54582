//! Tag normalization for model-generated tag lists.
//!
//! Generators are asked for comma-separated single-word tags but routinely
//! return hashtags, numbered lists, or multi-word phrases. Everything that
//! survives normalization is lowercase, a single word, and unique.

use tracing::trace;

use crate::defaults::MAX_TAGS;

/// Normalize a single tag: trim, strip list/hashtag prefixes, lowercase.
///
/// Returns `None` for empty or multi-word tags.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let mut trimmed = raw.trim().trim_start_matches(['#', '-', '*']).trim_start();

    // "1. tag" / "2) tag"
    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix(['.', ')']) {
            trimmed = rest;
        }
    }
    let trimmed = trimmed.trim().trim_start_matches('#').trim_end_matches('.');

    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Parse comma-separated generator output into at most [`MAX_TAGS`] tags,
/// keeping first-seen order.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::with_capacity(MAX_TAGS);
    for part in raw.split([',', '\n']) {
        let Some(tag) = normalize_tag(part) else {
            if !part.trim().is_empty() {
                trace!(tag = part.trim(), "Discarding unusable tag");
            }
            continue;
        };
        if tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
        if tags.len() == MAX_TAGS {
            break;
        }
    }
    tags
}
