//! Prompt templates sent to the generation service.
//!
//! Each builder returns the system prompt, user prompt and sampling
//! parameters for one call.

use recall_core::defaults::{
    ANSWER_MAX_TOKENS, ANSWER_TEMPERATURE, SUMMARY_MAX_TOKENS, SUMMARY_TEMPERATURE,
    TAGS_INPUT_CHARS, TAGS_MAX_TOKENS, TAGS_TEMPERATURE,
};
use recall_core::GenerationOptions;

pub const SUMMARY_SYSTEM: &str = "You are a professional summarization assistant.";

pub const TAGS_SYSTEM: &str =
    "Generate exactly 5 relevant single-word tags separated by commas only. No explanations.";

pub const ANSWER_SYSTEM: &str = "Answer using ONLY the provided knowledge base. If not found, say: 'Information not found in knowledge base.'";

/// A fully assembled generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: &'static str,
    pub user: String,
    pub options: GenerationOptions,
}

/// One knowledge item rendered into answer context.
#[derive(Debug, Clone, Copy)]
pub struct ContextEntry<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

/// First `max_chars` characters of `text` (never splits a character).
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

pub fn summary_prompt(content: &str) -> Prompt {
    Prompt {
        system: SUMMARY_SYSTEM,
        user: format!(
            "Summarize the following content in 3 concise professional sentences:\n\n{}",
            content
        ),
        options: GenerationOptions::new(SUMMARY_TEMPERATURE, SUMMARY_MAX_TOKENS),
    }
}

pub fn tags_prompt(content: &str) -> Prompt {
    Prompt {
        system: TAGS_SYSTEM,
        user: truncate_chars(content, TAGS_INPUT_CHARS).to_string(),
        options: GenerationOptions::new(TAGS_TEMPERATURE, TAGS_MAX_TOKENS),
    }
}

/// Render entries as `Title: ..\nContent: ..` blocks separated by a blank
/// line, capping each content at `content_budget` characters.
pub fn build_context(entries: &[ContextEntry<'_>], content_budget: usize) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "Title: {}\nContent: {}",
                e.title,
                truncate_chars(e.content, content_budget)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn answer_prompt(question: &str, context: &str) -> Prompt {
    Prompt {
        system: ANSWER_SYSTEM,
        user: format!("Knowledge Base:\n{}\n\nQuestion:\n{}", context, question),
        options: GenerationOptions::new(ANSWER_TEMPERATURE, ANSWER_MAX_TOKENS),
    }
}
