//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint speaking the OpenAI chat-completions and
//! embeddings protocol. Groq is the default target for generation.
//!
//! # Example
//!
//! ```rust,no_run
//! use recall_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use recall_core::{GenerationBackend, GenerationOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         api_key: std::env::var("GROQ_API_KEY").ok(),
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let text = backend
//!         .generate_with_options("Be brief.", "What is a fox?", GenerationOptions::new(0.2, 64))
//!         .await
//!         .unwrap();
//!     println!("{text}");
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig, DEFAULT_DIMENSION, DEFAULT_EMBED_MODEL};
pub use error::{to_recall_error, OpenAIErrorCode};
pub use types::*;
