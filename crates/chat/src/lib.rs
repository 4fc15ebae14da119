//! Chat proxy to a local Ollama service.
//!
//! Forwards a user message with a fixed assistant preamble to Ollama's
//! generate endpoint and pulls the first YAML block out of the reply so it
//! can be dropped straight into the editor.

pub mod client;
pub mod error;
pub mod extract;

pub use client::{resolve_base_url, ChatExchange, OllamaClient, DEFAULT_MODEL, DEFAULT_MODELS};
pub use error::{ChatError, Result};
pub use extract::extract_yaml;
