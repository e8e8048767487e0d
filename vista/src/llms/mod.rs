//! Completion service backends.
//!
//! - [`openai`] - OpenAI Chat Completions API and compatible servers

pub mod openai;

pub use openai::{OpenAI, OpenAIConfig};
