//! OpenAI API client implementation.
//!
//! Supports streaming chat completions with image inputs, against
//! api.openai.com or any server speaking the same protocol.

mod chat;
mod client;
mod config;
mod stream;
mod types;

pub use client::OpenAI;
pub use config::OpenAIConfig;
