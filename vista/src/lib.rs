//! Vista - streamed image descriptions from a vision-capable chat model.
//!
//! This crate holds everything below the user-facing surfaces: the per-user
//! input state, the request builder and OpenAI-compatible streaming client,
//! and the frames a surface renders while a description arrives.

pub mod analysis;
pub mod chat;
pub mod credential;
pub mod error;
pub mod image;
pub mod llms;
pub mod message;
pub mod prelude;
pub mod prompt;
pub mod providers;
pub mod render;
pub mod session;
pub mod stream;

pub use error::{Error, LlmError, Result};
