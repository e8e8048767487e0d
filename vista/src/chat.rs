//! Chat request type and the provider trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use vista::prelude::*;
//!
//! let request = ChatRequest::new("gpt-4o")
//!     .message(Message::user_with_image("Describe this.", &image))
//!     .max_tokens(1200);
//!
//! let mut stream = provider.chat_stream(&credential, &request).await?;
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::error::Result;
use crate::message::Message;
use crate::stream::ChunkStream;

/// A chat completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gpt-4o").
    #[serde(default)]
    pub model: String,

    /// Conversation messages.
    #[serde(default)]
    pub messages: Vec<Message>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Creates a request for the given model.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Appends a message.
    #[must_use]
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets the output token cap.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A completion service that can stream a response.
///
/// The credential is passed per call rather than held by the provider, so one
/// provider instance can serve every session.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Opens a streaming completion.
    ///
    /// # Errors
    ///
    /// Fails if the request cannot be sent or the service rejects it before
    /// streaming starts. Failures after that arrive as `Err` items in the
    /// stream.
    async fn chat_stream(&self, credential: &Credential, request: &ChatRequest)
    -> Result<ChunkStream>;

    /// Name used in logs and error messages.
    fn provider_name(&self) -> &'static str;
}

/// Type alias for an Arc-wrapped `ChatProvider`.
pub type SharedChatProvider = Arc<dyn ChatProvider>;
