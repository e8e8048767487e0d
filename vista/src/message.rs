//! Message types sent to the completion service.
//!
//! A description request is always a single user message carrying a text part
//! and an image part, so only those shapes are modeled here.

use serde::{Deserialize, Serialize};

use crate::image::ImagePayload;

/// Role of a message in a conversation.
///
/// Requests are single-turn, so the user is the only sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message.
    User,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
        }
    }
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content.
    Text {
        /// The text content.
        text: String,
    },
    /// Image referenced by URL (http(s) or data URI).
    ImageUrl {
        /// The image URL details.
        image_url: ImageUrl,
    },
}

/// Image URL structure for vision APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// The URL of the image (can be http(s) URL or data URL).
    pub url: String,
}

impl ContentPart {
    /// Create a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image URL part.
    #[must_use]
    pub fn image_url(url: impl Into<String>) -> Self {
        Self::ImageUrl {
            image_url: ImageUrl { url: url.into() },
        }
    }

    /// Returns the text if this is a text part.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::ImageUrl { .. } => None,
        }
    }
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent the message.
    pub role: Role,
    /// Ordered content parts.
    pub content: Vec<ContentPart>,
}

impl Message {
    /// Create a message with the given role and parts.
    #[must_use]
    pub const fn new(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }

    /// Create a user message with text followed by an embedded image.
    #[must_use]
    pub fn user_with_image(text: impl Into<String>, image: &ImagePayload) -> Self {
        Self::new(
            Role::User,
            vec![
                ContentPart::text(text),
                ContentPart::image_url(image.data_uri()),
            ],
        )
    }

    /// Concatenated text of all text parts.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentPart::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
