//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use vista::prelude::*;
//! ```

pub use crate::llms::{OpenAI, OpenAIConfig};

pub use crate::analysis::{AnalysisSettings, Analyzer, Outcome, Phase, Warning};
pub use crate::chat::{ChatProvider, ChatRequest, SharedChatProvider};
pub use crate::credential::Credential;
pub use crate::error::{Error, LlmError, Result};
pub use crate::image::{ImageFormat, ImagePayload};
pub use crate::message::{ContentPart, Message, Role};
pub use crate::providers::MockProvider;
pub use crate::render::{Frame, Surface, Theme};
pub use crate::session::{SessionEvent, SessionState, Submission};
pub use crate::stream::{ChunkStream, StopReason, StreamChunk, Usage};
