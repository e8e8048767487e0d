//! The analysis requester.
//!
//! One call to [`Analyzer::analyze`] is one trigger: it checks the
//! submission, encodes the image, streams the description from the provider
//! and pushes [`Frame`]s to a [`Surface`] as text arrives. Nothing is kept
//! between calls.
//!
//! ```text
//! Idle -> Validating -> Encoding -> Streaming -> Completed
//!             |             |           |
//!             v             +-----------+-----> Failed
//!          Rejected
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use vista::prelude::*;
//!
//! let analyzer = Analyzer::new(Arc::new(OpenAI::new(OpenAIConfig::new())?));
//! let mut frames = Vec::new();
//! let outcome = analyzer.analyze(session.trigger(), &mut frames).await;
//! ```

use std::fmt;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::chat::{ChatRequest, SharedChatProvider};
use crate::error::Result;
use crate::image::ImagePayload;
use crate::llms::OpenAIConfig;
use crate::message::Message;
use crate::prompt::build_prompt;
use crate::render::{BUSY_NOTICE, Frame, Surface};
use crate::session::Submission;
use crate::stream::StreamChunk;

/// A missing precondition, reported instead of sending a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// The trigger was pressed without an uploaded image.
    MissingImage,
    /// No credential was entered.
    MissingCredential,
}

impl Warning {
    /// Message shown to the user.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::MissingImage => "⚠️ Por favor sube una imagen antes de analizar.",
            Self::MissingCredential => "🔑 Ingresa tu API key para continuar.",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Checking preconditions.
    Validating,
    /// Encoding the image and building the request.
    Encoding,
    /// Receiving fragments.
    Streaming,
    /// The stream ended normally.
    Completed,
    /// A precondition was missing; no request was sent.
    Rejected,
    /// The request or stream failed.
    Failed,
}

impl Phase {
    /// Returns the phase as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Encoding => "encoding",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for phases that end a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Rejected | Self::Failed)
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Preconditions were missing; no network call was made.
    Rejected(Vec<Warning>),
    /// The full description.
    Completed(String),
    /// The run failed. `partial` is what had been shown before the failure.
    Failed {
        /// Text received before the failure.
        partial: String,
        /// Description of the error.
        error: String,
    },
}

impl Outcome {
    /// The terminal phase this outcome corresponds to.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Rejected(_) => Phase::Rejected,
            Self::Completed(_) => Phase::Completed,
            Self::Failed { .. } => Phase::Failed,
        }
    }

    /// Returns `true` if the run completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Request parameters that do not come from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisSettings {
    /// Model identifier.
    pub model: String,
    /// Cap on generated tokens.
    pub max_tokens: u32,
}

impl AnalysisSettings {
    /// Default output cap.
    pub const DEFAULT_MAX_TOKENS: u32 = 1200;

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the output cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: OpenAIConfig::DEFAULT_MODEL.to_owned(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// Runs one description request per trigger.
#[derive(Clone)]
pub struct Analyzer {
    provider: SharedChatProvider,
    settings: AnalysisSettings,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("provider", &self.provider.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl Analyzer {
    /// Create an analyzer with default settings.
    #[must_use]
    pub fn new(provider: SharedChatProvider) -> Self {
        Self {
            provider,
            settings: AnalysisSettings::default(),
        }
    }

    /// Replace the request settings.
    #[must_use]
    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Builds the single-turn request for an image and optional context.
    #[must_use]
    pub fn build_request(&self, image: &ImagePayload, context: Option<&str>) -> ChatRequest {
        let prompt = build_prompt(context);
        ChatRequest::new(&self.settings.model)
            .message(Message::user_with_image(prompt, image))
            .max_tokens(self.settings.max_tokens)
    }

    /// Runs one trigger to completion.
    ///
    /// Never returns an error: every failure ends up as a frame on the
    /// surface and in the returned [`Outcome`].
    pub async fn analyze(&self, submission: Submission, surface: &mut dyn Surface) -> Outcome {
        let mut phase = Phase::Idle;
        transition(&mut phase, Phase::Validating);

        let image = match validate(&submission) {
            Ok(image) => image,
            Err(warnings) => {
                for warning in &warnings {
                    warn!(?warning, "analysis rejected");
                    surface.show(Frame::warning(*warning));
                }
                transition(&mut phase, Phase::Rejected);
                return Outcome::Rejected(warnings);
            }
        };

        surface.show(Frame::Started {
            notice: BUSY_NOTICE.to_owned(),
        });

        let mut buffer = String::new();
        match self
            .stream_description(&submission, image, &mut phase, &mut buffer, surface)
            .await
        {
            Ok(()) => {
                transition(&mut phase, Phase::Completed);
                info!(chars = buffer.chars().count(), "analysis completed");
                surface.show(Frame::Completed {
                    text: buffer.clone(),
                    theme: submission.theme,
                });
                Outcome::Completed(buffer)
            }
            Err(e) => {
                transition(&mut phase, Phase::Failed);
                error!(error = %e, received = buffer.len(), "analysis failed");
                surface.show(Frame::failed(&e));
                Outcome::Failed {
                    partial: buffer,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Encoding and streaming. Appends to `buffer` as fragments arrive so the
    /// caller still has the partial text if this fails.
    async fn stream_description(
        &self,
        submission: &Submission,
        image: &ImagePayload,
        phase: &mut Phase,
        buffer: &mut String,
        surface: &mut dyn Surface,
    ) -> Result<()> {
        transition(phase, Phase::Encoding);
        let request = self.build_request(image, submission.context.as_deref());
        debug!(
            image = image.name(),
            bytes = image.len(),
            with_context = submission.context.is_some(),
            "request built"
        );

        transition(phase, Phase::Streaming);
        let mut stream = self
            .provider
            .chat_stream(&submission.credential, &request)
            .await?;

        while let Some(chunk) = stream.next().await {
            match chunk? {
                StreamChunk::Text(text) if !text.is_empty() => {
                    buffer.push_str(&text);
                    surface.show(Frame::progress(buffer));
                }
                StreamChunk::Text(_) => {}
                StreamChunk::Usage(usage) => {
                    debug!(
                        prompt_tokens = usage.prompt_tokens,
                        completion_tokens = usage.completion_tokens,
                        "token usage"
                    );
                }
                StreamChunk::Done { stop_reason } => {
                    if stop_reason.is_some_and(|r| r.is_truncated()) {
                        warn!(
                            max_tokens = self.settings.max_tokens,
                            "description truncated by the output cap"
                        );
                    }
                    break;
                }
            }
        }

        Ok(())
    }
}

/// Checks the preconditions and hands back the image to describe.
///
/// Every unmet precondition is reported, image first.
fn validate(submission: &Submission) -> std::result::Result<&ImagePayload, Vec<Warning>> {
    let mut warnings = Vec::new();
    if submission.image.is_none() {
        warnings.push(Warning::MissingImage);
    }
    if submission.credential.is_empty() {
        warnings.push(Warning::MissingCredential);
    }
    match submission.image.as_ref() {
        Some(image) if warnings.is_empty() => Ok(image),
        _ => Err(warnings),
    }
}

fn transition(phase: &mut Phase, next: Phase) {
    debug!(from = phase.as_str(), to = next.as_str(), "analysis phase");
    *phase = next;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credential::Credential;
    use crate::message::ContentPart;
    use crate::providers::MockProvider;
    use crate::render::Theme;

    fn image() -> ImagePayload {
        ImagePayload::from_upload("perro.jpg", vec![0xFF_u8, 0xD8, 0xFF, 0xE0]).unwrap()
    }

    fn submission(image: Option<ImagePayload>, key: &str, context: Option<&str>) -> Submission {
        Submission {
            credential: Credential::new(key),
            image,
            context: context.map(str::to_owned),
            theme: Theme::Light,
        }
    }

    fn progress_texts(frames: &[Frame]) -> Vec<String> {
        frames
            .iter()
            .filter_map(|f| match f {
                Frame::Progress { text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_missing_image_makes_no_call() {
        let provider = Arc::new(MockProvider::new(["x"]));
        let analyzer = Analyzer::new(provider.clone());
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(None, "sk-test", None), &mut frames)
            .await;

        assert_eq!(outcome, Outcome::Rejected(vec![Warning::MissingImage]));
        assert_eq!(frames, vec![Frame::warning(Warning::MissingImage)]);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_makes_no_call() {
        let provider = Arc::new(MockProvider::new(["x"]));
        let analyzer = Analyzer::new(provider.clone());
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(Some(image()), "", None), &mut frames)
            .await;

        assert_eq!(outcome, Outcome::Rejected(vec![Warning::MissingCredential]));
        assert_eq!(frames, vec![Frame::warning(Warning::MissingCredential)]);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_both_missing_reports_both() {
        let provider = Arc::new(MockProvider::new(["x"]));
        let analyzer = Analyzer::new(provider.clone());
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(None, "", None), &mut frames)
            .await;

        assert_eq!(
            outcome,
            Outcome::Rejected(vec![Warning::MissingImage, Warning::MissingCredential])
        );
        assert_eq!(frames.len(), 2);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_progress_then_final_without_cursor() {
        let provider = Arc::new(MockProvider::new(["Hola", ", ", "mundo"]));
        let analyzer = Analyzer::new(provider.clone());
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut frames)
            .await;

        assert_eq!(outcome, Outcome::Completed("Hola, mundo".to_owned()));
        assert_eq!(
            progress_texts(&frames),
            vec!["Hola▌", "Hola, ▌", "Hola, mundo▌"]
        );
        assert!(matches!(frames.first(), Some(Frame::Started { .. })));
        assert_eq!(
            frames.last(),
            Some(&Frame::Completed {
                text: "Hola, mundo".to_owned(),
                theme: Theme::Light,
            })
        );
    }

    #[tokio::test]
    async fn test_empty_fragments_do_not_rerender() {
        let provider = Arc::new(MockProvider::new(["Hola", "", "!"]));
        let analyzer = Analyzer::new(provider);
        let mut frames = Vec::new();

        analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut frames)
            .await;

        assert_eq!(progress_texts(&frames), vec!["Hola▌", "Hola!▌"]);
    }

    #[tokio::test]
    async fn test_stream_error_keeps_partial_and_reports() {
        let provider = Arc::new(MockProvider::new(["Hola", "mundo"]).fail_after(1, "connection reset"));
        let analyzer = Analyzer::new(provider.clone());
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut frames)
            .await;

        assert_eq!(
            outcome,
            Outcome::Failed {
                partial: "Hola".to_owned(),
                error: "connection reset".to_owned(),
            }
        );
        assert_eq!(
            frames.last(),
            Some(&Frame::Failed {
                message: "❌ Ocurrió un error: connection reset".to_owned()
            })
        );
        assert_eq!(progress_texts(&frames), vec!["Hola▌"]);

        // A new trigger starts from scratch.
        let mut again = Vec::new();
        let second = analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut again)
            .await;
        assert_eq!(second.phase(), Phase::Failed);
        assert_eq!(progress_texts(&again), vec!["Hola▌"]);
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_rejected_request_is_reported() {
        let provider = Arc::new(MockProvider::new(["x"]).reject("Incorrect API key provided"));
        let analyzer = Analyzer::new(provider);
        let mut frames = Vec::new();

        let outcome = analyzer
            .analyze(submission(Some(image()), "sk-wrong", None), &mut frames)
            .await;

        assert_eq!(outcome.phase(), Phase::Failed);
        match frames.last() {
            Some(Frame::Failed { message }) => {
                assert!(message.contains("Incorrect API key provided"));
            }
            other => panic!("expected failure frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_request_text_without_context() {
        let provider = Arc::new(MockProvider::new(["ok"]));
        let analyzer = Analyzer::new(provider.clone());

        analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut Vec::new())
            .await;

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.max_tokens, Some(1200));
        assert_eq!(
            request.messages[0].content[0].as_text(),
            Some("Describe lo que ves en la imagen en español.")
        );
    }

    #[tokio::test]
    async fn test_request_text_with_context() {
        let provider = Arc::new(MockProvider::new(["ok"]));
        let analyzer = Analyzer::new(provider.clone());

        analyzer
            .analyze(
                submission(Some(image()), "sk-test", Some("¿Es de día?")),
                &mut Vec::new(),
            )
            .await;

        let request = &provider.requests()[0];
        assert_eq!(
            request.messages[0].content[0].as_text(),
            Some(
                "Describe lo que ves en la imagen en español.\n\nContexto adicional proporcionado por el usuario:\n¿Es de día?"
            )
        );
        assert!(matches!(
            &request.messages[0].content[1],
            ContentPart::ImageUrl { image_url } if image_url.url == image().data_uri()
        ));
    }

    #[tokio::test]
    async fn test_settings_flow_into_request() {
        let provider = Arc::new(MockProvider::new(["ok"]));
        let analyzer = Analyzer::new(provider.clone()).with_settings(
            AnalysisSettings::default()
                .with_model("gpt-4o-mini")
                .with_max_tokens(300),
        );

        analyzer
            .analyze(submission(Some(image()), "sk-test", None), &mut Vec::new())
            .await;

        let request = &provider.requests()[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, Some(300));
    }

    #[test]
    fn test_validate_returns_the_image() {
        let ready = submission(Some(image()), "sk-test", None);
        assert_eq!(validate(&ready).unwrap().name(), "perro.jpg");

        let no_key = submission(Some(image()), "", None);
        assert_eq!(validate(&no_key).unwrap_err(), vec![Warning::MissingCredential]);

        let nothing = submission(None, "", None);
        assert_eq!(
            validate(&nothing).unwrap_err(),
            vec![Warning::MissingImage, Warning::MissingCredential]
        );
    }

    #[test]
    fn test_phase_terminality() {
        assert!(!Phase::Streaming.is_terminal());
        assert!(Phase::Completed.is_terminal());
        assert!(Phase::Rejected.is_terminal());
        assert!(Phase::Failed.is_terminal());
    }
}
