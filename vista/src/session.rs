//! Per-user input state.
//!
//! A [`SessionState`] holds the current value of every control on the page.
//! Each control change arrives as one [`SessionEvent`] and is applied in
//! place; nothing is validated here. Pressing the analyze button turns the
//! state into a [`Submission`] via [`SessionState::trigger`].

use serde::{Deserialize, Serialize};

use crate::credential::Credential;
use crate::image::ImagePayload;
use crate::render::Theme;

/// A change to one control.
///
/// Text-like events are deserializable from JSON tagged by `type`; image
/// uploads arrive as raw bytes and are built by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The credential field changed.
    CredentialChanged(String),
    /// A file was picked.
    #[serde(skip)]
    ImageSelected(ImagePayload),
    /// The picked file was removed.
    ImageCleared,
    /// The "add context" toggle changed.
    ContextToggled(bool),
    /// The context text changed.
    ContextChanged(String),
    /// The theme selector changed.
    ThemeChanged(Theme),
}

impl SessionEvent {
    /// Short name for logs. Never includes the event's value.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CredentialChanged(_) => "credential_changed",
            Self::ImageSelected(_) => "image_selected",
            Self::ImageCleared => "image_cleared",
            Self::ContextToggled(_) => "context_toggled",
            Self::ContextChanged(_) => "context_changed",
            Self::ThemeChanged(_) => "theme_changed",
        }
    }
}

/// Everything one analysis run needs, captured at trigger time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Credential as entered; may be empty.
    pub credential: Credential,
    /// The uploaded image, if any.
    pub image: Option<ImagePayload>,
    /// Context text, present only when the toggle was on.
    pub context: Option<String>,
    /// Theme for the result card.
    pub theme: Theme,
}

/// Current values of the input controls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    credential: Credential,
    image: Option<ImagePayload>,
    context_enabled: bool,
    context: String,
    theme: Theme,
}

impl SessionState {
    /// A session with every control at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one control change.
    pub fn apply(&mut self, event: SessionEvent) {
        tracing::trace!(event = event.kind(), "session event");
        match event {
            SessionEvent::CredentialChanged(secret) => self.credential = Credential::new(secret),
            SessionEvent::ImageSelected(image) => self.image = Some(image),
            SessionEvent::ImageCleared => self.image = None,
            SessionEvent::ContextToggled(enabled) => self.context_enabled = enabled,
            SessionEvent::ContextChanged(text) => self.context = text,
            SessionEvent::ThemeChanged(theme) => self.theme = theme,
        }
    }

    /// Snapshot for one analysis run.
    ///
    /// The context text is dropped while the toggle is off, but stays in the
    /// session so turning the toggle back on restores it.
    #[must_use]
    pub fn trigger(&self) -> Submission {
        Submission {
            credential: self.credential.clone(),
            image: self.image.clone(),
            context: self.context_enabled.then(|| self.context.clone()),
            theme: self.theme,
        }
    }

    /// The uploaded image, if any.
    #[must_use]
    pub const fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Currently selected theme.
    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    /// Whether the context toggle is on.
    #[must_use]
    pub const fn context_enabled(&self) -> bool {
        self.context_enabled
    }
}
