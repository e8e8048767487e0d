//! Presentation: themes, render frames and the surfaces that show them.
//!
//! The analysis loop never formats anything for a particular screen. It emits
//! [`Frame`]s to a [`Surface`], and each surface (web page, terminal, test
//! recorder) decides how to show them. Everything theme-dependent is looked up
//! from a [`Palette`] keyed by [`Theme`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::Warning;

/// Appended to the partial text while the stream is still running.
pub const CURSOR: char = '▌';

/// Shown while the request is in flight.
pub const BUSY_NOTICE: &str = "🔎 Analizando la imagen... por favor espera ⏳";

/// Heading above the final result card.
pub const RESULT_HEADING: &str = "🧠 Resultado del análisis:";

/// Page title and tagline.
pub const PAGE_TITLE: &str = "🔍 Análisis Visual con IA";
/// Tagline under the page title.
pub const PAGE_TAGLINE: &str =
    "Sube una imagen y deja que el modelo la describa, analice o responda tus preguntas";

const ACCENT: &str = "#4A90E2";

/// The two presentation themes offered by the selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light background ("Claro").
    #[default]
    Light,
    /// Dark background ("Oscuro").
    Dark,
}

impl Theme {
    /// Both themes, in selector order.
    pub const ALL: [Self; 2] = [Self::Light, Self::Dark];

    /// Label shown by the selector.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Light => "Claro",
            Self::Dark => "Oscuro",
        }
    }

    /// Identifier used in URLs and config files.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    /// Colors for this theme.
    #[must_use]
    pub const fn palette(&self) -> Palette {
        match self {
            Self::Light => Palette {
                page_background: "#FFFFFF",
                page_text: "#000000",
                input: None,
                card_background: "#f7f9fc",
                card_text: "#000000",
            },
            Self::Dark => Palette {
                page_background: "#121212",
                page_text: "#f5f5f5",
                input: Some(InputColors {
                    background: "#1E1E1E",
                    text: "#f5f5f5",
                    border: "#333",
                }),
                card_background: "#1E1E1E",
                card_text: "#f5f5f5",
            },
        }
    }

    /// Page-level stylesheet for this theme.
    #[must_use]
    pub fn stylesheet(&self) -> String {
        let palette = self.palette();
        let mut css = format!(
            "body, .app {{\n    background-color: {};\n    color: {};\n}}\n",
            palette.page_background, palette.page_text
        );
        if let Some(input) = palette.input {
            css.push_str(&format!(
                "input, textarea {{\n    background-color: {} !important;\n    color: {} !important;\n    border: 1px solid {} !important;\n}}\n",
                input.background, input.text, input.border
            ));
        }
        css
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" | "claro" => Ok(Self::Light),
            "dark" | "oscuro" => Ok(Self::Dark),
            other => Err(format!("unknown theme '{other}' (expected light or dark)")),
        }
    }
}

/// Theme colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Page background.
    pub page_background: &'static str,
    /// Page text.
    pub page_text: &'static str,
    /// Form control overrides, if the theme needs them.
    pub input: Option<InputColors>,
    /// Result card background.
    pub card_background: &'static str,
    /// Result card text.
    pub card_text: &'static str,
}

/// Form control colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputColors {
    /// Control background.
    pub background: &'static str,
    /// Control text.
    pub text: &'static str,
    /// Control border.
    pub border: &'static str,
}

/// One render update produced by an analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    /// A precondition is not met; nothing was sent.
    Warning {
        /// Which precondition.
        warning: Warning,
        /// Message for the user.
        message: String,
    },
    /// The request is about to be sent.
    Started {
        /// Busy notice for the user.
        notice: String,
    },
    /// Text so far, followed by the cursor marker.
    Progress {
        /// Buffer plus [`CURSOR`].
        text: String,
    },
    /// The stream ended; the final text, without cursor.
    Completed {
        /// Full response.
        text: String,
        /// Theme selected when the run was triggered.
        theme: Theme,
    },
    /// The run failed; earlier progress stays on screen.
    Failed {
        /// Banner text including the error description.
        message: String,
    },
}

impl Frame {
    /// The frame's tag, as used in its serialized form.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Warning { .. } => "warning",
            Self::Started { .. } => "started",
            Self::Progress { .. } => "progress",
            Self::Completed { .. } => "completed",
            Self::Failed { .. } => "failed",
        }
    }

    /// Returns `true` for the last frame of a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed { .. } | Self::Failed { .. })
    }

    /// Warning frame for a missing precondition.
    #[must_use]
    pub fn warning(warning: Warning) -> Self {
        Self::Warning {
            warning,
            message: warning.message().to_owned(),
        }
    }

    /// Progress frame for the buffer so far.
    #[must_use]
    pub fn progress(buffer: &str) -> Self {
        let mut text = String::with_capacity(buffer.len() + CURSOR.len_utf8());
        text.push_str(buffer);
        text.push(CURSOR);
        Self::Progress { text }
    }

    /// Failure frame carrying the error's description.
    #[must_use]
    pub fn failed(error: &impl fmt::Display) -> Self {
        Self::Failed {
            message: format!("❌ Ocurrió un error: {error}"),
        }
    }
}

/// Something that displays frames.
pub trait Surface: Send {
    /// Shows one frame. Frames arrive in order; a surface never sees a frame
    /// after `Completed` or `Failed` for the same run.
    fn show(&mut self, frame: Frame);
}

/// Records frames in order.
impl Surface for Vec<Frame> {
    fn show(&mut self, frame: Frame) {
        self.push(frame);
    }
}

/// HTML for the final result: heading plus the themed card.
#[must_use]
pub fn result_card_html(theme: Theme, text: &str) -> String {
    let palette = theme.palette();
    format!(
        "<h3 style=\"color:{ACCENT};\">{RESULT_HEADING}</h3>\n\
         <div class=\"result-card\" style=\"background-color: {bg}; padding: 15px; \
         border-radius: 10px; border: 1px solid #e0e0e0; \
         box-shadow: 0px 2px 6px rgba(0,0,0,0.05); font-size: 16px; line-height: 1.6; \
         color: {fg}; white-space: pre-wrap;\">{body}</div>",
        bg = palette.card_background,
        fg = palette.card_text,
        body = escape_html(text),
    )
}

/// Escapes text for inclusion in HTML element content or attributes.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
