//! Terminal surface for `vista describe`.
//!
//! The description goes to stdout as it arrives, a piece at a time, so the
//! output can be piped. Notices, warnings and the failure banner go to
//! stderr.

use std::io::{self, Write};
use std::path::PathBuf;

use vista::analysis::{Analyzer, Outcome};
use vista::image::ImagePayload;
use vista::render::{CURSOR, Frame, RESULT_HEADING, Surface, Theme};
use vista::session::{SessionEvent, SessionState};

use crate::error::Result;

/// Writes frames to a pair of streams.
#[derive(Debug)]
pub struct TerminalSurface<O, E> {
    out: O,
    err: E,
    printed: usize,
}

impl TerminalSurface<io::Stdout, io::Stderr> {
    /// Surface on the process's stdout and stderr.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> TerminalSurface<O, E> {
    /// Surface on the given streams.
    pub const fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed: 0,
        }
    }

    /// Consume the surface and return its streams.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    /// Print the part of `text` not yet on screen.
    fn print_tail(&mut self, text: &str) -> io::Result<()> {
        if let Some(tail) = text.get(self.printed..) {
            self.out.write_all(tail.as_bytes())?;
            self.printed = text.len();
        }
        self.out.flush()
    }

    fn write_frame(&mut self, frame: Frame) -> io::Result<()> {
        match frame {
            Frame::Warning { message, .. } => writeln!(self.err, "{message}"),
            Frame::Started { notice } => {
                self.printed = 0;
                writeln!(self.err, "{notice}")?;
                writeln!(self.err, "{RESULT_HEADING}")
            }
            Frame::Progress { text } => {
                let text = text.strip_suffix(CURSOR).unwrap_or(&text);
                self.print_tail(text)
            }
            Frame::Completed { text, .. } => {
                self.print_tail(&text)?;
                writeln!(self.out)
            }
            Frame::Failed { message } => {
                if self.printed > 0 {
                    writeln!(self.out)?;
                }
                writeln!(self.err, "{message}")
            }
        }
    }
}

impl<O: Write + Send, E: Write + Send> Surface for TerminalSurface<O, E> {
    fn show(&mut self, frame: Frame) {
        if let Err(e) = self.write_frame(frame) {
            tracing::debug!(error = %e, "terminal write failed");
        }
    }
}

/// Inputs of one `vista describe` run.
#[derive(Debug, Clone)]
pub struct DescribeRequest {
    /// Image file to describe.
    pub image: PathBuf,
    /// Optional question; turns the context toggle on.
    pub question: Option<String>,
    /// API key; may be empty.
    pub api_key: String,
    /// Theme recorded on the result.
    pub theme: Theme,
}

/// Reads the image and runs one analysis against `surface`.
///
/// # Errors
///
/// Fails if the image cannot be read or is not a JPEG or PNG. Failures of the
/// run itself are reported through the surface and the returned [`Outcome`].
pub async fn describe(
    analyzer: &Analyzer,
    request: DescribeRequest,
    surface: &mut dyn Surface,
) -> Result<Outcome> {
    let image = ImagePayload::read(&request.image).await?;

    let mut session = SessionState::new();
    session.apply(SessionEvent::ThemeChanged(request.theme));
    session.apply(SessionEvent::CredentialChanged(request.api_key));
    session.apply(SessionEvent::ImageSelected(image));
    if let Some(question) = request.question {
        session.apply(SessionEvent::ContextToggled(true));
        session.apply(SessionEvent::ContextChanged(question));
    }

    Ok(analyzer.analyze(session.trigger(), surface).await)
}
