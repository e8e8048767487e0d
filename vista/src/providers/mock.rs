//! Mock provider for testing.
//!
//! [`MockProvider`] replays a fixed list of text fragments as a stream and
//! records every request it receives, so tests can check both what was sent
//! and how the output was rendered without a network.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::chat::{ChatProvider, ChatRequest};
use crate::credential::Credential;
use crate::error::{Error, LlmError, Result};
use crate::stream::{ChunkStream, StopReason, StreamChunk};

/// Where a scripted failure happens.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    /// The request itself is rejected before any fragment.
    OnOpen(String),
    /// The stream breaks after this many fragments.
    AfterFragments(usize, String),
}

/// A provider that streams predefined fragments.
///
/// # Example
///
/// ```rust,ignore
/// use vista::providers::MockProvider;
///
/// let provider = MockProvider::new(["Hola", ", ", "mundo"]);
/// let broken = MockProvider::new(["Hola"]).fail_after(1, "connection reset");
/// ```
#[derive(Debug)]
pub struct MockProvider {
    fragments: Vec<String>,
    failure: Option<Failure>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockProvider {
    /// Create a provider that streams the given fragments then ends.
    #[must_use]
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: fragments.into_iter().map(Into::into).collect(),
            failure: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Break the stream with `message` after `count` fragments.
    #[must_use]
    pub fn fail_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.failure = Some(Failure::AfterFragments(count, message.into()));
        self
    }

    /// Reject the request with an authentication error before streaming.
    #[must_use]
    pub fn reject(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(Failure::OnOpen(message.into()));
        self
    }

    /// Number of `chat_stream` calls so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn chat_stream(
        &self,
        _credential: &Credential,
        request: &ChatRequest,
    ) -> Result<ChunkStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let mut items: Vec<Result<StreamChunk>> = Vec::new();
        match &self.failure {
            Some(Failure::OnOpen(message)) => {
                return Err(LlmError::auth("mock", message.clone()).into());
            }
            Some(Failure::AfterFragments(count, message)) => {
                items.extend(
                    self.fragments
                        .iter()
                        .take(*count)
                        .map(|f| Ok(StreamChunk::text(f.clone()))),
                );
                items.push(Err(Error::from(LlmError::stream(message.clone()))));
            }
            None => {
                items.extend(
                    self.fragments
                        .iter()
                        .map(|f| Ok(StreamChunk::text(f.clone()))),
                );
                items.push(Ok(StreamChunk::done(Some(StopReason::Stop))));
            }
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
