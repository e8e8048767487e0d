//! OpenAI SSE stream parsing.

use std::fmt::Display;
use std::pin::pin;

use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};

use crate::error::{Error, LlmError, Result};
use crate::stream::{ChunkStream, StopReason, StreamChunk};

use super::client::OpenAI;
use super::types::{OpenAIErrorResponse, OpenAIStreamChunk};

/// One decoded `data:` payload.
#[derive(Debug)]
pub(crate) enum SsePayload {
    /// The `[DONE]` sentinel.
    Done,
    /// A completion chunk.
    Chunk(OpenAIStreamChunk),
}

/// Decode the data of one SSE event.
///
/// An `{"error": ...}` object sent mid-stream is turned into the same error a
/// non-2xx response would produce.
pub(crate) fn parse_payload(data: &str) -> Result<SsePayload> {
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SsePayload::Done);
    }

    if let Ok(response) = serde_json::from_str::<OpenAIErrorResponse>(data) {
        return Err(OpenAI::api_error(None, response.error).into());
    }

    serde_json::from_str::<OpenAIStreamChunk>(data)
        .map(SsePayload::Chunk)
        .map_err(|e| {
            LlmError::response_format(
                "OpenAI stream chunk",
                format!("parse error: {e}, data: {data}"),
            )
            .into()
        })
}

/// Split a chunk into text/usage items, returning the finish reason if any.
fn convert_chunk(chunk: OpenAIStreamChunk, out: &mut Vec<StreamChunk>) -> Option<StopReason> {
    let mut stop_reason = None;

    for choice in chunk.choices {
        if let Some(content) = choice.delta.content
            && !content.is_empty()
        {
            out.push(StreamChunk::Text(content));
        }

        if let Some(reason) = &choice.finish_reason {
            stop_reason = Some(StopReason::parse(reason));
        }
    }

    if let Some(usage) = chunk.usage {
        out.push(StreamChunk::Usage(usage));
    }

    stop_reason
}

/// Turn a raw SSE byte stream into [`StreamChunk`]s.
///
/// The stream always ends with either one `Done` item or one `Err` item.
pub(crate) fn chunk_stream<S, B, E>(bytes: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut events = pin!(bytes.eventsource());
        let mut stop_reason = None;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    yield Err(Error::from(LlmError::stream(e.to_string())));
                    return;
                }
            };

            match parse_payload(&event.data) {
                Ok(SsePayload::Done) => {
                    yield Ok(StreamChunk::done(stop_reason));
                    return;
                }
                Ok(SsePayload::Chunk(chunk)) => {
                    let mut items = Vec::new();
                    if let Some(reason) = convert_chunk(chunk, &mut items) {
                        stop_reason = Some(reason);
                    }
                    for item in items {
                        yield Ok(item);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        tracing::debug!("SSE stream closed without [DONE]");
        yield Ok(StreamChunk::done(stop_reason));
    };

    Box::pin(stream)
}
