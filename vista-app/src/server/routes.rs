//! HTTP handlers.

use std::convert::Infallible;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Response};
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;
use vista::image::{ImageFormat, ImagePayload};
use vista::render::{Frame, Surface, result_card_html};
use vista::session::SessionEvent;

use super::AppState;
use super::page;

/// Errors returned as JSON `{ "error": ... }`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No session with this id.
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    /// The session has no uploaded image.
    #[error("no image uploaded")]
    ImageNotFound,
    /// The upload is not a JPEG or PNG.
    #[error(transparent)]
    UnsupportedImage(vista::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::SessionNotFound(_) | Self::ImageNotFound => StatusCode::NOT_FOUND,
            Self::UnsupportedImage(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// `GET /`
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(page::render(state.default_theme))
}

/// Body of a created session.
#[derive(Debug, Serialize)]
pub struct Created {
    id: Uuid,
}

/// `POST /api/sessions`
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<Created>) {
    let id = state.sessions.create(state.default_theme).await;
    (StatusCode::CREATED, Json(Created { id }))
}

/// `DELETE /api/sessions/{id}`
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// `POST /api/sessions/{id}/events`
pub async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(event): Json<SessionEvent>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.apply(id, event).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// Query string of an upload.
#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    name: String,
}

/// Preview metadata returned after an upload.
#[derive(Debug, Serialize)]
pub struct Uploaded {
    name: String,
    format: ImageFormat,
    size: usize,
}

/// `PUT /api/sessions/{id}/image?name=...`
pub async fn put_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> Result<Json<Uploaded>, ApiError> {
    let image = ImagePayload::from_upload(query.name, body).map_err(ApiError::UnsupportedImage)?;
    let uploaded = Uploaded {
        name: image.name().to_owned(),
        format: image.format(),
        size: image.len(),
    };

    if !state
        .sessions
        .apply(id, SessionEvent::ImageSelected(image))
        .await
    {
        return Err(ApiError::SessionNotFound(id));
    }

    debug!(session = %id, size = uploaded.size, "image uploaded");
    Ok(Json(uploaded))
}

/// `DELETE /api/sessions/{id}/image`
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.apply(id, SessionEvent::ImageCleared).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound(id))
    }
}

/// `GET /api/sessions/{id}/image`
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let image = state
        .sessions
        .image(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?
        .ok_or(ApiError::ImageNotFound)?;

    Ok((
        [(header::CONTENT_TYPE, image.format().mime_type())],
        image.bytes().clone(),
    )
        .into_response())
}

/// `GET /api/sessions/{id}/theme.css`
pub async fn theme_css(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let theme = state
        .sessions
        .theme(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;

    Ok(([(header::CONTENT_TYPE, "text/css; charset=utf-8")], theme.stylesheet()).into_response())
}

/// Forwards frames to the SSE response.
#[derive(Debug)]
struct ChannelSurface(mpsc::UnboundedSender<Frame>);

impl Surface for ChannelSurface {
    fn show(&mut self, frame: Frame) {
        if self.0.send(frame).is_err() {
            debug!("client went away, frame dropped");
        }
    }
}

/// `GET /api/sessions/{id}/analyze`
///
/// The run is detached from the response: a client that disconnects stops
/// receiving frames but the request to the provider runs to completion.
pub async fn analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let submission = state
        .sessions
        .trigger(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let analyzer = state.analyzer.clone();
    tokio::spawn(async move {
        let mut surface = ChannelSurface(tx);
        let outcome = analyzer.analyze(submission, &mut surface).await;
        info!(session = %id, phase = outcome.phase().as_str(), "run finished");
    });

    let stream = async_stream::stream! {
        while let Some(frame) = rx.recv().await {
            yield Ok::<_, Infallible>(frame_event(&frame));
        }
        yield Ok(Event::default().event("done").data("{}"));
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// One SSE event per frame, named after the frame kind. The completed frame
/// also carries the rendered result card.
fn frame_event(frame: &Frame) -> Event {
    let mut payload = serde_json::to_value(frame).unwrap_or_default();
    if let (Frame::Completed { text, theme }, Some(fields)) = (frame, payload.as_object_mut()) {
        fields.insert("html".to_owned(), result_card_html(*theme, text).into());
    }
    Event::default()
        .event(frame.kind())
        .data(payload.to_string())
}
