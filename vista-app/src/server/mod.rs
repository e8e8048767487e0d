//! Web surface.
//!
//! One page, a JSON API for control changes, and an SSE endpoint that streams
//! frames while a description is generated. Every browser tab gets its own
//! session; sessions live only in memory and are dropped when the tab closes
//! or after going unused for `server.session_idle_secs`.

mod page;
pub mod routes;
mod sessions;

pub use sessions::SessionStore;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use tokio::net::TcpListener;
use tracing::info;
use vista::analysis::Analyzer;
use vista::llms::OpenAI;
use vista::render::Theme;

use crate::config::AppConfig;
use crate::error::{AppError, Result};

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Open sessions.
    pub sessions: SessionStore,
    /// Runs descriptions.
    pub analyzer: Analyzer,
    /// Theme new sessions start with.
    pub default_theme: Theme,
}

impl AppState {
    /// Create state with no sessions.
    #[must_use]
    pub fn new(analyzer: Analyzer, default_theme: Theme) -> Self {
        Self {
            sessions: SessionStore::new(),
            analyzer,
            default_theme,
        }
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/sessions", post(routes::create_session))
        .route("/api/sessions/{id}", delete(routes::delete_session))
        .route("/api/sessions/{id}/events", post(routes::post_event))
        .route(
            "/api/sessions/{id}/image",
            put(routes::put_image)
                .get(routes::get_image)
                .delete(routes::delete_image),
        )
        .route("/api/sessions/{id}/theme.css", get(routes::theme_css))
        .route("/api/sessions/{id}/analyze", get(routes::analyze))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Build the analyzer described by `config`.
///
/// # Errors
///
/// Fails if the HTTP client cannot be created.
pub fn analyzer_from_config(config: &AppConfig) -> Result<Analyzer> {
    let client = OpenAI::new(config.provider.openai_config())?;
    Ok(Analyzer::new(Arc::new(client)).with_settings(config.provider.analysis_settings()))
}

/// Serve until Ctrl+C.
///
/// # Errors
///
/// Fails if the address cannot be bound or the server stops with an error.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let analyzer = analyzer_from_config(config)?;
    let state = AppState::new(analyzer, config.ui.theme);
    let sweeper = state.sessions.spawn_sweeper(config.server.session_idle());
    let app = router(state, config.server.max_upload_bytes);

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::server(format!("failed to bind {addr}: {e}")))?;

    info!(
        addr = %addr,
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        session_idle_secs = config.server.session_idle_secs,
        "vista listening"
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await;
    sweeper.abort();
    served.map_err(|e| AppError::server(e.to_string()))
}
