//! Error types for the vista application.

use crate::config::ConfigError;

/// Result type alias for application operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded or saved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error from the vista library.
    #[error(transparent)]
    Vista(#[from] vista::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The web server failed to start or stopped unexpectedly.
    #[error("server error: {0}")]
    Server(String),
}

impl AppError {
    /// Create a server error.
    #[must_use]
    pub fn server(message: impl Into<String>) -> Self {
        Self::Server(message.into())
    }
}
