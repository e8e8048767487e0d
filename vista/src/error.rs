//! Error types for vista.
//!
//! [`Error`] is what every fallible operation in the crate returns. Failures
//! while talking to the completion service are carried as [`LlmError`] so the
//! caller can tell an auth rejection from a dropped connection in logs, even
//! though the user-facing surfaces report them all the same way.

/// Result type alias for vista operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Completion service error.
    #[error("{0}")]
    Llm(#[from] LlmError),

    /// The uploaded file is not a recognized image type.
    #[error("unsupported image type for '{name}': only JPEG and PNG are accepted")]
    UnsupportedImage {
        /// File name as given by the uploader.
        name: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unsupported image error.
    #[must_use]
    pub fn unsupported_image(name: impl Into<String>) -> Self {
        Self::UnsupportedImage { name: name.into() }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Llm(err.into())
    }
}

/// Failure while talking to the completion service.
///
/// Every variant renders as a single line suitable for the failure banner.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum LlmError {
    /// The service refused the API key (HTTP 401/403).
    #[error("[{provider}] {message}")]
    Auth {
        /// Service that refused the key.
        provider: String,
        /// Message returned by the service.
        message: String,
    },

    /// Too many requests (HTTP 429).
    #[error("[{provider}] rate limit reached, try again in a moment")]
    RateLimited {
        /// Service that throttled the request.
        provider: String,
    },

    /// A response or stream payload could not be decoded.
    #[error("unexpected {expected}: {got}")]
    ResponseFormat {
        /// What was being decoded.
        expected: String,
        /// What arrived instead.
        got: String,
    },

    /// The service could not be reached, or the request timed out.
    #[error("{0}")]
    Network(String),

    /// The stream broke after it had started.
    #[error("{0}")]
    Stream(String),

    /// Non-success status with a body that is not a service error object.
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// Error object returned by the service.
    #[error("[{provider}] {message}")]
    Provider {
        /// Service name.
        provider: String,
        /// Message returned by the service.
        message: String,
        /// Error code or type, when the service sent one.
        code: Option<String>,
    },

    /// Local failure unrelated to the service, such as building the client.
    #[error("{0}")]
    Internal(String),
}

impl LlmError {
    /// Key rejected by `provider`.
    #[must_use]
    pub fn auth(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Request throttled by `provider`.
    #[must_use]
    pub fn rate_limited(provider: impl Into<String>) -> Self {
        Self::RateLimited {
            provider: provider.into(),
        }
    }

    /// Payload that did not decode as `expected`.
    #[must_use]
    pub fn response_format(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::ResponseFormat {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Transport failure.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Stream broken mid-response.
    #[must_use]
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Unrecognized non-success response.
    #[must_use]
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Service error object carrying `code`.
    #[must_use]
    pub fn provider_code(
        provider: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// Local failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network("the request to the completion service timed out")
        } else if err.is_connect() {
            Self::network(format!("could not reach the completion service: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }
}
