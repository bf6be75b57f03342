//! Transport error types.

use patientor_core::ServiceError;
use thiserror::Error;

/// Errors raised while talking to the patient API.
#[derive(Debug, Error)]
pub enum HttpError {
    /// HTTP transport or body decoding error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 404 for this path.
    #[error("not found: {0}")]
    NotFound(String),

    /// The API returned another non-success status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        /// `message` field of the JSON error body, if any.
        message: Option<String>,
    },

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<HttpError> for ServiceError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::Http(err) if err.is_decode() => ServiceError::Decode(err.to_string()),
            HttpError::Http(err) => ServiceError::Transport(err.to_string()),
            HttpError::NotFound(resource) => ServiceError::NotFound { resource },
            HttpError::Api { status, message } => ServiceError::Rejected { status, message },
            HttpError::Config(message) => ServiceError::Transport(message),
        }
    }
}
