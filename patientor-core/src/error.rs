//! Error types shared across the workspace.

/// Message shown when a failure carries nothing more specific.
pub const GENERIC_FAILURE_MESSAGE: &str = "An error occurred. Please try again.";

/// Invalid values for model types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("health check rating must be between 0 and 3, received {0}")]
    RatingOutOfRange(i64),
    #[error("unknown entry type: {0}")]
    UnknownEntryKind(String),
}

/// Failures reported by a [`crate::PatientService`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("{resource} not found")]
    NotFound { resource: String },
    #[error("request rejected ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        status: u16,
        /// The `message` field of the error body, when present.
        message: Option<String>,
    },
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Text suitable for an alert: the server's message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Rejected {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::NotFound { .. } => Some(404),
            ServiceError::Rejected { status, .. } => Some(*status),
            ServiceError::Transport(_) | ServiceError::Decode(_) => None,
        }
    }
}
