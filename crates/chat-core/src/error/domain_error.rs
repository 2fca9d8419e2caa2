//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid user id: {0:?}")]
    InvalidUserId(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),
}

impl DomainError {
    /// Get an error code string for logs and diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUserId(_) => "INVALID_USER_ID",
            Self::MalformedEnvelope(_) => "MALFORMED_ENVELOPE",
        }
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUserId(_))
    }
}
