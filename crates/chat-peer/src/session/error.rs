//! Session error types

use crate::transport::TransportError;
use thiserror::Error;

/// Session error type
#[derive(Debug, Error)]
pub enum SessionError {
    /// Subscribing to the hub failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
