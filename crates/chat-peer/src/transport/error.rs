//! Transport error types

use chat_core::DomainError;
use thiserror::Error;

/// Transport error type
#[derive(Debug, Error)]
pub enum TransportError {
    /// The hub has been shut down
    #[error("Hub closed")]
    HubClosed,

    /// The envelope could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] DomainError),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
