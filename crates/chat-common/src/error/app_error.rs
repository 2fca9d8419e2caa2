//! Application error types
//!
//! Unified error handling for binaries built on the chat crates.

use crate::config::ConfigError;
use crate::telemetry::TracingError;
use chat_core::DomainError;
use std::fmt;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Telemetry errors
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TracingError),

    // Transport errors (surfaced by the transport collaborator)
    #[error("Transport error: {0}")]
    Transport(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get error code for logs and exit diagnostics
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Telemetry(_) => "TELEMETRY_ERROR",
            Self::Transport(_) => "TRANSPORT_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Check if the error was caused by user-supplied input
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Domain(e) => e.is_validation(),
            _ => false,
        }
    }

    /// Create a transport error from any displayable cause
    #[must_use]
    pub fn transport(cause: impl fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
