//! Common error types for blobswitch.

use thiserror::Error;

/// Top-level error type for blobswitch operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The persisted configuration document is missing, unreadable or malformed.
    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    /// The active provider name matches no implemented backend.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Download or delete target does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network or credential failure reported by the underlying provider.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;
