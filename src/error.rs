//! Error types for the Tollgate service.

use thiserror::Error;

/// Main error type for Tollgate operations.
///
/// Token-resolution failures are deliberately absent: the quota resolver
/// absorbs them and falls back to the default quota, so they never
/// propagate as errors.
#[derive(Error, Debug)]
pub enum TollgateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Counter store read failures (connectivity, serialization, timeout)
    #[error("Store read error: {0}")]
    StoreRead(String),

    /// Counter store write failures (connectivity, serialization, timeout)
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Tollgate operations.
pub type Result<T> = std::result::Result<T, TollgateError>;
