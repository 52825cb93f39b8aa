//! Error types
//!
//! Errors surfaced to callers of the public API. Failures inside a running
//! consumer session never reach this type; they only remove the session.

use std::time::Duration;

use crate::registry::RegistryError;

/// Crate-wide error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O failure (listener, socket setup)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the response head to a new consumer failed
    #[error("handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    /// Writing the response head did not complete in time
    #[error("handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    /// Registry rejected the operation
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Request head could not be parsed
    #[error("malformed request: {0}")]
    BadRequest(String),

    /// Request head was not received in time
    #[error("request head not received within {0:?}")]
    RequestTimeout(Duration),
}

/// Result alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;
