//! Transport error types.

use thiserror::Error;

/// Errors raised while setting up a transport.
///
/// Failures of individual requests are reported as
/// [`ApiError`](gott_core::ApiError) instead.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The listener could not bind its address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A transport option is unusable (empty token, bad URL, ...).
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// Result type for transport setup.
pub type TransportResult<T> = Result<T, TransportError>;
