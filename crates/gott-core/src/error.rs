//! Error types shared by every gott crate.

use thiserror::Error;

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised while turning wire data into an [`Update`](crate::Update).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The input was not a JSON object.
    #[error("malformed update: {0}")]
    Malformed(#[source] serde_json::Error),

    /// The `update_type` discriminator was missing or not a string.
    #[error("update has no `update_type` discriminator")]
    MissingType,

    /// The discriminator named a type this crate does not know.
    #[error("unknown update type '{0}'")]
    UnknownType(String),

    /// The discriminator was known but the payload did not match its shape.
    #[error("invalid '{update_type}' payload: {source}")]
    InvalidPayload {
        /// The discriminator that was read.
        update_type: &'static str,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for upstream API calls.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The platform rejected the request with an error body.
    #[error("API error ({code}): {message}")]
    Upstream { code: String, message: String },

    /// Non-success status without a recognizable error body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Failed to serialize the request or deserialize the response.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Channel Errors
// =============================================================================

/// The consuming side of the update channel is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("update channel closed")]
pub struct ChannelClosed;

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
