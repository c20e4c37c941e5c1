//! Runtime error types.

use thiserror::Error;

use crate::config::{ConfigError, UpdateMode};
use gott_transport::TransportError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// An update source is already running on this updater.
    #[error("Updater already started in {0} mode")]
    AlreadyStarted(UpdateMode),

    /// Transport error (bind failure, HTTP client setup).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No bot token was configured.
    #[error("Bot token is not configured (set bot.token or GOTT_BOT__TOKEN)")]
    MissingToken,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
