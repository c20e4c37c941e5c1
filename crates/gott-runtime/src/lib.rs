//! # gott runtime
//!
//! Runs a gott bot:
//!
//! - [`Updater`]: feeds a [`Dispatcher`](gott_framework::Dispatcher) from
//!   long-polling or a webhook listener
//! - [`config`]: layered configuration (defaults, `gott.toml`, `GOTT_*`
//!   environment variables)
//! - [`logging`]: tracing subscriber setup from configuration
//! - [`RetryPolicy`]: backoff for failed polls
//!
//! ```rust,ignore
//! use gott_runtime::{Updater, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let updater = Updater::from_config(&config)?;
//!     // register handlers on updater.dispatcher()
//!     updater.start(&config).await?;
//!     updater.idle().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod retry;
pub mod updater;

pub use config::{ConfigError, ConfigLoader, ConfigResult, GottConfig, UpdateMode};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::LoggingBuilder;
pub use retry::{Backoff, RetryPolicy};
pub use updater::{PollingOptions, Updater, WebhookOptions};

// Re-export tracing for use by applications
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
