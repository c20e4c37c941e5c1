//! Configuration module for the gott runtime.
//!
//! Configuration is layered with figment: built-in defaults, a `gott.toml`
//! or `gott.yaml` file, `GOTT_*` environment variables and programmatic
//! overrides. The result is validated before it is handed out.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BotConfig, GottConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, PollingConfig,
    RetryConfig, UpdateMode, WebhookConfig,
};
pub use validation::validate_config;
