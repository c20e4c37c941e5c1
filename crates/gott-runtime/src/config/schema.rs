//! Configuration schema definitions.
//!
//! ```toml
//! mode = "polling"
//!
//! [bot]
//! token = "..."
//!
//! [polling]
//! limit = 100
//! timeout_secs = 30
//! types = ["message_created", "message_callback"]
//!
//! [polling.retry]
//! initial_delay_ms = 500
//! max_delay_ms = 30000
//!
//! [webhook]
//! port = 8443
//! path = "/tamtam"
//! read_timeout_secs = 10
//!
//! [logging]
//! level = "debug"
//! filters = { hyper = "warn" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use gott_core::UpdateType;
use gott_transport::DEFAULT_API_URL;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GottConfig {
    /// Where updates come from.
    #[serde(default)]
    pub mode: UpdateMode,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub webhook: WebhookConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Update source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Long-poll the API.
    #[default]
    Polling,
    /// Listen for pushed deliveries.
    Webhook,
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Polling => "polling",
            Self::Webhook => "webhook",
        })
    }
}

// =============================================================================
// Bot
// =============================================================================

/// API access settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot access token.
    #[serde(default)]
    pub token: String,

    /// Root URL of the bot API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout for a whole API request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    45
}

// =============================================================================
// Polling
// =============================================================================

/// Long-poll settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Maximum updates per page.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Seconds the server may hold a poll open.
    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u32,

    /// Starting marker; unset resumes from the last committed update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<i64>,

    /// Update types to receive; empty means all.
    #[serde(default)]
    pub types: Vec<UpdateType>,

    /// Backoff after failed polls.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            timeout_secs: default_poll_timeout_secs(),
            marker: None,
            types: Vec::new(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_limit() -> u32 {
    100
}

fn default_poll_timeout_secs() -> u32 {
    30
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// =============================================================================
// Webhook
// =============================================================================

/// Webhook listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Route that accepts deliveries.
    #[serde(default = "default_path")]
    pub path: String,

    /// Seconds a delivery body may take to arrive; unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_secs: Option<u64>,
}

impl WebhookConfig {
    /// Returns the `host:port` bind address.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path: default_path(),
            read_timeout_secs: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_path() -> String {
    "/".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `compact` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Appends to `file_path`.
    File,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `gott_runtime = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of the call site.
    #[serde(default)]
    pub file_location: bool,
}
