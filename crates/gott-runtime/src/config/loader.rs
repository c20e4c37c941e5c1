//! Configuration loader using figment.
//!
//! # Feature Flags
//!
//! - `toml-config` *(default)*: enables `gott.toml`
//! - `yaml-config`: enables `gott.yaml` / `gott.yml`
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Config file (`gott.toml` / `gott.yaml`), from the current directory or
//!    the user config directory (`~/.config/gott` on Linux)
//! 3. Environment variables (`GOTT_*`)
//! 4. Programmatic overrides ([`ConfigLoader::merge`])
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `GOTT_` prefix with `__` as separator:
//!
//! - `GOTT_BOT__TOKEN=xxx` → `bot.token = "xxx"`
//! - `GOTT_MODE=webhook` → `mode = "webhook"`
//! - `GOTT_POLLING__RETRY__MAX_DELAY_MS=60000` → `polling.retry.max_delay_ms = 60000`
//!
//! # Example
//!
//! ```rust,ignore
//! use gott_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new().load()?;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/gott.toml")
//!     .without_env()
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::GottConfig;
use super::validation::validate_config;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GOTT_";

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    ///
    /// When no search path is given, the current directory and the user
    /// config directory are searched.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration programmatically, over every other source.
    pub fn merge(mut self, config: GottConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Sets a single value programmatically, e.g. `set("bot.token", "...")`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Loads, validates and returns the configuration.
    pub fn load(self) -> ConfigResult<GottConfig> {
        let figment = self.build_figment()?;
        let config: GottConfig = figment.extract()?;
        validate_config(&config)?;

        debug!(
            mode = %config.mode,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(GottConfig::default()));

        if let Some(path) = &self.config_file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, path)?;
        } else {
            figment = self.load_config_files(figment)?;
        }

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gott"));
        }
        paths
    }

    /// Merges the first config file found in the search paths.
    fn load_config_files(&self, figment: Figment) -> ConfigResult<Figment> {
        let found = self.resolve_search_paths().into_iter().find_map(|dir| {
            CONFIG_FILE_NAMES
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.exists())
        });

        match found {
            Some(path) => {
                info!(path = %path.display(), "Loading configuration file");
                merge_config_file(figment, &path)
            }
            None => {
                warn!("No configuration file found, using defaults");
                Ok(figment)
            }
        }
    }
}

/// File names searched in each search path, per enabled format.
const CONFIG_FILE_NAMES: &[&str] = &[
    #[cfg(feature = "toml-config")]
    "gott.toml",
    #[cfg(feature = "yaml-config")]
    "gott.yaml",
    #[cfg(feature = "yaml-config")]
    "gott.yml",
];

/// Merges a single config file into the figment, dispatching on file extension.
#[cfg_attr(
    not(any(feature = "toml-config", feature = "yaml-config")),
    allow(unused_variables)
)]
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<GottConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from a specific file, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<GottConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LogLevel, UpdateMode};
    use figment::Jail;
    use gott_core::UpdateType;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::new()
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.mode, UpdateMode::Polling);
            assert_eq!(config.logging.level, LogLevel::Info);
            assert_eq!(config.polling.limit, 100);
            assert_eq!(config.bot.api_url, "https://botapi.tamtam.chat");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_file_then_env_then_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "gott.toml",
                r#"
                mode = "webhook"

                [bot]
                token = "from-file"

                [polling]
                types = ["message_created", "bot_started"]

                [webhook]
                port = 8443
                path = "/hook"
                read_timeout_secs = 10
                "#,
            )?;
            jail.set_env("GOTT_BOT__TOKEN", "from-env");
            jail.set_env("GOTT_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .set("webhook.path", "/override")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.mode, UpdateMode::Webhook);
            assert_eq!(config.bot.token, "from-env");
            assert_eq!(config.logging.level, LogLevel::Debug);
            assert_eq!(config.webhook.port, 8443);
            assert_eq!(config.webhook.path, "/override");
            assert_eq!(config.webhook.read_timeout_secs, Some(10));
            assert_eq!(
                config.polling.types,
                vec![UpdateType::MessageCreated, UpdateType::BotStarted]
            );
            Ok(())
        });
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new()
            .file("/nonexistent/gott.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_file_format() {
        Jail::expect_with(|jail| {
            jail.create_file("gott.json", r#"{ "mode": "webhook" }"#)?;
            let err = ConfigLoader::new().file("gott.json").load().unwrap_err();
            assert!(matches!(err, ConfigError::UnsupportedFormat(ref ext) if ext == "json"));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("GOTT_POLLING__LIMIT", "0");
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, ConfigError::ValidationError { .. }));

            jail.set_env("GOTT_POLLING__LIMIT", "many");
            let err = ConfigLoader::new().load().unwrap_err();
            assert!(matches!(err, ConfigError::Extract(_)));
            Ok(())
        });
    }
}
