//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{GottConfig, LogOutput, PollingConfig, RetryConfig, UpdateMode};

/// Largest page the API serves.
const MAX_POLL_LIMIT: u32 = 1000;

/// Validates the entire configuration.
///
/// The bot token is not checked here; it is only required once an HTTP bot
/// is built from the configuration.
pub fn validate_config(config: &GottConfig) -> ConfigResult<()> {
    if config.bot.api_url.trim().is_empty() {
        return Err(ConfigError::missing_field("bot.api_url"));
    }
    if config.bot.request_timeout_secs == 0 {
        return Err(ConfigError::validation("Request timeout must be greater than 0"));
    }

    match config.mode {
        UpdateMode::Polling => {
            validate_polling_config(&config.polling)?;
            if config.bot.request_timeout_secs <= u64::from(config.polling.timeout_secs) {
                return Err(ConfigError::validation(format!(
                    "Request timeout ({}s) must exceed the poll timeout ({}s)",
                    config.bot.request_timeout_secs, config.polling.timeout_secs
                )));
            }
        }
        UpdateMode::Webhook => {
            if config.webhook.port == 0 {
                return Err(ConfigError::validation("Webhook port must be non-zero"));
            }
            if config.webhook.path.is_empty() {
                return Err(ConfigError::missing_field("webhook.path"));
            }
            if config.webhook.read_timeout_secs == Some(0) {
                return Err(ConfigError::validation(
                    "Webhook read timeout must be non-zero when set",
                ));
            }
        }
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    Ok(())
}

fn validate_polling_config(polling: &PollingConfig) -> ConfigResult<()> {
    if polling.limit == 0 || polling.limit > MAX_POLL_LIMIT {
        return Err(ConfigError::validation(format!(
            "Polling limit must be between 1 and {MAX_POLL_LIMIT}, got {}",
            polling.limit
        )));
    }
    validate_retry_config(&polling.retry)
}

/// Validates retry configuration.
fn validate_retry_config(retry: &RetryConfig) -> ConfigResult<()> {
    if retry.max_delay_ms < retry.initial_delay_ms {
        return Err(ConfigError::validation(
            "Max retry delay must be greater than or equal to initial delay",
        ));
    }

    if retry.multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Backoff multiplier must be at least 1.0",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&GottConfig::default()).is_ok());
    }

    #[test]
    fn test_poll_limit_bounds() {
        let mut config = GottConfig::default();
        config.polling.limit = 0;
        assert!(validate_config(&config).is_err());
        config.polling.limit = MAX_POLL_LIMIT + 1;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_request_timeout_must_exceed_poll_timeout() {
        let mut config = GottConfig::default();
        config.bot.request_timeout_secs = 30;
        config.polling.timeout_secs = 30;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    fn test_retry_rules() {
        let mut config = GottConfig::default();
        config.polling.retry.multiplier = 0.5;
        assert!(validate_config(&config).is_err());

        let mut config = GottConfig::default();
        config.polling.retry.initial_delay_ms = 10_000;
        config.polling.retry.max_delay_ms = 1_000;
        assert!(validate_config(&config).is_err());

        // Zero delays reproduce immediate retries.
        let mut config = GottConfig::default();
        config.polling.retry.initial_delay_ms = 0;
        config.polling.retry.max_delay_ms = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_webhook_rules() {
        let mut config = GottConfig::default();
        config.mode = UpdateMode::Webhook;
        config.webhook.port = 0;
        assert!(validate_config(&config).is_err());

        config.webhook.port = 8443;
        assert!(validate_config(&config).is_ok());

        config.webhook.read_timeout_secs = Some(0);
        assert!(validate_config(&config).is_err());

        config.webhook.read_timeout_secs = Some(10);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = GottConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { ref field }) if field == "logging.file_path"
        ));
    }
}
