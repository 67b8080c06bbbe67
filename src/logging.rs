//! Structured logging.
//!
//! Library code only emits `tracing` events. Binaries call [`init_logging`]
//! once to install a subscriber that writes to stderr, keeping stdout free
//! for results.

use serde::{Deserialize, Serialize};
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::error::ConfigError;

/// Environment variable whose filter directives override [`LoggingConfig::level`].
pub const LOG_ENV_VAR: &str = "CAUSAL_LAB_LOG";

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or filter directives: trace, debug, info, warn, error, off.
    pub level: String,

    /// Output format: `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Checks the format and the filter directives.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.format != "text" && self.format != "json" {
            return Err(ConfigError::InvalidSettings {
                reason: format!("Invalid log format: {} (must be 'json' or 'text')", self.format),
            });
        }
        EnvFilter::try_new(&self.level).map_err(|e| ConfigError::InvalidSettings {
            reason: format!("Invalid log level '{}': {e}", self.level),
        })?;
        Ok(())
    }
}

/// Installs the global subscriber.
///
/// `CAUSAL_LAB_LOG` takes precedence over the configured level. Fails if a
/// subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), ConfigError> {
    config.validate()?;
    let filter = build_env_filter(config)?;
    let base = Registry::default().with(filter);

    let installed = if config.format == "json" {
        base.with(
            fmt::layer()
                .json()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .try_init()
    } else {
        base.with(
            fmt::layer()
                .with_target(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .try_init()
    };

    installed.map_err(|e| ConfigError::InvalidSettings {
        reason: format!("Failed to install log subscriber: {e}"),
    })
}

fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
    if let Ok(filter) = EnvFilter::try_from_env(LOG_ENV_VAR) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidSettings {
        reason: format!("Invalid log level '{}': {e}", config.level),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, "text");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_format() {
        let config = LoggingConfig {
            format: "xml".to_string(),
            ..LoggingConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(format!("{err}").contains("xml"));
    }

    #[test]
    fn test_accepts_module_directives() {
        let config = LoggingConfig {
            level: "warn,causal_lab::engine=debug".to_string(),
            format: "json".to_string(),
        };
        assert!(config.validate().is_ok());
    }
}
