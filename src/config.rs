//! Layered settings.
//!
//! Precedence, lowest first: built-in defaults, an optional TOML file,
//! then `CAUSAL_LAB__*` environment variables with `__` between nested
//! keys (for example `CAUSAL_LAB__SIMULATION__N_SAMPLES=500`).

use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::estimation::EstimationConfig;
use crate::logging::LoggingConfig;
use crate::synth::SimulationParameters;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "CAUSAL_LAB";

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

/// All runtime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Generator seed.
    pub seed: u64,
    /// Generation defaults.
    pub simulation: SimulationParameters,
    /// Estimation methods and interval settings.
    pub estimation: EstimationConfig,
    /// Log level and format.
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            simulation: SimulationParameters::default(),
            estimation: EstimationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Settings {
    /// Loads settings from defaults, `path` if given, and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads settings from defaults and a TOML document, ignoring the environment.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .add_source(defaults()?)
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(invalid)?;
        settings.validate()?;
        Ok(settings)
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(defaults()?);

        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::Io {
                    path: path.display().to_string(),
                    message: "settings file not found".to_string(),
                });
            }
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let env = env
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("estimation.methods");

        let settings: Self = builder
            .add_source(env)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(invalid)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.estimation.validate()?;
        self.logging.validate()
    }
}

fn defaults() -> Result<Config, ConfigError> {
    Config::try_from(&Settings::default()).map_err(invalid)
}

fn invalid(err: ::config::ConfigError) -> ConfigError {
    ConfigError::InvalidSettings {
        reason: err.to_string(),
    }
}
