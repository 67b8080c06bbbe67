//! Simulation parameters for synthetic data generation.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs controlling one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Rows to generate.
    pub n_samples: usize,
    /// Coefficient on the declared treatment → outcome edge.
    pub treatment_effect: f64,
    /// Standard deviation of the additive noise on continuous children.
    pub noise_std: f64,
    /// Coefficient on confounder → {treatment, outcome} edges.
    pub confounder_strength: f64,
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self {
            n_samples: 1000,
            treatment_effect: 2.0,
            noise_std: 0.5,
            confounder_strength: 1.0,
        }
    }
}

impl SimulationParameters {
    /// Sets the row count.
    #[must_use]
    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    /// Sets the treatment effect.
    #[must_use]
    pub fn with_treatment_effect(mut self, effect: f64) -> Self {
        self.treatment_effect = effect;
        self
    }

    /// Sets the noise level.
    #[must_use]
    pub fn with_noise_std(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Sets the confounder strength.
    #[must_use]
    pub fn with_confounder_strength(mut self, strength: f64) -> Self {
        self.confounder_strength = strength;
        self
    }

    /// Validate parameters.
    ///
    /// Called by the generator before any rows are drawn.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_samples == 0 {
            return Err(invalid("n_samples", "must be > 0"));
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(invalid("noise_std", "must be a finite, non-negative number"));
        }
        if !self.treatment_effect.is_finite() {
            return Err(invalid("treatment_effect", "must be finite"));
        }
        if !self.confounder_strength.is_finite() {
            return Err(invalid("confounder_strength", "must be finite"));
        }
        Ok(())
    }
}

fn invalid(parameter: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        reason: reason.to_string(),
    }
}
