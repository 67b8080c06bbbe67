//! Backdoor identification and effect estimators.
//!
//! Identification picks an adjustment set from the graph; estimators turn
//! an [`IdentifiedEstimand`] plus a table into a point estimate. Estimators
//! fail independently, so one method's failure never hides another
//! method's result.

mod regression;
mod stratification;

pub use regression::LinearRegressionEstimator;
pub use stratification::PropensityStratificationEstimator;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, EstimationError};
use crate::graph::CausalGraph;
use crate::table::DataTable;

/// Method name of [`LinearRegressionEstimator`].
pub const LINEAR_REGRESSION: &str = "backdoor.linear_regression";

/// Method name of [`PropensityStratificationEstimator`].
pub const PROPENSITY_SCORE_STRATIFICATION: &str = "backdoor.propensity_score_stratification";

/// Every method name [`EstimationConfig::build_estimators`] understands.
pub const KNOWN_METHODS: &[&str] = &[LINEAR_REGRESSION, PROPENSITY_SCORE_STRATIFICATION];

/// An identified causal effect: what to estimate and what to adjust for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifiedEstimand {
    /// Exposure.
    pub treatment: String,
    /// Response.
    pub outcome: String,
    /// Backdoor adjustment set, in first-seen order.
    pub adjustment_set: Vec<String>,
}

/// Pluggable point estimator.
pub trait EffectEstimator: Send + Sync {
    /// Stable method identifier, e.g. `backdoor.linear_regression`.
    fn method_name(&self) -> &str;

    /// Estimates the average effect of the treatment on the outcome.
    fn estimate(&self, estimand: &IdentifiedEstimand, table: &DataTable) -> Result<f64, EstimationError>;
}

/// Backdoor identification.
///
/// The adjustment set is the treatment's parents, the graph's declared
/// confounders, and `extra_common_causes`, minus the treatment, the outcome
/// and every descendant of the treatment. Only variables with a column in
/// `table` are kept.
pub fn identify_backdoor(
    graph: &CausalGraph,
    table: &DataTable,
    treatment: &str,
    outcome: &str,
    extra_common_causes: &[String],
) -> Result<IdentifiedEstimand, EstimationError> {
    let not_identified = |reason: String| EstimationError::NotIdentified {
        treatment: treatment.to_string(),
        outcome: outcome.to_string(),
        reason,
    };

    if treatment == outcome {
        return Err(not_identified("treatment and outcome are the same variable".to_string()));
    }
    for name in [treatment, outcome] {
        if !table.has_column(name) {
            return Err(not_identified(format!("'{name}' has no column in the data")));
        }
    }
    if graph.descendants(outcome).contains(&treatment) {
        return Err(not_identified(format!("'{outcome}' is an ancestor of '{treatment}'")));
    }
    let descendants = graph.descendants(treatment);

    let mut adjustment_set: Vec<String> = Vec::new();
    let candidates = graph
        .parents(treatment)
        .into_iter()
        .chain(graph.confounders().iter().map(String::as_str))
        .chain(extra_common_causes.iter().map(String::as_str));
    for name in candidates {
        let excluded = name == treatment || name == outcome || descendants.contains(&name);
        if !excluded && table.has_column(name) && !adjustment_set.iter().any(|a| a == name) {
            adjustment_set.push(name.to_string());
        }
    }

    debug!(treatment, outcome, adjustment = ?adjustment_set, "identified backdoor estimand");
    Ok(IdentifiedEstimand {
        treatment: treatment.to_string(),
        outcome: outcome.to_string(),
        adjustment_set,
    })
}

/// Relative confidence band `estimate ± z · width · |estimate|`.
///
/// Not a sampling interval; it scales with the estimate only.
#[must_use]
pub fn heuristic_interval(estimate: f64, z: f64, relative_width: f64) -> [f64; 2] {
    let half = z * estimate.abs() * relative_width;
    [estimate - half, estimate + half]
}

/// Estimation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Methods to run, in order. The first success is primary.
    pub methods: Vec<String>,
    /// Propensity strata.
    pub num_strata: usize,
    /// Minimum treated and control rows for a stratum to count.
    pub clipping_threshold: usize,
    /// Multiplier of the heuristic band.
    pub interval_z: f64,
    /// Relative half-width of the heuristic band before scaling by `interval_z`.
    pub interval_relative_width: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            methods: KNOWN_METHODS.iter().map(|m| (*m).to_string()).collect(),
            num_strata: 5,
            clipping_threshold: 10,
            interval_z: 1.96,
            interval_relative_width: 0.1,
        }
    }
}

impl EstimationConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidSettings { reason };

        if self.methods.is_empty() {
            return Err(invalid("estimation.methods must not be empty".to_string()));
        }
        if let Some(unknown) = self.methods.iter().find(|m| !KNOWN_METHODS.contains(&m.as_str())) {
            return Err(invalid(format!(
                "unknown estimation method '{unknown}' (known: {})",
                KNOWN_METHODS.join(", ")
            )));
        }
        if self.num_strata == 0 {
            return Err(invalid("estimation.num_strata must be > 0".to_string()));
        }
        if !self.interval_z.is_finite() || self.interval_z < 0.0 {
            return Err(invalid("estimation.interval_z must be finite and >= 0".to_string()));
        }
        if !self.interval_relative_width.is_finite() || self.interval_relative_width < 0.0 {
            return Err(invalid(
                "estimation.interval_relative_width must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Instantiates the configured estimators in order.
    pub fn build_estimators(&self) -> Result<Vec<Box<dyn EffectEstimator>>, ConfigError> {
        self.validate()?;
        self.methods
            .iter()
            .map(|name| -> Result<Box<dyn EffectEstimator>, ConfigError> {
                match name.as_str() {
                    LINEAR_REGRESSION => Ok(Box::new(LinearRegressionEstimator)),
                    PROPENSITY_SCORE_STRATIFICATION => Ok(Box::new(PropensityStratificationEstimator::new(
                        self.num_strata,
                        self.clipping_threshold,
                    ))),
                    other => Err(ConfigError::InvalidSettings {
                        reason: format!("unknown estimation method '{other}'"),
                    }),
                }
            })
            .collect()
    }
}

/// Borrows the estimand's columns in `[outcome, treatment, adjustment..]` order.
fn estimand_columns<'t>(
    estimand: &IdentifiedEstimand,
    table: &'t DataTable,
    method: &str,
) -> Result<(&'t [f64], &'t [f64], Vec<&'t [f64]>), EstimationError> {
    let column = |name: &str| {
        table.column(name).ok_or_else(|| EstimationError::InsufficientData {
            method: method.to_string(),
            reason: format!("column '{name}' not found"),
        })
    };
    let outcome = column(&estimand.outcome)?;
    let treatment = column(&estimand.treatment)?;
    let adjustment = estimand
        .adjustment_set
        .iter()
        .map(|name| column(name))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((outcome, treatment, adjustment))
}
