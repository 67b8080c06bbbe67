//! Structured query results.
//!
//! Every dispatch produces a [`QueryResult`], successful or not. Kind-specific
//! fields are flattened into the top-level JSON object next to `success`,
//! `query_type`, `summary` and `error`.

use std::collections::BTreeMap;

use serde::Serialize;

/// Label attached to the relative confidence band of effect estimates.
pub const HEURISTIC_INTERVAL_KIND: &str = "heuristic_relative";

/// Label describing how distribution-shift windows are formed.
pub const ROW_ORDER_WINDOWING: &str = "row_order_halves";

/// Outcome of one dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// Whether the handler completed.
    pub success: bool,

    /// Wire tag of the query, or `unknown` when it could not be read.
    pub query_type: String,

    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Kind-specific fields.
    #[serde(flatten)]
    pub details: Option<QueryDetails>,

    /// One-line human-readable summary.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl QueryResult {
    /// A successful result.
    #[must_use]
    pub fn success(query_type: impl Into<String>, details: QueryDetails, summary: impl Into<String>) -> Self {
        Self {
            success: true,
            query_type: query_type.into(),
            error: None,
            details: Some(details),
            summary: Some(summary.into()),
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failure(query_type: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            query_type: query_type.into(),
            error: Some(error.into()),
            details: None,
            summary: None,
        }
    }

    /// Attaches details to a result.
    #[must_use]
    pub fn with_details(mut self, details: QueryDetails) -> Self {
        self.details = Some(details);
        self
    }

    /// JSON object form.
    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({
                "success": false,
                "query_type": self.query_type,
                "error": format!("serialize result: {e}"),
            })
        })
    }

    /// Pretty JSON text.
    #[must_use]
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_default()
    }
}

/// Kind-specific result fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryDetails {
    /// `effect_estimation` success.
    EffectEstimation(EffectEstimationDetails),
    /// `effect_estimation` with every method failed.
    EffectFailure(EffectFailureDetails),
    /// `anomaly_attribution`.
    AnomalyAttribution(AnomalyAttributionDetails),
    /// `distribution_shift_attribution`.
    DistributionShift(DistributionShiftDetails),
    /// `intervention`.
    Intervention(InterventionDetails),
    /// `counterfactual`.
    Counterfactual(CounterfactualDetails),
}

/// Per-method estimation record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodEstimate {
    /// Method name.
    pub method: String,
    /// Point estimate, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimate: Option<f64>,
    /// Heuristic band, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_interval: Option<[f64; 2]>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Fields of a successful effect estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectEstimationDetails {
    /// Exposure.
    pub treatment_variable: String,
    /// Response.
    pub outcome_variable: String,
    /// Treatment level from the query, echoed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment_value: Option<f64>,
    /// Primary (first successful) estimate.
    pub estimate: f64,
    /// Primary band.
    pub confidence_interval: [f64; 2],
    /// Always [`HEURISTIC_INTERVAL_KIND`].
    pub interval_kind: String,
    /// Backdoor adjustment set used by every method.
    pub adjustment_set: Vec<String>,
    /// Every method, successes and failures, in run order.
    pub all_estimates: Vec<MethodEstimate>,
}

/// Fields of an effect estimation where no method succeeded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectFailureDetails {
    pub failed_estimates: Vec<MethodEstimate>,
}

/// Statistics of one candidate cause.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AttributionScore {
    pub correlation: f64,
    pub normal_mean: f64,
    pub anomaly_mean: f64,
    pub difference: f64,
}

/// Fields of an anomaly attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyAttributionDetails {
    pub outcome_variable: String,
    pub anomaly_threshold: f64,
    pub anomalies_found: usize,
    pub attribution_scores: BTreeMap<String, AttributionScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_window: Option<serde_json::Value>,
}

/// Shift statistics of one driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriverContribution {
    pub baseline_mean: f64,
    pub comparison_mean: f64,
    pub shift: f64,
    pub correlation_with_target: f64,
    pub estimated_contribution: f64,
}

/// Fields of a distribution-shift attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionShiftDetails {
    pub target_variable: String,
    pub baseline_period: serde_json::Value,
    pub comparison_period: serde_json::Value,
    /// Always [`ROW_ORDER_WINDOWING`].
    pub windowing: String,
    pub baseline_rows: usize,
    pub comparison_rows: usize,
    pub baseline_mean: f64,
    pub comparison_mean: f64,
    pub shift_magnitude: f64,
    pub driver_contributions: BTreeMap<String, DriverContribution>,
}

/// Effect of an intervention on one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterventionEffect {
    pub original_value: f64,
    pub intervened_value: f64,
    pub effect: f64,
}

/// Fields of an intervention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterventionDetails {
    pub intervention_variable: String,
    pub intervention_value: f64,
    pub intervention_effects: BTreeMap<String, InterventionEffect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<serde_json::Value>,
}

/// Fields of a counterfactual.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CounterfactualDetails {
    pub factual_scenario: BTreeMap<String, f64>,
    pub counterfactual_scenario: BTreeMap<String, f64>,
    pub outcome_variable: String,
    /// Rows matching the factual scenario (whole table on fallback).
    pub matched_rows: usize,
    pub factual_outcome: f64,
    pub counterfactual_outcome: f64,
    pub counterfactual_effect: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evidence_variables: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_shape() {
        let value = QueryResult::failure("unknown", "Unknown query type: x").to_value();
        assert_eq!(value["success"], false);
        assert_eq!(value["query_type"], "unknown");
        assert_eq!(value["error"], "Unknown query type: x");
        assert!(value.get("summary").is_none());
    }

    #[test]
    fn test_details_are_flattened() {
        let details = QueryDetails::Intervention(InterventionDetails {
            intervention_variable: "T".to_string(),
            intervention_value: 1.0,
            intervention_effects: BTreeMap::from([(
                "Y".to_string(),
                InterventionEffect {
                    original_value: 1.0,
                    intervened_value: 1.5,
                    effect: 0.5,
                },
            )]),
            constraints: None,
        });
        let value = QueryResult::success("intervention", details, "ok").to_value();
        assert_eq!(value["success"], true);
        assert_eq!(value["intervention_variable"], "T");
        assert_eq!(value["intervention_effects"]["Y"]["effect"], 0.5);
        assert_eq!(value["summary"], "ok");
        assert!(value.get("error").is_none());
    }
}
