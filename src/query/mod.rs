//! Causal query definitions.
//!
//! A [`Query`] is a tagged union keyed by `query_type`. External JSON goes
//! through [`Query::from_value`], which reports unknown tags separately
//! from malformed payloads and then runs [`Query::validate`].

mod result;
mod validation;

pub use result::{
    AnomalyAttributionDetails, AttributionScore, CounterfactualDetails, DistributionShiftDetails,
    DriverContribution, EffectEstimationDetails, EffectFailureDetails, InterventionDetails,
    InterventionEffect, MethodEstimate, QueryDetails, QueryResult, HEURISTIC_INTERVAL_KIND,
    ROW_ORDER_WINDOWING,
};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// All supported causal queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "query_type", rename_all = "snake_case")]
pub enum Query {
    /// Average effect of a treatment on an outcome.
    EffectEstimation(EffectEstimationQuery),

    /// Which variables move with outcome values above a threshold.
    AnomalyAttribution(AnomalyAttributionQuery),

    /// Which drivers explain a shift in a target's mean between two windows.
    DistributionShiftAttribution(DistributionShiftQuery),

    /// Outcome means after forcing a variable to a value.
    Intervention(InterventionQuery),

    /// Outcome under an alternative scenario, given an observed one.
    Counterfactual(CounterfactualQuery),
}

/// Payload for `effect_estimation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEstimationQuery {
    /// Exposure.
    pub treatment_variable: String,

    /// Response.
    pub outcome_variable: String,

    /// Common causes to adjust for in addition to those in the graph.
    #[serde(default)]
    pub confounders: Vec<String>,

    /// Treatment level of interest. Echoed in the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_value: Option<f64>,
}

/// Payload for `anomaly_attribution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyAttributionQuery {
    /// Variable whose large values are anomalies.
    pub outcome_variable: String,

    /// Rows with outcome strictly above this are anomalous.
    pub anomaly_threshold: f64,

    /// Candidate causes; names without a column are skipped.
    pub potential_causes: Vec<String>,

    /// Time window label. Echoed in the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<serde_json::Value>,
}

/// Payload for `distribution_shift_attribution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionShiftQuery {
    /// Variable whose mean shifted.
    pub target_variable: String,

    /// Baseline window label. Echoed in the result.
    pub baseline_period: serde_json::Value,

    /// Comparison window label. Echoed in the result.
    pub comparison_period: serde_json::Value,

    /// Candidate drivers; names without a column are skipped.
    pub potential_drivers: Vec<String>,
}

/// Payload for `intervention`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionQuery {
    /// Variable being set.
    pub intervention_variable: String,

    /// Value it is set to.
    pub intervention_value: f64,

    /// Outcomes to report; names without a column are skipped.
    pub outcome_variables: Vec<String>,

    /// Caller constraints. Echoed in the result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<serde_json::Value>,
}

/// Payload for `counterfactual`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterfactualQuery {
    /// Observed values.
    pub factual_scenario: BTreeMap<String, f64>,

    /// Alternative values.
    pub counterfactual_scenario: BTreeMap<String, f64>,

    /// Variable to report.
    pub outcome_variable: String,

    /// Variables the caller treats as evidence. Echoed in the result.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence_variables: Vec<String>,
}

/// Query kind without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// `effect_estimation`
    EffectEstimation,
    /// `anomaly_attribution`
    AnomalyAttribution,
    /// `distribution_shift_attribution`
    DistributionShiftAttribution,
    /// `intervention`
    Intervention,
    /// `counterfactual`
    Counterfactual,
}

impl QueryKind {
    /// Every kind, in declaration order.
    pub const ALL: [QueryKind; 5] = [
        Self::EffectEstimation,
        Self::AnomalyAttribution,
        Self::DistributionShiftAttribution,
        Self::Intervention,
        Self::Counterfactual,
    ];

    /// Wire tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EffectEstimation => "effect_estimation",
            Self::AnomalyAttribution => "anomaly_attribution",
            Self::DistributionShiftAttribution => "distribution_shift_attribution",
            Self::Intervention => "intervention",
            Self::Counterfactual => "counterfactual",
        }
    }

    /// Parses a wire tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == tag)
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Query {
    /// Kind of this query.
    #[must_use]
    pub const fn kind(&self) -> QueryKind {
        match self {
            Self::EffectEstimation(_) => QueryKind::EffectEstimation,
            Self::AnomalyAttribution(_) => QueryKind::AnomalyAttribution,
            Self::DistributionShiftAttribution(_) => QueryKind::DistributionShiftAttribution,
            Self::Intervention(_) => QueryKind::Intervention,
            Self::Counterfactual(_) => QueryKind::Counterfactual,
        }
    }

    /// Parses and validates an external JSON query.
    pub fn from_value(value: serde_json::Value) -> Result<Self, QueryError> {
        let tag = match value.get("query_type") {
            None | Some(serde_json::Value::Null) => return Err(QueryError::MissingQueryType),
            Some(serde_json::Value::String(tag)) => tag.clone(),
            Some(other) => other.to_string(),
        };
        let Some(kind) = QueryKind::from_tag(&tag) else {
            return Err(QueryError::UnknownQueryType { tag });
        };

        let query: Self = serde_json::from_value(value).map_err(|e| QueryError::InvalidPayload {
            query_type: kind.to_string(),
            reason: e.to_string(),
        })?;
        query.validate()?;
        Ok(query)
    }

    /// Parses and validates JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, QueryError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| QueryError::InvalidPayload {
                query_type: "unknown".to_string(),
                reason: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Serializes to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, QueryError> {
        serde_json::to_string_pretty(self).map_err(|e| QueryError::InvalidPayload {
            query_type: self.kind().to_string(),
            reason: format!("serialize query: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_each_kind() {
        let docs = [
            json!({"query_type": "effect_estimation", "treatment_variable": "T", "outcome_variable": "Y", "confounders": ["X"]}),
            json!({"query_type": "anomaly_attribution", "outcome_variable": "Y", "anomaly_threshold": 2.5, "potential_causes": ["X"]}),
            json!({"query_type": "distribution_shift_attribution", "target_variable": "Y", "baseline_period": "2024-Q1", "comparison_period": "2024-Q2", "potential_drivers": ["X"]}),
            json!({"query_type": "intervention", "intervention_variable": "T", "intervention_value": 1, "outcome_variables": ["Y"]}),
            json!({"query_type": "counterfactual", "factual_scenario": {"T": 0}, "counterfactual_scenario": {"T": 1}, "outcome_variable": "Y"}),
        ];
        for (doc, kind) in docs.into_iter().zip(QueryKind::ALL) {
            let query = Query::from_value(doc).unwrap();
            assert_eq!(query.kind(), kind);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = Query::from_value(json!({"query_type": "not_a_real_type"})).unwrap_err();
        assert!(matches!(err, QueryError::UnknownQueryType { ref tag } if tag == "not_a_real_type"));
    }

    #[test]
    fn test_missing_tag() {
        let err = Query::from_value(json!({"outcome_variable": "Y"})).unwrap_err();
        assert!(matches!(err, QueryError::MissingQueryType));
    }

    #[test]
    fn test_missing_field_is_invalid_payload() {
        let err = Query::from_value(json!({"query_type": "anomaly_attribution", "outcome_variable": "Y"}))
            .unwrap_err();
        assert!(matches!(
            err,
            QueryError::InvalidPayload { ref query_type, .. } if query_type == "anomaly_attribution"
        ));
    }

    #[test]
    fn test_optional_fields_default() {
        let query = Query::from_value(json!({
            "query_type": "effect_estimation",
            "treatment_variable": "T",
            "outcome_variable": "Y"
        }))
        .unwrap();
        let Query::EffectEstimation(payload) = query else {
            panic!("wrong kind");
        };
        assert!(payload.confounders.is_empty());
        assert!(payload.treatment_value.is_none());
    }

    #[test]
    fn test_serialized_query_carries_tag() {
        let query = Query::Intervention(InterventionQuery {
            intervention_variable: "T".to_string(),
            intervention_value: 1.0,
            outcome_variables: vec!["Y".to_string()],
            constraints: None,
        });
        let json = query.to_json_pretty().unwrap();
        assert!(json.contains("\"query_type\": \"intervention\""));
        assert_eq!(Query::from_json_str(&json).unwrap(), query);
    }
}
