//! Query validation.
//!
//! Serde guarantees shape; these checks cover what it cannot: blank
//! variable names and non-finite numbers in queries built in code.

use crate::error::QueryError;

use super::{
    AnomalyAttributionQuery, CounterfactualQuery, DistributionShiftQuery, EffectEstimationQuery,
    InterventionQuery, Query, QueryKind,
};

/// Upper bound on names listed in one query.
pub const MAX_LISTED_VARIABLES: usize = 1024;

fn invalid(kind: QueryKind, reason: impl Into<String>) -> QueryError {
    QueryError::InvalidPayload {
        query_type: kind.to_string(),
        reason: reason.into(),
    }
}

fn validate_name(kind: QueryKind, field: &str, value: &str) -> Result<(), QueryError> {
    if value.trim().is_empty() {
        return Err(invalid(kind, format!("'{field}' must not be empty")));
    }
    Ok(())
}

fn validate_names(kind: QueryKind, field: &str, values: &[String]) -> Result<(), QueryError> {
    if values.len() > MAX_LISTED_VARIABLES {
        return Err(invalid(
            kind,
            format!("'{field}' lists more than {MAX_LISTED_VARIABLES} variables"),
        ));
    }
    values.iter().try_for_each(|v| validate_name(kind, field, v))
}

fn validate_finite(kind: QueryKind, field: &str, value: f64) -> Result<(), QueryError> {
    if !value.is_finite() {
        return Err(invalid(kind, format!("'{field}' must be a finite number")));
    }
    Ok(())
}

impl EffectEstimationQuery {
    /// Validate payload.
    pub fn validate(&self) -> Result<(), QueryError> {
        let kind = QueryKind::EffectEstimation;
        validate_name(kind, "treatment_variable", &self.treatment_variable)?;
        validate_name(kind, "outcome_variable", &self.outcome_variable)?;
        validate_names(kind, "confounders", &self.confounders)?;
        if let Some(v) = self.treatment_value {
            validate_finite(kind, "treatment_value", v)?;
        }
        Ok(())
    }
}

impl AnomalyAttributionQuery {
    /// Validate payload.
    pub fn validate(&self) -> Result<(), QueryError> {
        let kind = QueryKind::AnomalyAttribution;
        validate_name(kind, "outcome_variable", &self.outcome_variable)?;
        validate_finite(kind, "anomaly_threshold", self.anomaly_threshold)?;
        validate_names(kind, "potential_causes", &self.potential_causes)
    }
}

impl DistributionShiftQuery {
    /// Validate payload.
    pub fn validate(&self) -> Result<(), QueryError> {
        let kind = QueryKind::DistributionShiftAttribution;
        validate_name(kind, "target_variable", &self.target_variable)?;
        validate_names(kind, "potential_drivers", &self.potential_drivers)
    }
}

impl InterventionQuery {
    /// Validate payload.
    pub fn validate(&self) -> Result<(), QueryError> {
        let kind = QueryKind::Intervention;
        validate_name(kind, "intervention_variable", &self.intervention_variable)?;
        validate_finite(kind, "intervention_value", self.intervention_value)?;
        validate_names(kind, "outcome_variables", &self.outcome_variables)
    }
}

impl CounterfactualQuery {
    /// Validate payload.
    pub fn validate(&self) -> Result<(), QueryError> {
        let kind = QueryKind::Counterfactual;
        validate_name(kind, "outcome_variable", &self.outcome_variable)?;
        for (field, scenario) in [
            ("factual_scenario", &self.factual_scenario),
            ("counterfactual_scenario", &self.counterfactual_scenario),
        ] {
            if scenario.len() > MAX_LISTED_VARIABLES {
                return Err(invalid(
                    kind,
                    format!("'{field}' lists more than {MAX_LISTED_VARIABLES} variables"),
                ));
            }
            for (name, value) in scenario {
                validate_name(kind, field, name)?;
                validate_finite(kind, &format!("{field}.{name}"), *value)?;
            }
        }
        validate_names(kind, "evidence_variables", &self.evidence_variables)
    }
}

impl Query {
    /// Validate the payload of any query kind.
    pub fn validate(&self) -> Result<(), QueryError> {
        match self {
            Self::EffectEstimation(q) => q.validate(),
            Self::AnomalyAttribution(q) => q.validate(),
            Self::DistributionShiftAttribution(q) => q.validate(),
            Self::Intervention(q) => q.validate(),
            Self::Counterfactual(q) => q.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_blank_names_rejected() {
        let q = EffectEstimationQuery {
            treatment_variable: "  ".to_string(),
            outcome_variable: "Y".to_string(),
            confounders: vec![],
            treatment_value: None,
        };
        assert!(matches!(q.validate(), Err(QueryError::InvalidPayload { .. })));

        let q = DistributionShiftQuery {
            target_variable: "Y".to_string(),
            baseline_period: serde_json::Value::Null,
            comparison_period: serde_json::Value::Null,
            potential_drivers: vec![String::new()],
        };
        assert!(q.validate().is_err());
    }

    #[test]
    fn test_non_finite_numbers_rejected() {
        let q = AnomalyAttributionQuery {
            outcome_variable: "Y".to_string(),
            anomaly_threshold: f64::NAN,
            potential_causes: vec![],
            time_window: None,
        };
        assert!(q.validate().is_err());

        let q = InterventionQuery {
            intervention_variable: "T".to_string(),
            intervention_value: f64::INFINITY,
            outcome_variables: vec!["Y".to_string()],
            constraints: None,
        };
        assert!(q.validate().is_err());

        let q = CounterfactualQuery {
            factual_scenario: BTreeMap::from([("T".to_string(), f64::NAN)]),
            counterfactual_scenario: BTreeMap::new(),
            outcome_variable: "Y".to_string(),
            evidence_variables: vec![],
        };
        let err = q.validate().unwrap_err();
        assert!(format!("{err}").contains("factual_scenario.T"));
    }

    #[test]
    fn test_valid_query_passes() {
        let q = Query::Counterfactual(CounterfactualQuery {
            factual_scenario: BTreeMap::from([("T".to_string(), 0.0)]),
            counterfactual_scenario: BTreeMap::from([("T".to_string(), 1.0)]),
            outcome_variable: "Y".to_string(),
            evidence_variables: vec!["X".to_string()],
        });
        q.validate().unwrap();
    }
}
