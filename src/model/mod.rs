//! Causal model context: a graph bound to a dataset.

mod validation;

pub use validation::{validate_dataset, DatasetReport};

use tracing::{debug, info};

use crate::error::{CausalResult, DataError, EstimationError};
use crate::estimation::{identify_backdoor, EffectEstimator, IdentifiedEstimand};
use crate::graph::CausalGraph;
use crate::table::DataTable;

/// A [`CausalGraph`] with an optional attached table.
#[derive(Debug, Clone)]
pub struct CausalModel {
    graph: CausalGraph,
    data: Option<DataTable>,
}

impl CausalModel {
    /// Creates a model with no data attached.
    #[must_use]
    pub fn new(graph: CausalGraph) -> Self {
        Self { graph, data: None }
    }

    /// Creates a model and attaches `table` in one step.
    pub fn with_data(graph: CausalGraph, table: DataTable) -> CausalResult<Self> {
        let mut model = Self::new(graph);
        model.attach(table)?;
        Ok(model)
    }

    /// Attaches a table, replacing any previous one.
    ///
    /// Every declared variable needs a column; extra columns are allowed.
    pub fn attach(&mut self, table: DataTable) -> Result<(), DataError> {
        let mut missing: Vec<String> = self
            .graph
            .variables()
            .filter(|name| !table.has_column(name))
            .map(str::to_string)
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(DataError::MissingVariables { missing });
        }

        info!(
            n_rows = table.n_rows(),
            n_columns = table.n_columns(),
            "attached data to causal model"
        );
        self.data = Some(table);
        Ok(())
    }

    /// The graph.
    #[must_use]
    pub fn graph(&self) -> &CausalGraph {
        &self.graph
    }

    /// The attached table, if any.
    #[must_use]
    pub fn data(&self) -> Option<&DataTable> {
        self.data.as_ref()
    }

    /// The attached table, or [`DataError::NotAttached`].
    pub fn require_data(&self) -> Result<&DataTable, DataError> {
        self.data.as_ref().ok_or(DataError::NotAttached)
    }

    /// Declared treatment variable.
    #[must_use]
    pub fn treatment(&self) -> Option<&str> {
        self.graph.treatment()
    }

    /// Declared outcome variable.
    #[must_use]
    pub fn outcome(&self) -> Option<&str> {
        self.graph.outcome()
    }

    /// Declared confounders; `None` when the graph declares none.
    #[must_use]
    pub fn confounders(&self) -> Option<&[String]> {
        let confounders = self.graph.confounders();
        (!confounders.is_empty()).then_some(confounders)
    }

    /// Backdoor identification against the attached table.
    pub fn identify_effect(
        &self,
        treatment: &str,
        outcome: &str,
        extra_common_causes: &[String],
    ) -> Result<IdentifiedEstimand, EstimationError> {
        let table = self.data.as_ref().ok_or_else(|| EstimationError::NotIdentified {
            treatment: treatment.to_string(),
            outcome: outcome.to_string(),
            reason: DataError::NotAttached.to_string(),
        })?;
        identify_backdoor(&self.graph, table, treatment, outcome, extra_common_causes)
    }

    /// Runs one estimator against the attached table.
    pub fn estimate_effect(
        &self,
        estimand: &IdentifiedEstimand,
        estimator: &dyn EffectEstimator,
    ) -> Result<f64, EstimationError> {
        let table = self.data.as_ref().ok_or_else(|| EstimationError::InsufficientData {
            method: estimator.method_name().to_string(),
            reason: DataError::NotAttached.to_string(),
        })?;
        let estimate = estimator.estimate(estimand, table)?;
        if !estimate.is_finite() {
            return Err(EstimationError::InsufficientData {
                method: estimator.method_name().to_string(),
                reason: format!("estimate is not finite ({estimate})"),
            });
        }
        debug!(method = estimator.method_name(), estimate, "estimated effect");
        Ok(estimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::LinearRegressionEstimator;
    use crate::graph::GraphConfig;

    fn graph() -> CausalGraph {
        CausalGraph::build(GraphConfig::simple_treatment_outcome("T", "Y", &["X"])).unwrap()
    }

    #[test]
    fn test_attach_reports_sorted_missing_variables() {
        let table = DataTable::from_columns([("Y", vec![1.0])]).unwrap();
        let err = CausalModel::with_data(graph(), table).unwrap_err();
        assert!(err.is_missing_variables());
        assert!(format!("{err}").contains("T, X"));
    }

    #[test]
    fn test_accessors() {
        let model = CausalModel::new(graph());
        assert_eq!(model.treatment(), Some("T"));
        assert_eq!(model.outcome(), Some("Y"));
        assert_eq!(model.confounders(), Some(&["X".to_string()][..]));
        assert!(model.data().is_none());
        assert!(matches!(model.require_data(), Err(DataError::NotAttached)));

        let bare = CausalModel::new(CausalGraph::build(GraphConfig::new()).unwrap());
        assert!(bare.treatment().is_none());
        assert!(bare.confounders().is_none());
    }

    #[test]
    fn test_identify_without_data_fails_softly() {
        let model = CausalModel::new(graph());
        assert!(matches!(
            model.identify_effect("T", "Y", &[]),
            Err(EstimationError::NotIdentified { .. })
        ));
    }

    #[test]
    fn test_identify_and_estimate() {
        let x: Vec<f64> = (0..30).map(|i| f64::from(i % 4)).collect();
        let t: Vec<f64> = (0..30).map(|i| f64::from(i % 2)).collect();
        let y: Vec<f64> = t.iter().zip(&x).map(|(t, x)| 1.5 * t + x).collect();
        let table = DataTable::from_columns([("T", t), ("Y", y), ("X", x)]).unwrap();
        let model = CausalModel::with_data(graph(), table).unwrap();

        let estimand = model.identify_effect("T", "Y", &[]).unwrap();
        assert_eq!(estimand.adjustment_set, vec!["X"]);
        let estimate = model.estimate_effect(&estimand, &LinearRegressionEstimator).unwrap();
        assert!((estimate - 1.5).abs() < 1e-9);
    }
}
