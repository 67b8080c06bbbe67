//! Regression adjustment.

use tracing::debug;

use crate::error::EstimationError;
use crate::stats::least_squares;
use crate::table::DataTable;

use super::{estimand_columns, EffectEstimator, IdentifiedEstimand, LINEAR_REGRESSION};

/// OLS of the outcome on `[1, treatment, adjustment set]`; the treatment
/// coefficient is the estimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearRegressionEstimator;

impl EffectEstimator for LinearRegressionEstimator {
    fn method_name(&self) -> &str {
        LINEAR_REGRESSION
    }

    fn estimate(&self, estimand: &IdentifiedEstimand, table: &DataTable) -> Result<f64, EstimationError> {
        let (outcome, treatment, adjustment) = estimand_columns(estimand, table, LINEAR_REGRESSION)?;

        let mut regressors = Vec::with_capacity(adjustment.len() + 1);
        regressors.push(treatment);
        regressors.extend(adjustment);

        let coefficients = least_squares(&regressors, outcome).ok_or_else(|| EstimationError::SingularMatrix {
            method: LINEAR_REGRESSION.to_string(),
        })?;

        debug!(coefficients = ?coefficients, "fitted outcome regression");
        Ok(coefficients[1])
    }
}
