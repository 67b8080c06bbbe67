//! Propensity score stratification.
//!
//! Rows are ranked by a fitted propensity `P(T = 1 | adjustment set)` and
//! cut into equal-count strata. Within each stratum the treated-minus-control
//! outcome difference is computed; strata too thin on either arm are
//! clipped. The estimate is the size-weighted average over kept strata.

use tracing::debug;

use crate::error::EstimationError;
use crate::stats::{linear_predictor, logistic_regression, mean};
use crate::table::DataTable;

use super::{estimand_columns, EffectEstimator, IdentifiedEstimand, PROPENSITY_SCORE_STRATIFICATION};

/// Stratified difference in means over a logistic propensity model.
#[derive(Debug, Clone, Copy)]
pub struct PropensityStratificationEstimator {
    num_strata: usize,
    clipping_threshold: usize,
}

impl PropensityStratificationEstimator {
    /// Creates an estimator. `num_strata` is raised to at least one.
    #[must_use]
    pub fn new(num_strata: usize, clipping_threshold: usize) -> Self {
        Self {
            num_strata: num_strata.max(1),
            clipping_threshold,
        }
    }

    fn insufficient(reason: impl Into<String>) -> EstimationError {
        EstimationError::InsufficientData {
            method: PROPENSITY_SCORE_STRATIFICATION.to_string(),
            reason: reason.into(),
        }
    }
}

impl Default for PropensityStratificationEstimator {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

impl EffectEstimator for PropensityStratificationEstimator {
    fn method_name(&self) -> &str {
        PROPENSITY_SCORE_STRATIFICATION
    }

    fn estimate(&self, estimand: &IdentifiedEstimand, table: &DataTable) -> Result<f64, EstimationError> {
        let (outcome, treatment, adjustment) =
            estimand_columns(estimand, table, PROPENSITY_SCORE_STRATIFICATION)?;

        if treatment.iter().any(|v| v.is_finite() && *v != 0.0 && *v != 1.0) {
            return Err(EstimationError::NonBinaryTreatment {
                variable: estimand.treatment.clone(),
                method: PROPENSITY_SCORE_STRATIFICATION.to_string(),
            });
        }

        let coefficients = logistic_regression(&adjustment, treatment)
            .ok_or_else(|| Self::insufficient("propensity model could not be fitted"))?;

        let mut rows: Vec<(f64, usize)> = (0..table.n_rows())
            .filter(|&r| {
                outcome[r].is_finite()
                    && treatment[r].is_finite()
                    && adjustment.iter().all(|col| col[r].is_finite())
            })
            .map(|r| (linear_predictor(&coefficients, &adjustment, r), r))
            .collect();
        if rows.is_empty() {
            return Err(Self::insufficient("no complete rows"));
        }
        // The logit is monotone in the propensity, so ranking on it is equivalent.
        rows.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let n = rows.len();
        let mut weighted = 0.0;
        let mut kept_rows = 0_usize;
        for k in 0..self.num_strata {
            let stratum = &rows[k * n / self.num_strata..(k + 1) * n / self.num_strata];
            let (treated, control): (Vec<f64>, Vec<f64>) = stratum
                .iter()
                .map(|(_, r)| (*r, outcome[*r]))
                .fold((Vec::new(), Vec::new()), |(mut t, mut c), (r, y)| {
                    if treatment[r] == 1.0 {
                        t.push(y);
                    } else {
                        c.push(y);
                    }
                    (t, c)
                });

            if treated.len() < self.clipping_threshold
                || control.len() < self.clipping_threshold
                || treated.is_empty()
                || control.is_empty()
            {
                debug!(stratum = k, treated = treated.len(), control = control.len(), "clipped stratum");
                continue;
            }

            weighted += (mean(&treated) - mean(&control)) * stratum.len() as f64;
            kept_rows += stratum.len();
        }

        if kept_rows == 0 {
            return Err(Self::insufficient(format!(
                "no stratum has at least {} treated and {} control rows",
                self.clipping_threshold, self.clipping_threshold
            )));
        }
        Ok(weighted / kept_rows as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimand(adjustment: &[&str]) -> IdentifiedEstimand {
        IdentifiedEstimand {
            treatment: "T".to_string(),
            outcome: "Y".to_string(),
            adjustment_set: adjustment.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn test_randomized_difference_in_means() {
        // Y = 2T + (i % 3), T alternating: every stratum has both arms.
        let t: Vec<f64> = (0..200).map(|i| f64::from(i % 2)).collect();
        let y: Vec<f64> = (0..200).map(|i| 2.0 * f64::from(i % 2) + f64::from((i / 2) % 3)).collect();
        let table = DataTable::from_columns([("T", t), ("Y", y)]).unwrap();

        let estimate = PropensityStratificationEstimator::default()
            .estimate(&estimand(&[]), &table)
            .unwrap();
        assert!((estimate - 2.0).abs() < 0.2, "estimate {estimate}");
    }

    #[test]
    fn test_non_binary_treatment_rejected() {
        let table = DataTable::from_columns([("T", vec![0.0, 1.0, 2.0]), ("Y", vec![1.0, 2.0, 3.0])]).unwrap();
        assert!(matches!(
            PropensityStratificationEstimator::default().estimate(&estimand(&[]), &table),
            Err(EstimationError::NonBinaryTreatment { .. })
        ));
    }

    #[test]
    fn test_all_strata_clipped() {
        let table = DataTable::from_columns([
            ("T", vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]),
            ("Y", vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]),
        ])
        .unwrap();
        assert!(matches!(
            PropensityStratificationEstimator::new(2, 10).estimate(&estimand(&[]), &table),
            Err(EstimationError::InsufficientData { .. })
        ));
    }
}
