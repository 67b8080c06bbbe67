//! `distribution_shift_attribution`.
//!
//! Windows are the first and second half of the rows in table order. The
//! period labels in the query are echoed, not interpreted.

use std::collections::BTreeMap;

use crate::error::CausalResult;
use crate::model::CausalModel;
use crate::query::{
    DistributionShiftDetails, DistributionShiftQuery, DriverContribution, QueryDetails, QueryKind,
    QueryResult, ROW_ORDER_WINDOWING,
};
use crate::stats::{correlation, mean, or_zero};

use super::arg_max_abs;

pub(crate) fn handle(query: &DistributionShiftQuery, model: &CausalModel) -> CausalResult<QueryResult> {
    let data = model.require_data()?;
    let target = data.require_column(&query.target_variable)?;
    let split = data.n_rows() / 2;
    let baseline = data.slice_rows(0..split);
    let comparison = data.slice_rows(split..data.n_rows());

    let baseline_mean = or_zero(mean(baseline.require_column(&query.target_variable)?));
    let comparison_mean = or_zero(mean(comparison.require_column(&query.target_variable)?));
    let shift_magnitude = comparison_mean - baseline_mean;

    let mut driver_contributions = BTreeMap::new();
    for driver in &query.potential_drivers {
        let Some(values) = data.column(driver) else {
            continue;
        };
        let before = or_zero(mean(baseline.require_column(driver)?));
        let after = or_zero(mean(comparison.require_column(driver)?));
        let shift = after - before;
        let corr = or_zero(correlation(values, target));
        driver_contributions.insert(
            driver.clone(),
            DriverContribution {
                baseline_mean: before,
                comparison_mean: after,
                shift,
                correlation_with_target: corr,
                estimated_contribution: or_zero(shift * corr),
            },
        );
    }

    let main = arg_max_abs(&driver_contributions, |d| d.estimated_contribution)
        .unwrap_or("none (no candidate drivers in data)")
        .to_string();
    let summary = format!(
        "Distribution shift of {shift_magnitude:.4} in {}. Main driver: {main}",
        query.target_variable
    );

    Ok(QueryResult::success(
        QueryKind::DistributionShiftAttribution.as_str(),
        QueryDetails::DistributionShift(DistributionShiftDetails {
            target_variable: query.target_variable.clone(),
            baseline_period: query.baseline_period.clone(),
            comparison_period: query.comparison_period.clone(),
            windowing: ROW_ORDER_WINDOWING.to_string(),
            baseline_rows: baseline.n_rows(),
            comparison_rows: comparison.n_rows(),
            baseline_mean,
            comparison_mean,
            shift_magnitude,
            driver_contributions,
        }),
        summary,
    ))
}
