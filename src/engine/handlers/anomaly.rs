//! `anomaly_attribution`: compare candidate causes on anomalous vs normal rows.

use std::collections::BTreeMap;

use crate::error::CausalResult;
use crate::model::CausalModel;
use crate::query::{
    AnomalyAttributionDetails, AnomalyAttributionQuery, AttributionScore, QueryDetails, QueryKind,
    QueryResult,
};
use crate::stats::{correlation, mean, or_zero};

use super::{arg_max_abs, masked};

pub(crate) fn handle(query: &AnomalyAttributionQuery, model: &CausalModel) -> CausalResult<QueryResult> {
    let data = model.require_data()?;
    let outcome = data.require_column(&query.outcome_variable)?;
    let threshold = query.anomaly_threshold;

    let anomalous: Vec<bool> = outcome.iter().map(|v| *v > threshold).collect();
    let anomalies_found = anomalous.iter().filter(|a| **a).count();

    let mut details = AnomalyAttributionDetails {
        outcome_variable: query.outcome_variable.clone(),
        anomaly_threshold: threshold,
        anomalies_found,
        attribution_scores: BTreeMap::new(),
        time_window: query.time_window.clone(),
    };

    if anomalies_found == 0 {
        let summary = format!("No anomalies found above threshold {threshold}");
        return Ok(QueryResult::success(
            QueryKind::AnomalyAttribution.as_str(),
            QueryDetails::AnomalyAttribution(details),
            summary,
        ));
    }

    let normal: Vec<bool> = anomalous.iter().map(|a| !a).collect();
    for cause in &query.potential_causes {
        let Some(values) = data.column(cause) else {
            continue;
        };
        let normal_mean = mean(&masked(values, &normal));
        let anomaly_mean = mean(&masked(values, &anomalous));
        details.attribution_scores.insert(
            cause.clone(),
            AttributionScore {
                correlation: or_zero(correlation(values, outcome)),
                normal_mean: or_zero(normal_mean),
                anomaly_mean: or_zero(anomaly_mean),
                difference: or_zero(anomaly_mean - normal_mean),
            },
        );
    }

    let top = arg_max_abs(&details.attribution_scores, |s| s.correlation)
        .unwrap_or("none (no candidate causes in data)")
        .to_string();
    let summary = format!(
        "Found {anomalies_found} anomalies in {}. Top contributor: {top}",
        query.outcome_variable
    );
    Ok(QueryResult::success(
        QueryKind::AnomalyAttribution.as_str(),
        QueryDetails::AnomalyAttribution(details),
        summary,
    ))
}
