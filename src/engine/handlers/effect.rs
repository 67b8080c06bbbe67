//! `effect_estimation`: identify once, then try every configured method.

use tracing::{info, warn};

use crate::error::CausalResult;
use crate::estimation::{heuristic_interval, EffectEstimator, EstimationConfig};
use crate::model::CausalModel;
use crate::query::{
    EffectEstimationDetails, EffectEstimationQuery, EffectFailureDetails, MethodEstimate, QueryDetails,
    QueryKind, QueryResult, HEURISTIC_INTERVAL_KIND,
};

pub(crate) fn handle(
    query: &EffectEstimationQuery,
    model: &CausalModel,
    estimators: &[Box<dyn EffectEstimator>],
    config: &EstimationConfig,
) -> CausalResult<QueryResult> {
    let kind = QueryKind::EffectEstimation;
    let treatment = query.treatment_variable.as_str();
    let outcome = query.outcome_variable.as_str();

    let estimand = model.identify_effect(treatment, outcome, &query.confounders)?;

    let estimates: Vec<MethodEstimate> = estimators
        .iter()
        .map(|estimator| {
            let method = estimator.method_name().to_string();
            match model.estimate_effect(&estimand, estimator.as_ref()) {
                Ok(estimate) => MethodEstimate {
                    method,
                    estimate: Some(estimate),
                    confidence_interval: Some(heuristic_interval(
                        estimate,
                        config.interval_z,
                        config.interval_relative_width,
                    )),
                    error: None,
                },
                Err(e) => {
                    warn!(method = %method, error = %e, "estimation method failed");
                    MethodEstimate {
                        method,
                        estimate: None,
                        confidence_interval: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        })
        .collect();

    let primary = estimates
        .iter()
        .find_map(|e| Some((e.estimate?, e.confidence_interval?)));

    let Some((estimate, interval)) = primary else {
        return Ok(QueryResult::failure(kind.as_str(), "All estimation methods failed").with_details(
            QueryDetails::EffectFailure(EffectFailureDetails {
                failed_estimates: estimates,
            }),
        ));
    };

    info!(treatment, outcome, estimate, "effect estimated");
    let summary = format!("Estimated causal effect of {treatment} on {outcome}: {estimate:.4}");
    Ok(QueryResult::success(
        kind.as_str(),
        QueryDetails::EffectEstimation(EffectEstimationDetails {
            treatment_variable: treatment.to_string(),
            outcome_variable: outcome.to_string(),
            treatment_value: query.treatment_value,
            estimate,
            confidence_interval: interval,
            interval_kind: HEURISTIC_INTERVAL_KIND.to_string(),
            adjustment_set: estimand.adjustment_set,
            all_estimates: estimates,
        }),
        summary,
    ))
}
