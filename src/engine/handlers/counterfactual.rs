//! `counterfactual`: match rows to the factual scenario, then adjust the
//! outcome along each changed variable's correlation.

use crate::error::CausalResult;
use crate::model::CausalModel;
use crate::query::{CounterfactualDetails, CounterfactualQuery, QueryDetails, QueryKind, QueryResult};
use crate::stats::{correlation, mean, or_zero, std_dev};

pub(crate) fn handle(query: &CounterfactualQuery, model: &CausalModel) -> CausalResult<QueryResult> {
    let data = model.require_data()?;
    let outcome = data.require_column(&query.outcome_variable)?;

    // Filters narrow successively; each uses the spread of the rows kept so far.
    let mut matched = data.clone();
    for (name, value) in &query.factual_scenario {
        let Some(values) = matched.column(name) else {
            continue;
        };
        let spread = std_dev(values);
        let keep: Vec<bool> = values.iter().map(|v| (v - value).abs() <= spread).collect();
        matched = matched.filter_rows(&keep);
    }
    if matched.is_empty() {
        matched = data.clone();
    }
    let matched_rows = matched.n_rows();
    let factual_outcome = or_zero(mean(matched.require_column(&query.outcome_variable)?));

    let mut adjustment = 0.0;
    for (name, cf_value) in &query.counterfactual_scenario {
        let (Some(values), Some(factual_value)) = (data.column(name), query.factual_scenario.get(name)) else {
            continue;
        };
        let corr = correlation(values, outcome);
        if corr.is_finite() {
            adjustment += (cf_value - factual_value) * corr;
        }
    }

    let counterfactual_outcome = factual_outcome + adjustment;
    let counterfactual_effect = counterfactual_outcome - factual_outcome;
    let summary = format!(
        "Counterfactual effect on {}: {counterfactual_effect:.4}",
        query.outcome_variable
    );

    Ok(QueryResult::success(
        QueryKind::Counterfactual.as_str(),
        QueryDetails::Counterfactual(CounterfactualDetails {
            factual_scenario: query.factual_scenario.clone(),
            counterfactual_scenario: query.counterfactual_scenario.clone(),
            outcome_variable: query.outcome_variable.clone(),
            matched_rows,
            factual_outcome,
            counterfactual_outcome,
            counterfactual_effect,
            evidence_variables: query.evidence_variables.clone(),
        }),
        summary,
    ))
}
