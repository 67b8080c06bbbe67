//! `intervention`: shift each outcome mean along its correlation with the
//! intervened variable.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::CausalResult;
use crate::model::CausalModel;
use crate::query::{
    InterventionDetails, InterventionEffect, InterventionQuery, QueryDetails, QueryKind, QueryResult,
};
use crate::stats::{correlation, mean, or_zero};

pub(crate) fn handle(query: &InterventionQuery, model: &CausalModel) -> CausalResult<QueryResult> {
    let data = model.require_data()?;
    let intervened = data.column(&query.intervention_variable);
    if intervened.is_none() {
        debug!(variable = %query.intervention_variable, "intervention variable absent; effects are zero");
    }

    let mut intervention_effects = BTreeMap::new();
    for outcome in &query.outcome_variables {
        let Some(values) = data.column(outcome) else {
            continue;
        };
        let original_value = or_zero(mean(values));
        let effect = intervened.map_or(0.0, |x| {
            let corr = correlation(x, values);
            if corr.is_nan() {
                0.0
            } else {
                or_zero((query.intervention_value - or_zero(mean(x))) * corr)
            }
        });
        intervention_effects.insert(
            outcome.clone(),
            InterventionEffect {
                original_value,
                intervened_value: original_value + effect,
                effect,
            },
        );
    }

    let summary = format!(
        "Intervening on {} to {} affects {} outcomes",
        query.intervention_variable,
        query.intervention_value,
        intervention_effects.len()
    );
    Ok(QueryResult::success(
        QueryKind::Intervention.as_str(),
        QueryDetails::Intervention(InterventionDetails {
            intervention_variable: query.intervention_variable.clone(),
            intervention_value: query.intervention_value,
            intervention_effects,
            constraints: query.constraints.clone(),
        }),
        summary,
    ))
}
