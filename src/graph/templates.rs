//! Ready-made graph configurations for common study designs.

use super::config::{GraphConfig, VariableSpec, VariableType};

impl GraphConfig {
    /// Confounded treatment/outcome design.
    ///
    /// Every confounder causes both the (binary) treatment and the
    /// (continuous) outcome, and the treatment causes the outcome.
    #[must_use]
    pub fn simple_treatment_outcome(treatment: &str, outcome: &str, confounders: &[&str]) -> Self {
        let mut config = Self::new()
            .with_variable(
                treatment,
                VariableSpec::new(VariableType::Binary).with_description("Treatment assignment"),
            )
            .with_variable(
                outcome,
                VariableSpec::new(VariableType::Continuous).with_description("Outcome variable"),
            );
        config.name = Some("simple_treatment_outcome_dag".to_string());
        config.description = Some("Simple DAG for treatment effect analysis".to_string());

        for (i, conf) in confounders.iter().enumerate() {
            config.variables.insert(
                *conf,
                VariableSpec::new(VariableType::Continuous)
                    .with_description(format!("Confounder variable {}", i + 1)),
            );
        }
        for conf in confounders {
            config = config.with_edge(*conf, treatment).with_edge(*conf, outcome);
        }

        config
            .with_edge(treatment, outcome)
            .with_treatment_outcome(treatment, outcome)
            .with_confounders(confounders.iter().copied())
    }

    /// Mediation design: `X → T → M → Y` with a direct `T → Y` path and
    /// confounders feeding treatment, mediator and outcome.
    #[must_use]
    pub fn mediation(treatment: &str, mediator: &str, outcome: &str, confounders: &[&str]) -> Self {
        let mut config = Self::new()
            .with_variable(treatment, VariableSpec::new(VariableType::Binary))
            .with_variable(mediator, VariableSpec::new(VariableType::Continuous))
            .with_variable(outcome, VariableSpec::new(VariableType::Continuous));
        config.name = Some("mediation_dag".to_string());

        for conf in confounders {
            config.variables.insert(*conf, VariableSpec::new(VariableType::Continuous));
        }
        for conf in confounders {
            config = config
                .with_edge(*conf, treatment)
                .with_edge(*conf, mediator)
                .with_edge(*conf, outcome);
        }

        let mut config = config
            .with_edge(treatment, mediator)
            .with_edge(mediator, outcome)
            .with_edge(treatment, outcome)
            .with_treatment_outcome(treatment, outcome)
            .with_confounders(confounders.iter().copied());
        config.mediators = vec![mediator.to_string()];
        config
    }
}
