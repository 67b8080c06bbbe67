//! Graph model: configuration parsing, DAG construction and role queries.

mod config;
mod dag;
mod templates;

pub use config::{EdgeSpec, GraphConfig, VariableSet, VariableSpec, VariableType};
pub use dag::CausalGraph;

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CausalResult;

/// Causal role of a variable within a study design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Exposure under study.
    Treatment,
    /// Response under study.
    Outcome,
    /// Common cause of treatment and outcome.
    Confounder,
    /// On the treatment → outcome path.
    Mediator,
    /// Affects the outcome only through the treatment.
    Instrument,
    /// Common effect of treatment and outcome.
    Collider,
    /// Not named by any role field.
    Unknown,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Treatment => "treatment",
            Self::Outcome => "outcome",
            Self::Confounder => "confounder",
            Self::Mediator => "mediator",
            Self::Instrument => "instrument",
            Self::Collider => "collider",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Loads a graph configuration file and builds the DAG in one step.
pub fn load(path: impl AsRef<Path>) -> CausalResult<CausalGraph> {
    let config = GraphConfig::from_path(path)?;
    Ok(CausalGraph::build(config)?)
}

/// Builds a DAG from an in-memory JSON document.
pub fn load_value(value: serde_json::Value) -> CausalResult<CausalGraph> {
    let config = GraphConfig::from_value(value)?;
    Ok(CausalGraph::build(config)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::error::{CausalError, ConfigError, GraphError};

    #[test]
    fn test_load_value_builds_in_declaration_order() {
        let graph = load_value(json!({
            "variables": {
                "zeta": {"type": "continuous"},
                "alpha": {"type": "binary"}
            },
            "edges": [{"from": "zeta", "to": "alpha"}],
            "treatment_variable": "zeta"
        }))
        .unwrap();
        assert_eq!(graph.variables().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(graph.children("zeta"), ["alpha"]);
        assert_eq!(graph.role_of("zeta"), Role::Treatment);
    }

    #[test]
    fn test_load_value_missing_edges() {
        let err = load_value(json!({"variables": {"x": {"type": "continuous"}}})).unwrap_err();
        assert!(err.is_config());
        assert!(matches!(err, CausalError::Config(ConfigError::MissingField { ref field }) if field == "edges"));
    }

    #[test]
    fn test_load_value_cycle_is_graph_error() {
        let err = load_value(json!({
            "variables": {"a": {}, "b": {}},
            "edges": [{"from": "a", "to": "b"}, {"from": "b", "to": "a"}]
        }))
        .unwrap_err();
        assert!(matches!(err, CausalError::Graph(GraphError::CyclicGraph { .. })));
    }
}
