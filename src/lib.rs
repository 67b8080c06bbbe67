//! # causal-lab - Synthetic causal data and causal query dispatch
//!
//! causal-lab builds synthetic datasets whose dependence structure follows
//! a declared causal DAG, then answers causal questions about a dataset by
//! dispatching to independent estimation algorithms.
//!
//! ## Core Concepts
//!
//! - **CausalGraph**: A validated DAG with variable types and causal roles
//! - **SyntheticGenerator**: Seeded simulation of a table from a graph, with a known treatment effect
//! - **CausalModel**: A graph bound to a dataset; identifies and estimates effects
//! - **QueryEngine**: Routes tagged queries to fail-soft handlers that always return a `QueryResult`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use causal_lab::{CausalGraph, CausalModel, GraphConfig, QueryEngine, SimulationParameters, SyntheticGenerator};
//! use serde_json::json;
//!
//! let graph = CausalGraph::build(GraphConfig::simple_treatment_outcome("T", "Y", &["X"]))?;
//! let params = SimulationParameters::default().with_treatment_effect(1.5);
//! let table = SyntheticGenerator::new(&graph, 42).generate(&params)?;
//!
//! let model = CausalModel::with_data(graph, table)?;
//! let result = QueryEngine::default().dispatch_value(
//!     &json!({"query_type": "effect_estimation", "treatment_variable": "T", "outcome_variable": "Y"}),
//!     &model,
//! );
//! println!("{}", result.to_json_pretty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core model
pub mod error;
pub mod graph;
pub mod stats;
pub mod table;

// Generation and estimation
pub mod estimation;
pub mod model;
pub mod synth;

// Queries
pub mod engine;
pub mod query;

// Ambient
pub mod config;
pub mod logging;

// Re-export primary types at crate root for convenience
pub use config::Settings;
pub use engine::QueryEngine;
pub use error::{CausalError, CausalResult, ConfigError, DataError, EstimationError, GraphError, QueryError};
pub use estimation::{
    EffectEstimator, EstimationConfig, IdentifiedEstimand, LinearRegressionEstimator,
    PropensityStratificationEstimator,
};
pub use graph::{CausalGraph, GraphConfig, Role, VariableType};
pub use logging::LoggingConfig;
pub use model::{CausalModel, DatasetReport};
pub use query::{Query, QueryKind, QueryResult};
pub use synth::{SimulationParameters, SyntheticGenerator};
pub use table::DataTable;
