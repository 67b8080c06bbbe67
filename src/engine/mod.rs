//! Query dispatch.
//!
//! [`QueryEngine`] routes each [`Query`] variant to its handler. Handlers
//! are fail-soft: an error or a panic inside one becomes a failed
//! [`QueryResult`] and never escapes [`QueryEngine::dispatch`].

mod handlers;

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

use tracing::{info, warn};

use crate::error::{CausalResult, ConfigError, QueryError};
use crate::estimation::{EffectEstimator, EstimationConfig, LinearRegressionEstimator, PropensityStratificationEstimator};
use crate::graph;
use crate::model::CausalModel;
use crate::query::{Query, QueryResult};
use crate::table::DataTable;

/// `query_type` reported when the tag itself is missing.
pub const UNKNOWN_QUERY_TYPE: &str = "unknown";

/// Dispatches causal queries against a [`CausalModel`].
///
/// Immutable after construction; one engine can serve many models and
/// threads.
pub struct QueryEngine {
    config: EstimationConfig,
    estimators: Vec<Box<dyn EffectEstimator>>,
}

impl QueryEngine {
    /// Creates an engine running the estimators named in `config`.
    pub fn new(config: EstimationConfig) -> Result<Self, ConfigError> {
        let estimators = config.build_estimators()?;
        Ok(Self { config, estimators })
    }

    /// Creates an engine with caller-supplied estimators.
    ///
    /// `config` still supplies the interval settings; its `methods` list is
    /// ignored.
    #[must_use]
    pub fn with_estimators(config: EstimationConfig, estimators: Vec<Box<dyn EffectEstimator>>) -> Self {
        Self { config, estimators }
    }

    /// Estimation settings.
    #[must_use]
    pub fn config(&self) -> &EstimationConfig {
        &self.config
    }

    /// Method names in the order they run.
    pub fn methods(&self) -> impl Iterator<Item = &str> + '_ {
        self.estimators.iter().map(|e| e.method_name())
    }

    /// Answers a typed query.
    #[must_use]
    pub fn dispatch(&self, query: &Query, model: &CausalModel) -> QueryResult {
        let kind = query.kind();
        if let Err(e) = query.validate() {
            warn!(query_type = %kind, error = %e, "rejected invalid query");
            return QueryResult::failure(kind.as_str(), e.to_string());
        }

        info!(query_type = %kind, "dispatching query");
        let outcome = catch_unwind(AssertUnwindSafe(|| self.route(query, model)));
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                warn!(query_type = %kind, error = %e, "query failed");
                QueryResult::failure(kind.as_str(), e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(query_type = %kind, panic = %message, "query handler panicked");
                QueryResult::failure(kind.as_str(), format!("Internal error: {message}"))
            }
        }
    }

    /// Answers an external JSON query.
    ///
    /// Unknown tags and malformed payloads become failed results.
    #[must_use]
    pub fn dispatch_value(&self, query: &serde_json::Value, model: &CausalModel) -> QueryResult {
        match Query::from_value(query.clone()) {
            Ok(query) => self.dispatch(&query, model),
            Err(e) => parse_failure(&e),
        }
    }

    /// Loads the graph and table from disk, then answers `query`.
    ///
    /// Loading errors become failed results.
    #[must_use]
    pub fn dispatch_files(
        &self,
        query: &serde_json::Value,
        graph_path: impl AsRef<Path>,
        data_path: impl AsRef<Path>,
    ) -> QueryResult {
        let parsed = match Query::from_value(query.clone()) {
            Ok(parsed) => parsed,
            Err(e) => return parse_failure(&e),
        };
        match load_model(graph_path.as_ref(), data_path.as_ref()) {
            Ok(model) => self.dispatch(&parsed, &model),
            Err(e) => {
                warn!(error = %e, "failed to load model for query");
                QueryResult::failure(parsed.kind().as_str(), e.to_string())
            }
        }
    }

    fn route(&self, query: &Query, model: &CausalModel) -> CausalResult<QueryResult> {
        match query {
            Query::EffectEstimation(q) => handlers::effect::handle(q, model, &self.estimators, &self.config),
            Query::AnomalyAttribution(q) => handlers::anomaly::handle(q, model),
            Query::DistributionShiftAttribution(q) => handlers::shift::handle(q, model),
            Query::Intervention(q) => handlers::intervention::handle(q, model),
            Query::Counterfactual(q) => handlers::counterfactual::handle(q, model),
        }
    }
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::with_estimators(
            EstimationConfig::default(),
            vec![
                Box::new(LinearRegressionEstimator),
                Box::new(PropensityStratificationEstimator::default()),
            ],
        )
    }
}

impl fmt::Debug for QueryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryEngine")
            .field("config", &self.config)
            .field("methods", &self.methods().collect::<Vec<_>>())
            .finish()
    }
}

/// Loads a graph file and a delimited data file into a model.
pub fn load_model(graph_path: &Path, data_path: &Path) -> CausalResult<CausalModel> {
    let graph = graph::load(graph_path)?;
    let table = DataTable::read_csv(data_path)?;
    CausalModel::with_data(graph, table)
}

fn parse_failure(err: &QueryError) -> QueryResult {
    let query_type = match err {
        QueryError::UnknownQueryType { tag } => tag.clone(),
        QueryError::InvalidPayload { query_type, .. } => query_type.clone(),
        QueryError::MissingQueryType => UNKNOWN_QUERY_TYPE.to_string(),
    };
    warn!(query_type = %query_type, error = %err, "rejected query");
    QueryResult::failure(query_type, err.to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}
