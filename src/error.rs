//! Error types for causal-lab.
//!
//! All errors are strongly typed using thiserror, one enum per concern,
//! wrapped by [`CausalError`] at the crate boundary. Query handlers never
//! let these escape the dispatcher: they are folded into a failed
//! [`QueryResult`](crate::query::QueryResult) instead.

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read '{path}': {message}")]
    Io {
        path: String,
        message: String,
    },

    #[error("Required field '{field}' is missing from graph configuration")]
    MissingField {
        field: String,
    },

    #[error("Malformed graph configuration: {reason}")]
    Malformed {
        reason: String,
    },

    #[error("Invalid simulation parameter '{parameter}': {reason}")]
    InvalidParameter {
        parameter: String,
        reason: String,
    },

    #[error("Invalid settings: {reason}")]
    InvalidSettings {
        reason: String,
    },
}

/// Structural errors in the causal graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph is not a DAG: edge {from} -> {to} closes a cycle")]
    CyclicGraph {
        from: String,
        to: String,
    },

    #[error("Unknown variable '{name}' referenced by {context}")]
    UnknownVariable {
        name: String,
        context: String,
    },
}

/// Errors in tabular data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data is missing required variables: {}", .missing.join(", "))]
    MissingVariables {
        missing: Vec<String>,
    },

    #[error("No data is attached to the causal model")]
    NotAttached,

    #[error("Column '{name}' not found in data")]
    MissingColumn {
        name: String,
    },

    #[error("Column '{name}' appears more than once")]
    DuplicateColumn {
        name: String,
    },

    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to access '{path}': {message}")]
    Io {
        path: String,
        message: String,
    },

    #[error("Malformed delimited data: {message}")]
    Csv {
        message: String,
    },
}

/// Errors in query payloads.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown query type: {tag}")]
    UnknownQueryType {
        tag: String,
    },

    #[error("Query is missing the 'query_type' tag")]
    MissingQueryType,

    #[error("Invalid {query_type} query: {reason}")]
    InvalidPayload {
        query_type: String,
        reason: String,
    },
}

/// Per-method estimation failures.
///
/// These are collected and reported next to successful methods rather
/// than aborting an effect estimation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimationError {
    #[error("Unknown estimation method '{name}'")]
    UnknownMethod {
        name: String,
    },

    #[error("Effect of {treatment} on {outcome} is not identifiable: {reason}")]
    NotIdentified {
        treatment: String,
        outcome: String,
        reason: String,
    },

    #[error("Treatment '{variable}' must be binary (0/1) for {method}")]
    NonBinaryTreatment {
        variable: String,
        method: String,
    },

    #[error("Design matrix is singular; {method} cannot be fitted")]
    SingularMatrix {
        method: String,
    },

    #[error("Insufficient data for {method}: {reason}")]
    InsufficientData {
        method: String,
        reason: String,
    },
}

/// Top-level error type for causal-lab.
#[derive(Debug, Error)]
pub enum CausalError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Estimation error: {0}")]
    Estimation(#[from] EstimationError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl CausalError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if the graph is not a DAG.
    #[must_use]
    pub const fn is_cyclic_graph(&self) -> bool {
        matches!(self, Self::Graph(GraphError::CyclicGraph { .. }))
    }

    /// Returns true if this is a data error.
    #[must_use]
    pub const fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Returns true if the table lacks declared variables.
    #[must_use]
    pub const fn is_missing_variables(&self) -> bool {
        matches!(self, Self::Data(DataError::MissingVariables { .. }))
    }

    /// Returns true if this is a query error.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        matches!(self, Self::Query(_))
    }
}

/// Result type alias for causal-lab operations.
pub type CausalResult<T> = Result<T, CausalError>;
