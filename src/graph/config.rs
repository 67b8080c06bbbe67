//! Declarative graph configuration.
//!
//! The configuration is the JSON document users write by hand: variables
//! with a declared type, directed edges, and named roles. Variable
//! declaration order is preserved because it decides column order in
//! generated tables and tie-breaking in the topological order.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Declared measurement type of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    /// Real-valued.
    #[default]
    Continuous,
    /// 0/1 valued.
    Binary,
    /// Small set of integer levels.
    Categorical,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => write!(f, "continuous"),
            Self::Binary => write!(f, "binary"),
            Self::Categorical => write!(f, "categorical"),
        }
    }
}

/// Metadata attached to one variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Declared type; `continuous` when omitted.
    #[serde(rename = "type", default)]
    pub kind: VariableType,

    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Any other keys, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VariableSpec {
    /// Creates a spec of the given type.
    #[must_use]
    pub fn new(kind: VariableType) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    /// Adds a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Ordered name → spec mapping that keeps document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariableSet(Vec<(String, VariableSpec)>);

impl VariableSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a variable, keeping its first position.
    pub fn insert(&mut self, name: impl Into<String>, spec: VariableSpec) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = spec,
            None => self.0.push((name, spec)),
        }
    }

    /// Looks a variable up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VariableSpec> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Returns true if `name` is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Variable names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(n, _)| n.as_str())
    }

    /// Iterates `(name, spec)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VariableSpec)> {
        self.0.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no variables are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for VariableSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, spec) in &self.0 {
            map.serialize_entry(name, spec)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for VariableSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = VariableSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of variable name to variable metadata")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = VariableSet::new();
                while let Some((name, spec)) = access.next_entry::<String, VariableSpec>()? {
                    set.insert(name, spec);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

/// A directed edge `from → to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// Cause.
    pub from: String,
    /// Effect.
    pub to: String,
}

impl EdgeSpec {
    /// Creates an edge.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Full graph configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Optional graph name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Declared variables.
    pub variables: VariableSet,

    /// Directed edges.
    pub edges: Vec<EdgeSpec>,

    /// Treatment (exposure) variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment_variable: Option<String>,

    /// Outcome (response) variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_variable: Option<String>,

    /// Common causes of treatment and outcome.
    #[serde(default)]
    pub confounders: Vec<String>,

    /// Variables on the treatment → outcome path.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mediators: Vec<String>,

    /// Variables affecting the outcome only through the treatment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instruments: Vec<String>,

    /// Common effects of treatment and outcome.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub colliders: Vec<String>,

    /// Unrecognized top-level keys, carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl GraphConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            variables: VariableSet::new(),
            edges: Vec::new(),
            treatment_variable: None,
            outcome_variable: None,
            confounders: Vec::new(),
            mediators: Vec::new(),
            instruments: Vec::new(),
            colliders: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Reads a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Malformed {
                reason: e.to_string(),
            })?;
        Self::from_value(value)
    }

    /// Converts an in-memory JSON document.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let Some(object) = value.as_object() else {
            return Err(ConfigError::Malformed {
                reason: "top level must be a JSON object".to_string(),
            });
        };

        for field in ["variables", "edges"] {
            if !object.contains_key(field) {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        serde_json::from_value(value).map_err(|e| ConfigError::Malformed {
            reason: e.to_string(),
        })
    }

    /// Serializes to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Malformed {
            reason: format!("serialize graph configuration: {e}"),
        })
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Adds a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, spec: VariableSpec) -> Self {
        self.variables.insert(name, spec);
        self
    }

    /// Adds an edge.
    #[must_use]
    pub fn with_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(EdgeSpec::new(from, to));
        self
    }

    /// Sets the treatment and outcome roles.
    #[must_use]
    pub fn with_treatment_outcome(
        mut self,
        treatment: impl Into<String>,
        outcome: impl Into<String>,
    ) -> Self {
        self.treatment_variable = Some(treatment.into());
        self.outcome_variable = Some(outcome.into());
        self
    }

    /// Sets the confounder role.
    #[must_use]
    pub fn with_confounders<I, S>(mut self, confounders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.confounders = confounders.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new()
    }
}
