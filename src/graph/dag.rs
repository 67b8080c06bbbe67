//! Validated causal DAG.
//!
//! Nodes live in a petgraph arena; names are resolved through a
//! name → index map at the boundary. Acyclicity is enforced edge by edge
//! while building, so a rejected graph always names the edge that closed
//! the cycle.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;

use crate::error::GraphError;

use super::config::{GraphConfig, VariableType};
use super::Role;

/// A causal graph built from a [`GraphConfig`] and checked to be acyclic.
#[derive(Debug, Clone)]
pub struct CausalGraph {
    config: GraphConfig,
    graph: DiGraph<String, ()>,
    index: HashMap<String, NodeIndex>,
    order: Vec<NodeIndex>,
}

impl CausalGraph {
    /// Builds the graph, rejecting unknown endpoints and cycles.
    pub fn build(config: GraphConfig) -> Result<Self, GraphError> {
        let mut graph = DiGraph::<String, ()>::with_capacity(config.variables.len(), config.edges.len());
        let mut index = HashMap::with_capacity(config.variables.len());

        for name in config.variables.names() {
            let idx = graph.add_node(name.to_string());
            index.insert(name.to_string(), idx);
        }

        for edge in &config.edges {
            let resolve = |name: &str| {
                index.get(name).copied().ok_or_else(|| GraphError::UnknownVariable {
                    name: name.to_string(),
                    context: format!("edge {} -> {}", edge.from, edge.to),
                })
            };
            let from = resolve(&edge.from)?;
            let to = resolve(&edge.to)?;

            // Adding from→to closes a cycle iff `to` already reaches `from`.
            if from == to || has_path_connecting(&graph, to, from, None) {
                return Err(GraphError::CyclicGraph {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }

            graph.update_edge(from, to, ());
        }

        let order = topological_sort(&graph);

        Ok(Self {
            config,
            graph,
            index,
            order,
        })
    }

    /// The configuration this graph was built from.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Variable names in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.config.variables.names()
    }

    /// Number of variables.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Distinct edges as `(from, to)` name pairs.
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].as_str(), self.graph[b].as_str()))
            .collect()
    }

    /// Returns true if `name` is a declared variable.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Declared type of a variable.
    #[must_use]
    pub fn variable_type(&self, name: &str) -> Option<VariableType> {
        self.config.variables.get(name).map(|spec| spec.kind)
    }

    /// A topological order of all variables.
    ///
    /// Computed once at build time; independent variables keep their
    /// declaration order, so repeated calls (and rebuilds from the same
    /// configuration) always agree.
    #[must_use]
    pub fn topological_order(&self) -> Vec<&str> {
        self.order.iter().map(|&idx| self.graph[idx].as_str()).collect()
    }

    /// Direct causes of `name`, in declaration order.
    #[must_use]
    pub fn parents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct effects of `name`, in declaration order.
    #[must_use]
    pub fn children(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Every variable reachable from `name`, excluding `name` itself.
    #[must_use]
    pub fn descendants(&self, name: &str) -> Vec<&str> {
        let Some(&start) = self.index.get(name) else {
            return Vec::new();
        };
        let mut found = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                found.push(node);
            }
        }
        found.sort_unstable();
        found.into_iter().map(|idx| self.graph[idx].as_str()).collect()
    }

    /// Classifies a variable by the configured roles.
    ///
    /// First match wins: treatment, outcome, confounder, mediator,
    /// instrument, collider. Undeclared names are always
    /// [`Role::Unknown`], even when a role list mentions them.
    #[must_use]
    pub fn role_of(&self, name: &str) -> Role {
        let c = &self.config;
        let listed = |names: &[String]| names.iter().any(|n| n == name);

        if !self.contains(name) {
            Role::Unknown
        } else if c.treatment_variable.as_deref() == Some(name) {
            Role::Treatment
        } else if c.outcome_variable.as_deref() == Some(name) {
            Role::Outcome
        } else if listed(&c.confounders) {
            Role::Confounder
        } else if listed(&c.mediators) {
            Role::Mediator
        } else if listed(&c.instruments) {
            Role::Instrument
        } else if listed(&c.colliders) {
            Role::Collider
        } else {
            Role::Unknown
        }
    }

    /// Declared treatment variable.
    #[must_use]
    pub fn treatment(&self) -> Option<&str> {
        self.config.treatment_variable.as_deref()
    }

    /// Declared outcome variable.
    #[must_use]
    pub fn outcome(&self) -> Option<&str> {
        self.config.outcome_variable.as_deref()
    }

    /// Declared confounders.
    #[must_use]
    pub fn confounders(&self) -> &[String] {
        &self.config.confounders
    }

    /// Stable BLAKE3 fingerprint of variables, types, edges and roles.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        let mut field = |tag: &str, value: &str| {
            hasher.update(tag.as_bytes());
            hasher.update(&(value.len() as u64).to_le_bytes());
            hasher.update(value.as_bytes());
        };

        for (name, spec) in self.config.variables.iter() {
            field("var", name);
            field("type", &spec.kind.to_string());
        }
        for (from, to) in self.edges() {
            field("from", from);
            field("to", to);
        }
        field("treatment", self.treatment().unwrap_or_default());
        field("outcome", self.outcome().unwrap_or_default());
        for (tag, names) in [
            ("confounder", &self.config.confounders),
            ("mediator", &self.config.mediators),
            ("instrument", &self.config.instruments),
            ("collider", &self.config.colliders),
        ] {
            for name in names {
                field(tag, name);
            }
        }

        hasher.finalize().to_hex().to_string()
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(idx, direction).collect();
        found.sort_unstable();
        found.into_iter().map(|n| self.graph[n].as_str()).collect()
    }
}

/// Kahn's algorithm, always releasing the earliest-declared ready node.
fn topological_sort(graph: &DiGraph<String, ()>) -> Vec<NodeIndex> {
    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for child in graph.neighbors_directed(node, Direction::Outgoing) {
            let degree = &mut in_degree[child.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(child));
            }
        }
    }
    order
}
