use proptest::prelude::*;

use causal_lab::graph::VariableSpec;
use causal_lab::{CausalGraph, GraphConfig, GraphError, Role, VariableType};

/// Index order runs opposite to lexical order, so any sorting shows up.
fn name(i: usize) -> String {
    format!("n{}", 99 - i)
}

fn config_with_edges(n: usize, edges: &[(usize, usize)]) -> GraphConfig {
    let mut config = GraphConfig::new();
    for i in 0..n {
        config = config.with_variable(name(i), VariableSpec::new(VariableType::Continuous));
    }
    for (from, to) in edges {
        config = config.with_edge(name(*from), name(*to));
    }
    config
}

/// Edge lists over `n` nodes, arbitrary direction.
fn arbitrary_edges() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..10).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..25)))
}

proptest! {
    #[test]
    fn forward_edges_always_build_and_respect_order((n, raw) in arbitrary_edges()) {
        // Orienting every edge low → high guarantees a DAG.
        let edges: Vec<(usize, usize)> = raw
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let graph = CausalGraph::build(config_with_edges(n, &edges)).unwrap();

        let order = graph.topological_order();
        prop_assert_eq!(order.len(), n);
        let position = |v: &str| order.iter().position(|o| *o == v).unwrap();
        for (from, to) in graph.edges() {
            prop_assert!(position(from) < position(to));
        }
    }

    #[test]
    fn arbitrary_edges_are_either_rejected_as_cyclic_or_ordered((n, edges) in arbitrary_edges()) {
        match CausalGraph::build(config_with_edges(n, &edges)) {
            Ok(graph) => {
                let order = graph.topological_order();
                for (from, to) in graph.edges() {
                    let a = order.iter().position(|o| *o == from).unwrap();
                    let b = order.iter().position(|o| *o == to).unwrap();
                    prop_assert!(a < b);
                }
                for (from, to) in &edges {
                    prop_assert!(!graph.descendants(&name(*to)).contains(&name(*from).as_str()));
                }
            }
            Err(GraphError::CyclicGraph { from, to }) => {
                prop_assert!(edges.iter().any(|(a, b)| name(*a) == from && name(*b) == to));
            }
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    #[test]
    fn descendants_are_reachable_and_exclude_self((n, raw) in arbitrary_edges()) {
        let edges: Vec<(usize, usize)> = raw
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let graph = CausalGraph::build(config_with_edges(n, &edges)).unwrap();

        for i in 0..n {
            let v = name(i);
            let descendants = graph.descendants(&v);
            prop_assert!(!descendants.contains(&v.as_str()));
            for child in graph.children(&v) {
                prop_assert!(descendants.contains(&child));
            }
        }
    }

    #[test]
    fn config_json_round_trip_preserves_structure(
        (n, raw) in arbitrary_edges(),
        binary in prop::collection::vec(any::<bool>(), 10),
    ) {
        let edges: Vec<(usize, usize)> = raw
            .into_iter()
            .filter(|(a, b)| a != b)
            .map(|(a, b)| (a.min(b), a.max(b)))
            .collect();
        let mut config = GraphConfig::new();
        for i in 0..n {
            let kind = if binary[i] { VariableType::Binary } else { VariableType::Continuous };
            config = config.with_variable(name(i), VariableSpec::new(kind));
        }
        for (from, to) in &edges {
            config = config.with_edge(name(*from), name(*to));
        }
        config = config
            .with_treatment_outcome(name(0), name(n - 1))
            .with_confounders(if n > 2 { vec![name(1)] } else { Vec::new() });

        let text = config.to_json_pretty().unwrap();
        let parsed = GraphConfig::from_json_str(&text).unwrap();
        prop_assert_eq!(&parsed, &config);

        let original = CausalGraph::build(config).unwrap();
        let rebuilt = CausalGraph::build(parsed).unwrap();
        prop_assert_eq!(original.fingerprint(), rebuilt.fingerprint());
        prop_assert_eq!(original.edges(), rebuilt.edges());
        for i in 0..n {
            let v = name(i);
            prop_assert_eq!(original.variable_type(&v), rebuilt.variable_type(&v));
            prop_assert_eq!(original.role_of(&v), rebuilt.role_of(&v));
        }
        prop_assert_eq!(rebuilt.role_of(&name(0)), Role::Treatment);
        prop_assert_eq!(rebuilt.role_of(&name(n - 1)), Role::Outcome);
    }
}

#[test]
fn two_cycle_is_rejected() {
    let err = CausalGraph::build(config_with_edges(2, &[(0, 1), (1, 0)])).unwrap_err();
    assert!(matches!(err, GraphError::CyclicGraph { ref from, ref to } if *from == name(1) && *to == name(0)));
}

#[test]
fn self_loop_is_rejected() {
    let err = CausalGraph::build(config_with_edges(1, &[(0, 0)])).unwrap_err();
    assert!(matches!(err, GraphError::CyclicGraph { .. }));
}
