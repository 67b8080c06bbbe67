use std::io::Write;

use causal_lab::graph::{self, VariableSpec};
use causal_lab::{GraphConfig, SimulationParameters, SyntheticGenerator, VariableType};

const GRAPH: &str = r#"{
    "variables": {
        "zeta": {"type": "continuous"},
        "alpha": {"type": "binary"},
        "mid": {"type": "continuous"}
    },
    "edges": [{"from": "mid", "to": "alpha"}]
}"#;

#[test]
fn graph_file_keeps_declaration_order() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(GRAPH.as_bytes()).unwrap();

    let graph = graph::load(file.path()).unwrap();
    assert_eq!(graph.variables().collect::<Vec<_>>(), ["zeta", "alpha", "mid"]);
    // zeta and mid are both roots; declaration order breaks the tie.
    assert_eq!(graph.topological_order(), ["zeta", "mid", "alpha"]);

    let table = SyntheticGenerator::new(&graph, 7)
        .generate(&SimulationParameters::default().with_samples(50))
        .unwrap();
    assert_eq!(table.column_names(), &["zeta", "alpha", "mid"]);

    let in_memory = GraphConfig::new()
        .with_variable("zeta", VariableSpec::new(VariableType::Continuous))
        .with_variable("alpha", VariableSpec::new(VariableType::Binary))
        .with_variable("mid", VariableSpec::new(VariableType::Continuous))
        .with_edge("mid", "alpha");
    let built = causal_lab::CausalGraph::build(in_memory).unwrap();
    assert_eq!(graph.fingerprint(), built.fingerprint());
}
