use causal_lab::estimation::{EffectEstimator, LinearRegressionEstimator};
use causal_lab::{
    CausalGraph, CausalModel, DataTable, GraphConfig, SimulationParameters, SyntheticGenerator,
};

fn confounded_graph() -> CausalGraph {
    CausalGraph::build(GraphConfig::simple_treatment_outcome("T", "Y", &["X"])).unwrap()
}

fn params() -> SimulationParameters {
    SimulationParameters::default()
        .with_samples(1000)
        .with_treatment_effect(1.5)
        .with_confounder_strength(1.0)
}

#[test]
fn backdoor_regression_recovers_embedded_effect() {
    let graph = confounded_graph();
    let table = SyntheticGenerator::new(&graph, 42).generate(&params()).unwrap();
    assert_eq!(table.n_rows(), 1000);
    assert_eq!(table.column_names(), &["T", "Y", "X"]);

    let model = CausalModel::with_data(graph, table).unwrap();
    let estimand = model.identify_effect("T", "Y", &[]).unwrap();
    assert_eq!(estimand.adjustment_set, vec!["X"]);

    let estimate = model.estimate_effect(&estimand, &LinearRegressionEstimator).unwrap();
    assert!(
        (estimate - 1.5).abs() <= 0.2 * 1.5,
        "estimate {estimate} not within 20% of 1.5"
    );
}

#[test]
fn treatment_is_binary_and_confounded() {
    let graph = confounded_graph();
    let table = SyntheticGenerator::new(&graph, 42).generate(&params()).unwrap();

    let t = table.column("T").unwrap();
    assert!(t.iter().all(|v| *v == 0.0 || *v == 1.0));

    // X raises both the treatment probability and the outcome.
    let x = table.column("X").unwrap();
    assert!(causal_lab::stats::correlation(x, t) > 0.1);
    assert!(causal_lab::stats::correlation(x, table.column("Y").unwrap()) > 0.1);
}

#[test]
fn same_seed_same_table() {
    let graph = confounded_graph();
    let a = SyntheticGenerator::new(&graph, 7).generate(&params()).unwrap();
    let b = SyntheticGenerator::new(&graph, 7).generate(&params()).unwrap();
    assert_eq!(a, b);

    let c = SyntheticGenerator::new(&graph, 8).generate(&params()).unwrap();
    assert_ne!(a, c);
}

#[test]
fn batch_datasets_differ_and_carry_their_effects() {
    let graph = confounded_graph();
    let generator = SyntheticGenerator::new(&graph, 42);
    let datasets = generator
        .generate_multiple_datasets(3, Some(&[0.5, 1.0, 2.0]), &params().with_samples(200))
        .unwrap();

    assert_eq!(datasets.len(), 3);
    assert_eq!(
        datasets.iter().map(|d| d.true_effect).collect::<Vec<_>>(),
        vec![0.5, 1.0, 2.0]
    );
    assert_eq!(
        datasets.iter().map(|d| d.seed).collect::<Vec<_>>(),
        vec![42, 43, 44]
    );
    assert_ne!(datasets[0].table, datasets[1].table);
    assert_ne!(datasets[1].table, datasets[2].table);
}

#[test]
fn saved_batch_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let graph = confounded_graph();
    let generator = SyntheticGenerator::new(&graph, 42);
    let datasets = generator
        .generate_multiple_datasets(2, None, &params().with_samples(300))
        .unwrap();
    assert_eq!(datasets[0].true_effect, 0.5);
    assert_eq!(datasets[1].true_effect, 3.0);

    let manifest = generator.save_datasets(dir.path(), &datasets).unwrap();
    assert_eq!(manifest.graph_fingerprint, graph.fingerprint());
    assert_eq!(manifest.datasets.len(), 2);
    assert_eq!(manifest.datasets[1].file, "dataset_1.csv");
    assert_eq!(manifest.datasets[1].n_samples, 300);

    let manifest_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest_json["datasets"][0]["seed"], 42);

    let reread = DataTable::read_csv(dir.path().join("dataset_1.csv")).unwrap();
    assert_eq!(reread.column_names(), datasets[1].table.column_names());
    assert_eq!(reread.n_rows(), 300);
    for name in reread.column_names() {
        let a = reread.column(name).unwrap();
        let b = datasets[1].table.column(name).unwrap();
        assert!(a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-12));
    }

    // The reread table estimates the same effect as the in-memory one.
    let model = CausalModel::with_data(graph.clone(), reread).unwrap();
    let estimand = model.identify_effect("T", "Y", &[]).unwrap();
    let from_disk = LinearRegressionEstimator.estimate(&estimand, model.data().unwrap()).unwrap();
    let in_memory = LinearRegressionEstimator
        .estimate(&estimand, &datasets[1].table)
        .unwrap();
    assert!((from_disk - in_memory).abs() < 1e-9);
}

#[test]
fn mediation_graph_generates_every_variable() {
    let graph = CausalGraph::build(GraphConfig::mediation("T", "M", "Y", &["X"])).unwrap();
    let table = SyntheticGenerator::new(&graph, 1)
        .generate(&params().with_samples(100))
        .unwrap();
    assert_eq!(table.n_columns(), 4);
    for name in ["T", "M", "Y", "X"] {
        assert!(table.has_column(name));
    }
}

#[test]
fn invalid_parameters_are_rejected() {
    let graph = confounded_graph();
    let err = SyntheticGenerator::new(&graph, 1)
        .generate(&params().with_noise_std(-1.0))
        .unwrap_err();
    assert!(err.is_config());
}
