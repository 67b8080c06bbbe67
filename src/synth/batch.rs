//! Multi-dataset generation for estimator calibration.

use std::path::Path;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CausalError, CausalResult, DataError};
use crate::stats::linspace;
use crate::table::DataTable;

use super::generator::SyntheticGenerator;
use super::params::SimulationParameters;

/// Range of default treatment effects for batch generation.
pub const DEFAULT_EFFECT_RANGE: (f64, f64) = (0.5, 3.0);

/// A generated table paired with the effect it embeds.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedDataset {
    /// The table.
    pub table: DataTable,
    /// Ground-truth treatment effect used to generate it.
    pub true_effect: f64,
    /// Seed of the RNG that produced it.
    pub seed: u64,
}

/// One entry of a [`DatasetManifest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the manifest.
    pub file: String,
    /// Ground-truth treatment effect.
    pub true_effect: f64,
    /// Generation seed.
    pub seed: u64,
    /// Row count.
    pub n_samples: usize,
}

/// Index written next to a saved batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Fingerprint of the generating graph.
    pub graph_fingerprint: String,
    /// When the batch was written.
    pub created_at: DateTime<Utc>,
    /// Saved datasets in generation order.
    pub datasets: Vec<ManifestEntry>,
}

impl SyntheticGenerator<'_> {
    /// Generates one dataset per treatment effect.
    ///
    /// Without explicit effects, `n_datasets` values are spaced evenly over
    /// [`DEFAULT_EFFECT_RANGE`]. Dataset `i` draws from an RNG seeded with
    /// `seed + i`, so each dataset is reproducible on its own.
    pub fn generate_multiple_datasets(
        &self,
        n_datasets: usize,
        treatment_effects: Option<&[f64]>,
        params: &SimulationParameters,
    ) -> CausalResult<Vec<GeneratedDataset>> {
        let effects = match treatment_effects {
            Some(effects) => effects.to_vec(),
            None => linspace(DEFAULT_EFFECT_RANGE.0, DEFAULT_EFFECT_RANGE.1, n_datasets),
        };

        let mut datasets = Vec::with_capacity(effects.len());
        for (i, effect) in effects.into_iter().enumerate() {
            let seed = self.seed().wrapping_add(i as u64);
            let mut rng = StdRng::seed_from_u64(seed);
            let table = self.generate_with_rng(&params.with_treatment_effect(effect), &mut rng)?;
            datasets.push(GeneratedDataset {
                table,
                true_effect: effect,
                seed,
            });
        }

        info!(n_datasets = datasets.len(), base_seed = self.seed(), "generated dataset batch");
        Ok(datasets)
    }

    /// Writes `dataset_<i>.csv` files and a `manifest.json` into `dir`.
    pub fn save_datasets(
        &self,
        dir: impl AsRef<Path>,
        datasets: &[GeneratedDataset],
    ) -> CausalResult<DatasetManifest> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| io_error(dir, &e))?;

        let mut entries = Vec::with_capacity(datasets.len());
        for (i, dataset) in datasets.iter().enumerate() {
            let file = format!("dataset_{i}.csv");
            dataset.table.write_csv(dir.join(&file))?;
            entries.push(ManifestEntry {
                file,
                true_effect: dataset.true_effect,
                seed: dataset.seed,
                n_samples: dataset.table.n_rows(),
            });
        }

        let manifest = DatasetManifest {
            graph_fingerprint: self.graph().fingerprint(),
            created_at: Utc::now(),
            datasets: entries,
        };

        let path = dir.join("manifest.json");
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| CausalError::internal(format!("serialize manifest: {e}")))?;
        std::fs::write(&path, json).map_err(|e| io_error(&path, &e))?;

        info!(dir = %dir.display(), n_datasets = datasets.len(), "saved dataset batch");
        Ok(manifest)
    }
}

fn io_error(path: &Path, e: &std::io::Error) -> DataError {
    DataError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CausalGraph, GraphConfig};

    fn graph() -> CausalGraph {
        CausalGraph::build(GraphConfig::simple_treatment_outcome("T", "Y", &["X"])).unwrap()
    }

    #[test]
    fn test_default_effects_are_evenly_spaced() {
        let graph = graph();
        let params = SimulationParameters::default().with_samples(10);
        let datasets = SyntheticGenerator::new(&graph, 100)
            .generate_multiple_datasets(6, None, &params)
            .unwrap();

        let effects: Vec<f64> = datasets.iter().map(|d| d.true_effect).collect();
        assert_eq!(effects, vec![0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        let seeds: Vec<u64> = datasets.iter().map(|d| d.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103, 104, 105]);
    }

    #[test]
    fn test_explicit_effects_override_count() {
        let graph = graph();
        let params = SimulationParameters::default().with_samples(10);
        let datasets = SyntheticGenerator::new(&graph, 0)
            .generate_multiple_datasets(5, Some(&[1.0, 4.0]), &params)
            .unwrap();
        assert_eq!(datasets.len(), 2);
        assert_eq!(datasets[1].true_effect, 4.0);
        assert_ne!(datasets[0].table, datasets[1].table);
    }

    #[test]
    fn test_dataset_matches_single_generation_with_same_seed() {
        let graph = graph();
        let params = SimulationParameters::default().with_samples(25);
        let datasets = SyntheticGenerator::new(&graph, 40)
            .generate_multiple_datasets(3, Some(&[2.0, 2.0, 2.0]), &params)
            .unwrap();
        let single = SyntheticGenerator::new(&graph, 41)
            .generate(&params.with_treatment_effect(2.0))
            .unwrap();
        assert_eq!(datasets[1].table, single);
    }
}
