//! Synthetic data generation from a causal graph.
//!
//! The generator embeds a known treatment effect so estimators can be
//! checked against ground truth. All randomness flows through an explicit
//! RNG; there is no process-wide seeding.

mod batch;
mod generator;
mod noise;
mod params;

pub use batch::{DatasetManifest, GeneratedDataset, ManifestEntry, DEFAULT_EFFECT_RANGE};
pub use generator::{SyntheticGenerator, DEFAULT_EDGE_WEIGHT};
pub use noise::add_noise;
pub use params::SimulationParameters;
