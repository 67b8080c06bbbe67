//! Measurement-noise injection for robustness experiments.

use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;

use crate::error::{CausalResult, ConfigError};
use crate::stats;
use crate::table::DataTable;

/// Returns a copy of `table` with Gaussian noise added to selected columns.
///
/// Each column gets `Normal(0, noise_level * std(column))`. `columns`
/// defaults to every column; names missing from the table are ignored, as
/// are constant columns.
pub fn add_noise<R: Rng>(
    table: &DataTable,
    noise_level: f64,
    columns: Option<&[&str]>,
    rng: &mut R,
) -> CausalResult<DataTable> {
    if !noise_level.is_finite() || noise_level < 0.0 {
        return Err(ConfigError::InvalidParameter {
            parameter: "noise_level".to_string(),
            reason: "must be a finite, non-negative number".to_string(),
        }
        .into());
    }

    let selected = |name: &str| columns.map_or(true, |cols| cols.contains(&name));

    let mut noisy = DataTable::new();
    for (name, values) in table.iter() {
        let scale = noise_level * stats::std_dev(values);
        let values = match Normal::new(0.0, scale) {
            Ok(dist) if selected(name) && scale > 0.0 => {
                values.iter().map(|v| v + dist.sample(rng)).collect()
            }
            _ => values.to_vec(),
        };
        noisy.push_column(name, values)?;
    }
    Ok(noisy)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn table() -> DataTable {
        DataTable::from_columns([
            ("a", (0..100).map(f64::from).collect::<Vec<_>>()),
            ("b", (0..100).map(|i| f64::from(i % 2)).collect()),
            ("c", vec![3.0; 100]),
        ])
        .unwrap()
    }

    #[test]
    fn test_only_selected_columns_change() {
        let original = table();
        let mut rng = StdRng::seed_from_u64(42);
        let noisy = add_noise(&original, 0.1, Some(&["a", "missing"]), &mut rng).unwrap();

        assert_ne!(noisy.column("a"), original.column("a"));
        assert_eq!(noisy.column("b"), original.column("b"));
        assert_eq!(noisy.column_names(), original.column_names());
    }

    #[test]
    fn test_constant_column_untouched() {
        let original = table();
        let mut rng = StdRng::seed_from_u64(1);
        let noisy = add_noise(&original, 0.5, None, &mut rng).unwrap();
        assert_eq!(noisy.column("c"), original.column("c"));
        assert_ne!(noisy.column("b"), original.column("b"));
    }

    #[test]
    fn test_zero_level_is_identity_and_negative_rejected() {
        let original = table();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(add_noise(&original, 0.0, None, &mut rng).unwrap(), original);
        assert!(add_noise(&original, -1.0, None, &mut rng).unwrap_err().is_config());
    }
}
