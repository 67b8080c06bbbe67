//! Suitability checks for a dataset before effect estimation.
//!
//! Unlike [`CausalModel::attach`](super::CausalModel::attach), these checks
//! never fail: problems are collected into a [`DatasetReport`].

use serde::{Deserialize, Serialize};

use crate::table::DataTable;

const MIN_SAMPLES: usize = 100;
const MAX_TREATMENT_LEVELS: usize = 10;
const MAX_MISSING_SHARE: f64 = 0.10;
const MIN_GROUP_SIZE: usize = 10;

/// Outcome of [`validate_dataset`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetReport {
    /// False when any error was recorded.
    pub valid: bool,
    /// Problems that rule out estimation.
    pub errors: Vec<String>,
    /// Problems worth reporting that do not rule out estimation.
    pub warnings: Vec<String>,
}

impl DatasetReport {
    fn error(&mut self, message: String) {
        self.valid = false;
        self.errors.push(message);
    }
}

/// Checks that `table` can support estimating the effect of `treatment`
/// on `outcome` adjusted for `confounders`.
#[must_use]
pub fn validate_dataset(
    table: &DataTable,
    treatment: &str,
    outcome: &str,
    confounders: &[String],
) -> DatasetReport {
    let mut report = DatasetReport {
        valid: true,
        ..DatasetReport::default()
    };

    let missing: Vec<&str> = [treatment, outcome]
        .into_iter()
        .chain(confounders.iter().map(String::as_str))
        .filter(|name| !table.has_column(name))
        .collect();
    if !missing.is_empty() {
        report.error(format!("Missing columns: {}", missing.join(", ")));
    }

    if table.n_rows() < MIN_SAMPLES {
        report
            .warnings
            .push(format!("Sample size is quite small (< {MIN_SAMPLES})"));
    }

    if let Some(values) = table.column(treatment) {
        let levels = distinct_levels(values);
        if levels.len() < 2 {
            report.error("Treatment variable has insufficient variation".to_string());
        } else if levels.len() > MAX_TREATMENT_LEVELS {
            report.warnings.push(
                "Treatment variable has many unique values; consider whether it is continuous"
                    .to_string(),
            );
        }

        if levels.len() == 2 {
            let smallest = levels.iter().map(|(_, count)| *count).min().unwrap_or(0);
            if smallest < MIN_GROUP_SIZE {
                report
                    .warnings
                    .push(format!("Small treatment group size: {smallest}"));
            }
        }
    }

    if table.n_rows() > 0 {
        let high_missing: Vec<String> = table
            .iter()
            .filter_map(|(name, values)| {
                let missing = values.iter().filter(|v| !v.is_finite()).count();
                let share = missing as f64 / values.len() as f64;
                (share > MAX_MISSING_SHARE).then(|| format!("{name} ({:.1}%)", share * 100.0))
            })
            .collect();
        if !high_missing.is_empty() {
            report
                .warnings
                .push(format!("High missing values in: {}", high_missing.join(", ")));
        }
    }

    report
}

/// Distinct finite values with their counts, in ascending order.
fn distinct_levels(values: &[f64]) -> Vec<(f64, usize)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);

    let mut levels: Vec<(f64, usize)> = Vec::new();
    for v in sorted {
        match levels.last_mut() {
            Some((last, count)) if *last == v => *count += 1,
            _ => levels.push((v, 1)),
        }
    }
    levels
}
