//! Column-oriented numeric table.
//!
//! Every cell is an `f64`; binary and categorical variables are stored as
//! their integer codes. Missing or unparsable cells read as `NaN` and the
//! statistics helpers skip them.

use std::collections::{BTreeMap, HashMap};
use std::io::{Read, Write};
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DataError;
use crate::stats;

/// A named-column table with a fixed row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    index: HashMap<String, usize>,
    n_rows: usize,
}

impl DataTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(name, values)` pairs.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Appends a column. The first column fixes the row count.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> Result<(), DataError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(DataError::DuplicateColumn { name });
        }
        if self.names.is_empty() {
            self.n_rows = values.len();
        } else if values.len() != self.n_rows {
            return Err(DataError::LengthMismatch {
                name,
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.names.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Column names in table order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Returns true if a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Borrows a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Borrows a column, failing with [`DataError::MissingColumn`].
    pub fn require_column(&self, name: &str) -> Result<&[f64], DataError> {
        self.column(name).ok_or_else(|| DataError::MissingColumn {
            name: name.to_string(),
        })
    }

    /// Iterates `(name, values)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.names
            .iter()
            .zip(&self.columns)
            .map(|(n, c)| (n.as_str(), c.as_slice()))
    }

    /// Copy containing only the rows where `mask` is true.
    #[must_use]
    pub fn filter_rows(&self, mask: &[bool]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|col| {
                col.iter()
                    .zip(mask)
                    .filter_map(|(v, keep)| keep.then_some(*v))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();
        let n_rows = columns.first().map_or(0, Vec::len);
        Self {
            names: self.names.clone(),
            columns,
            index: self.index.clone(),
            n_rows,
        }
    }

    /// Copy of a contiguous row range (clamped to the table).
    #[must_use]
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.n_rows);
        let start = range.start.min(end);
        Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
            index: self.index.clone(),
            n_rows: end - start,
        }
    }

    /// Reads a comma-delimited file with a header row.
    pub fn read_csv(path: impl AsRef<Path>) -> Result<Self, DataError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| DataError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_reader(file)
    }

    /// Reads comma-delimited text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DataError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(csv_err)?.clone();
        let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

        for record in rdr.records() {
            let record = record.map_err(csv_err)?;
            for (col, field) in columns.iter_mut().zip(record.iter()) {
                col.push(parse_cell(field));
            }
        }

        Self::from_columns(headers.iter().map(str::to_string).zip(columns))
    }

    /// Writes the table as comma-delimited text, creating parent directories.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), DataError> {
        let path = path.as_ref();
        let io_err = |e: std::io::Error| DataError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = std::fs::File::create(path).map_err(io_err)?;
        self.to_writer(file)
    }

    /// Writes the table as comma-delimited text.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), DataError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.names).map_err(csv_err)?;
        for row in 0..self.n_rows {
            wtr.write_record(self.columns.iter().map(|c| format_cell(c[row])))
                .map_err(csv_err)?;
        }
        wtr.flush().map_err(|e| DataError::Csv {
            message: e.to_string(),
        })
    }

    /// Per-column descriptive statistics.
    #[must_use]
    pub fn summary(&self) -> TableSummary {
        let variables = self
            .iter()
            .map(|(name, values)| (name.to_string(), ColumnSummary::of(values)))
            .collect();
        TableSummary {
            n_samples: self.n_rows,
            n_variables: self.n_columns(),
            variables,
        }
    }
}

fn csv_err(e: csv::Error) -> DataError {
    DataError::Csv {
        message: e.to_string(),
    }
}

fn parse_cell(field: &str) -> f64 {
    match field {
        "" => f64::NAN,
        "True" | "true" => 1.0,
        "False" | "false" => 0.0,
        other => other.parse().unwrap_or(f64::NAN),
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Columns with at most this many distinct values get value counts.
const VALUE_COUNT_LIMIT: usize = 10;

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    /// Non-missing values.
    pub count: usize,
    /// Mean.
    pub mean: f64,
    /// Sample standard deviation.
    pub std: f64,
    /// Minimum.
    pub min: f64,
    /// Maximum.
    pub max: f64,
    /// Distinct non-missing values.
    pub unique_values: usize,
    /// Occurrences per value, for low-cardinality columns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_counts: Option<BTreeMap<String, usize>>,
}

impl ColumnSummary {
    fn of(values: &[f64]) -> Self {
        let present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        let mut sorted = present.clone();
        sorted.sort_by(f64::total_cmp);

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut unique_values = 0;
        let mut previous: Option<f64> = None;
        for &v in &sorted {
            if previous != Some(v) {
                unique_values += 1;
                previous = Some(v);
            }
            *counts.entry(format_cell(v)).or_default() += 1;
        }

        Self {
            count: present.len(),
            mean: stats::mean(&present),
            std: stats::std_dev(&present),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            unique_values,
            value_counts: (unique_values <= VALUE_COUNT_LIMIT).then_some(counts),
        }
    }
}

/// Descriptive statistics for a whole table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Row count.
    pub n_samples: usize,
    /// Column count.
    pub n_variables: usize,
    /// Per-column statistics, keyed by column name.
    pub variables: BTreeMap<String, ColumnSummary>,
}
