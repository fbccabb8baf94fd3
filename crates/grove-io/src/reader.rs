//! CSV reader for labeled feature tables with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::LabeledDataset;

/// Reads a labeled feature table from a CSV file.
///
/// Expected CSV format:
/// - Header row required
/// - One column holds the class label (named `label` unless overridden
///   with [`with_label_column`](Self::with_label_column)); it may sit at any
///   position and must parse as a non-negative integer
/// - Every other column is a finite `f64` feature, kept in header order
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingLabelColumn`] | Header lacks the label column |
/// | [`IoError::NoFeatureColumns`] | Header has only the label column |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidLabel`] | Label cell is not a non-negative integer |
/// | [`IoError::NonFiniteValue`] | Feature cell is NaN, Inf, or unparseable float |
#[derive(Debug, Clone)]
pub struct LabeledCsvReader {
    path: PathBuf,
    label_column: String,
}

impl LabeledCsvReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            label_column: "label".to_string(),
        }
    }

    /// Use the header column named `name` as the label.
    #[must_use]
    pub fn with_label_column(mut self, name: impl Into<String>) -> Self {
        self.label_column = name.into();
        self
    }

    /// Read and validate the CSV file, returning a [`LabeledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), label_column = %self.label_column))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets ragged rows reach the InconsistentRowLength check.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        let label_index = header
            .iter()
            .position(|name| name == self.label_column)
            .ok_or_else(|| IoError::MissingLabelColumn {
                path: self.path.clone(),
                column: self.label_column.clone(),
            })?;
        let feature_names: Vec<String> = header
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != label_index)
            .map(|(_, name)| name.to_string())
            .collect();
        if feature_names.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        debug!(expected_cols, label_index, "read CSV header");

        let mut features = Vec::new();
        let mut labels = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut row = Vec::with_capacity(feature_names.len());
            for (col_index, raw) in record.iter().enumerate() {
                if col_index == label_index {
                    let label = raw.parse::<usize>().map_err(|_| IoError::InvalidLabel {
                        path: self.path.clone(),
                        row_index,
                        raw: raw.to_string(),
                    })?;
                    labels.push(label);
                    continue;
                }
                match raw.parse::<f64>() {
                    Ok(value) if value.is_finite() => row.push(value),
                    _ => {
                        return Err(IoError::NonFiniteValue {
                            path: self.path.clone(),
                            row_index,
                            column: header.get(col_index).unwrap_or("").to_string(),
                            raw: raw.to_string(),
                        });
                    }
                }
            }
            features.push(row);
        }

        if features.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = features.len(),
            n_features = feature_names.len(),
            "dataset loaded"
        );

        LabeledDataset::new(features, labels, feature_names)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
