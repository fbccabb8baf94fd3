//! Domain types for grove-io.

use crate::IoError;

/// A labeled feature matrix ready for training.
///
/// Feature rows, labels, and column names are stored in parallel:
/// `labels[i]` is the class of `features[i]`, and `feature_names[j]` names
/// column `j` of every row.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledDataset {
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    feature_names: Vec<String>,
}

impl LabeledDataset {
    /// Assemble a dataset from parallel parts.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::MalformedDataset`] if the label count differs from
    /// the row count, or any row width differs from the number of names.
    pub fn new(
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
        feature_names: Vec<String>,
    ) -> Result<Self, IoError> {
        if labels.len() != features.len() {
            return Err(IoError::MalformedDataset {
                reason: format!("{} rows but {} labels", features.len(), labels.len()),
            });
        }
        if let Some((row, width)) = features
            .iter()
            .map(Vec::len)
            .enumerate()
            .find(|&(_, width)| width != feature_names.len())
        {
            return Err(IoError::MalformedDataset {
                reason: format!(
                    "row {row} has {width} values, expected {}",
                    feature_names.len()
                ),
            });
        }
        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    /// Callers guarantee the parts are parallel.
    pub(crate) fn from_parts_unchecked(
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
        feature_names: Vec<String>,
    ) -> Self {
        debug_assert_eq!(features.len(), labels.len());
        Self {
            features,
            labels,
            feature_names,
        }
    }

    /// Feature rows: `features()[sample][feature]`.
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Class label of each row.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Column names, one per feature.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Number of rows.
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    /// Number of feature columns.
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// `true` when the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Copy out the rows at `indices`, in the given order.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn valid_parts() {
        let ds = LabeledDataset::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![0, 1], names(2))
            .unwrap();
        assert_eq!(ds.n_samples(), 2);
        assert_eq!(ds.n_features(), 2);
        assert_eq!(ds.labels(), &[0, 1]);
        assert!(!ds.is_empty());
    }

    #[test]
    fn label_count_mismatch() {
        let err = LabeledDataset::new(vec![vec![1.0]], vec![0, 1], names(1)).unwrap_err();
        assert!(matches!(err, IoError::MalformedDataset { .. }));
    }

    #[test]
    fn width_mismatch() {
        let err = LabeledDataset::new(vec![vec![1.0], vec![1.0, 2.0]], vec![0, 1], names(1))
            .unwrap_err();
        assert!(matches!(err, IoError::MalformedDataset { .. }));
    }

    #[test]
    fn select_keeps_order_and_names() {
        let ds = LabeledDataset::new(
            vec![vec![0.0], vec![1.0], vec![2.0]],
            vec![5, 6, 7],
            names(1),
        )
        .unwrap();
        let picked = ds.select(&[2, 0]);
        assert_eq!(picked.features(), &[vec![2.0], vec![0.0]]);
        assert_eq!(picked.labels(), &[7, 5]);
        assert_eq!(picked.feature_names(), ds.feature_names());
    }
}
