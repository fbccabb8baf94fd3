use crate::error::RfError;

/// Check a training set and return its feature count.
///
/// | Variant                             | When                               |
/// |-------------------------------------|------------------------------------|
/// | [`RfError::EmptyDataset`]           | `features` is empty                |
/// | [`RfError::LabelCountMismatch`]     | `labels.len() != features.len()`   |
/// | [`RfError::ZeroFeatures`]           | rows have zero feature columns     |
/// | [`RfError::FeatureCountMismatch`]   | rows have inconsistent lengths     |
/// | [`RfError::NonFiniteValue`]         | any value is NaN or infinite       |
pub(crate) fn check_training_set(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    if features.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }

    let n_features = features[0].len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }

    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }

    Ok(n_features)
}

/// Sorted distinct labels.
pub(crate) fn distinct_labels(labels: &[usize]) -> Vec<usize> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Reject prediction rows whose width differs from the training width.
pub(crate) fn check_width(sample: &[f64], n_features: usize) -> Result<(), RfError> {
    if sample.len() != n_features {
        return Err(RfError::PredictionFeatureMismatch {
            expected: n_features,
            got: sample.len(),
        });
    }
    Ok(())
}
