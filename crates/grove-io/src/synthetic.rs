//! Deterministic synthetic classification datasets.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::domain::LabeledDataset;

/// Generate the "sum threshold" binary dataset.
///
/// Every feature is drawn uniformly from `[0, 1)`. A row is labeled `1`
/// when its feature sum exceeds `n_features / 2` and `0` otherwise, so the
/// two classes are roughly balanced and separated by a single hyperplane.
/// Columns are named `x0, x1, ...`. The same `seed` always yields the same
/// dataset.
pub fn sum_threshold(n_samples: usize, n_features: usize, seed: u64) -> LabeledDataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let half = n_features as f64 / 2.0;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features).map(|_| rng.r#gen::<f64>()).collect();
        labels.push(usize::from(row.iter().sum::<f64>() > half));
        features.push(row);
    }
    let feature_names = (0..n_features).map(|f| format!("x{f}")).collect();

    let n_positive = labels.iter().filter(|&&l| l == 1).count();
    debug!(n_samples, n_features, n_positive, "generated sum-threshold dataset");

    LabeledDataset::from_parts_unchecked(features, labels, feature_names)
}
