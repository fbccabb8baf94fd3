//! Shuffled train/test holdout splitting.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::IoError;
use crate::domain::LabeledDataset;

/// Split a dataset into shuffled `(train, test)` parts.
///
/// Rows are shuffled with a ChaCha8 stream seeded from `seed`; the first
/// `round(n * test_fraction)` shuffled rows, clamped to `[1, n - 1]`, form
/// the test set and the rest the training set. Every row lands in exactly
/// one part.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::InvalidTestFraction`] | `test_fraction` is not in `(0, 1)` |
/// | [`IoError::TooFewSamples`] | Fewer than 2 rows |
pub fn train_test_split(
    dataset: &LabeledDataset,
    test_fraction: f64,
    seed: u64,
) -> Result<(LabeledDataset, LabeledDataset), IoError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(IoError::InvalidTestFraction {
            fraction: test_fraction,
        });
    }
    let n = dataset.n_samples();
    if n < 2 {
        return Err(IoError::TooFewSamples { required: 2, got: n });
    }

    let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
    let (test_rows, train_rows) = order.split_at(n_test);

    debug!(n_train = train_rows.len(), n_test, "holdout split");

    Ok((dataset.select(train_rows), dataset.select(test_rows)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexed(n: usize) -> LabeledDataset {
        LabeledDataset::new(
            (0..n).map(|i| vec![i as f64]).collect(),
            (0..n).map(|i| i % 2).collect(),
            vec!["row".to_string()],
        )
        .unwrap()
    }

    fn row_ids(ds: &LabeledDataset) -> Vec<usize> {
        ds.features().iter().map(|r| r[0] as usize).collect()
    }

    #[test]
    fn sizes_follow_fraction() {
        let (train, test) = train_test_split(&indexed(1000), 0.2, 42).unwrap();
        assert_eq!(test.n_samples(), 200);
        assert_eq!(train.n_samples(), 800);
    }

    #[test]
    fn parts_are_disjoint_and_cover_all_rows() {
        let (train, test) = train_test_split(&indexed(37), 0.3, 1).unwrap();
        let mut all = row_ids(&train);
        all.extend(row_ids(&test));
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn labels_travel_with_rows() {
        let (train, test) = train_test_split(&indexed(20), 0.5, 3).unwrap();
        for ds in [&train, &test] {
            for (row, &label) in ds.features().iter().zip(ds.labels()) {
                assert_eq!(label, row[0] as usize % 2);
            }
        }
    }

    #[test]
    fn test_size_clamped_to_leave_both_sides_non_empty() {
        let (train, test) = train_test_split(&indexed(3), 0.01, 0).unwrap();
        assert_eq!((train.n_samples(), test.n_samples()), (2, 1));
        let (train, test) = train_test_split(&indexed(3), 0.99, 0).unwrap();
        assert_eq!((train.n_samples(), test.n_samples()), (1, 2));
    }

    #[test]
    fn deterministic_per_seed() {
        let ds = indexed(50);
        let (a, _) = train_test_split(&ds, 0.2, 8).unwrap();
        let (b, _) = train_test_split(&ds, 0.2, 8).unwrap();
        assert_eq!(row_ids(&a), row_ids(&b));
    }

    #[test]
    fn invalid_fraction_rejected() {
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            let err = train_test_split(&indexed(10), fraction, 0).unwrap_err();
            assert!(matches!(err, IoError::InvalidTestFraction { .. }));
        }
    }

    #[test]
    fn too_few_samples_rejected() {
        let err = train_test_split(&indexed(1), 0.5, 0).unwrap_err();
        assert!(matches!(err, IoError::TooFewSamples { required: 2, got: 1 }));
    }
}
