//! Entropy, information gain, and best-split search.

use rand::Rng;

use crate::node::FeatureIndex;

/// Row indices on either side of a threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Rows whose value is `<= threshold`.
    pub left: Vec<usize>,
    /// Rows whose value is `> threshold`.
    pub right: Vec<usize>,
}

impl Partition {
    /// Return `true` when one side is empty, i.e. the split separates nothing.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.left.is_empty() || self.right.is_empty()
    }
}

/// Partition the row indices of `column` around `threshold`.
///
/// The comparison is inclusive on the low side: a value equal to the
/// threshold goes left. Both sides keep ascending row order.
#[must_use]
pub fn split(column: &[f64], threshold: f64) -> Partition {
    let mut partition = Partition::default();
    for (i, &value) in column.iter().enumerate() {
        if value <= threshold {
            partition.left.push(i);
        } else {
            partition.right.push(i);
        }
    }
    partition
}

/// Shannon entropy of a label vector, in nats: `-Σ p_c · ln(p_c)`.
///
/// Zero for an empty or single-class vector.
#[must_use]
pub fn entropy(labels: &[usize]) -> f64 {
    entropy_of_counts(&label_counts(labels), labels.len())
}

/// Information gain of splitting `labels` by `column <= threshold`.
///
/// `entropy(parent) - (n_left / n) * entropy(left) - (n_right / n) * entropy(right)`.
/// Returns exactly `0.0` when the threshold puts every row on one side.
#[must_use]
pub fn information_gain(labels: &[usize], column: &[f64], threshold: f64) -> f64 {
    debug_assert_eq!(labels.len(), column.len());
    let partition = split(column, threshold);
    if partition.is_degenerate() {
        return 0.0;
    }
    let left: Vec<usize> = partition.left.iter().map(|&i| labels[i]).collect();
    let right: Vec<usize> = partition.right.iter().map(|&i| labels[i]).collect();
    weighted_gain(
        entropy(labels),
        &label_counts(&left),
        left.len(),
        &label_counts(&right),
        right.len(),
    )
}

/// Per-label counts in ascending label order, absent labels omitted.
fn label_counts(labels: &[usize]) -> Vec<usize> {
    let mut sorted = labels.to_vec();
    sorted.sort_unstable();
    let mut counts = Vec::new();
    let mut prev: Option<usize> = None;
    for label in sorted {
        if prev == Some(label) {
            if let Some(last) = counts.last_mut() {
                *last += 1;
            }
        } else {
            counts.push(1);
            prev = Some(label);
        }
    }
    counts
}

/// Entropy from class counts. Zero counts contribute nothing.
pub(crate) fn entropy_of_counts(counts: &[usize], n_samples: usize) -> f64 {
    if n_samples == 0 {
        return 0.0;
    }
    let n = n_samples as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.ln()
        })
        .sum::<f64>()
}

fn weighted_gain(
    parent_entropy: f64,
    left_counts: &[usize],
    n_left: usize,
    right_counts: &[usize],
    n_right: usize,
) -> f64 {
    let n = (n_left + n_right) as f64;
    let child_entropy = (n_left as f64 / n) * entropy_of_counts(left_counts, n_left)
        + (n_right as f64 / n) * entropy_of_counts(right_counts, n_right);
    parent_entropy - child_entropy
}

/// The winning `(feature, threshold)` pair for a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SplitCandidate {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) gain: f64,
    pub(crate) n_left: usize,
    pub(crate) n_right: usize,
}

impl SplitCandidate {
    pub(crate) fn is_degenerate(&self) -> bool {
        self.n_left == 0 || self.n_right == 0
    }
}

/// Find the highest-gain split over the candidate features.
///
/// Every distinct value of a candidate column (restricted to `rows`) is
/// tried as a threshold. Features are scanned in `candidates` order and
/// thresholds in ascending order; on equal gain the first one seen wins.
///
/// Each column is sorted once and swept left to right while class counts
/// move from the right side to the left, so a feature costs
/// `O(n log n)` instead of one full partition per threshold.
///
/// A degenerate threshold (the column maximum, which sends every row left)
/// is only returned when no candidate separates anything, e.g. when every
/// candidate column is constant. `None` only for empty `rows` or `candidates`.
///
/// `columns` is column-major (`columns[feature][row]`) and `classes` holds
/// dense class indices in `0..n_classes`.
pub(crate) fn best_split(
    columns: &[Vec<f64>],
    classes: &[usize],
    rows: &[usize],
    n_classes: usize,
    candidates: &[usize],
) -> Option<SplitCandidate> {
    let n_samples = rows.len();
    if n_samples == 0 || candidates.is_empty() {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &row in rows {
        parent_counts[classes[row]] += 1;
    }
    let parent_entropy = entropy_of_counts(&parent_counts, n_samples);

    let mut best_gain = f64::NEG_INFINITY;
    let mut best: Option<SplitCandidate> = None;
    let mut degenerate: Option<SplitCandidate> = None;

    for &feat_idx in candidates {
        let column = &columns[feat_idx];
        let mut sorted: Vec<(f64, usize)> = rows
            .iter()
            .map(|&row| (column[row], classes[row]))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..n_samples {
            let (value, class) = sorted[i];
            left_counts[class] += 1;
            right_counts[class] -= 1;

            // Only the last row of a run of equal values closes a threshold.
            if i + 1 < n_samples && sorted[i + 1].0 == value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_samples - n_left;
            let candidate = SplitCandidate {
                feature: FeatureIndex::new(feat_idx),
                threshold: value,
                gain: 0.0,
                n_left,
                n_right,
            };

            if n_right == 0 {
                degenerate.get_or_insert(candidate);
                continue;
            }

            let gain = weighted_gain(
                parent_entropy,
                &left_counts,
                n_left,
                &right_counts,
                n_right,
            );
            if gain > best_gain {
                best_gain = gain;
                best = Some(SplitCandidate { gain, ..candidate });
            }
        }
    }

    best.or(degenerate)
}

/// Draw up to `k` distinct feature indices uniformly from `0..n_features`,
/// counting only those accepted by `varies`.
///
/// Lazy Fisher-Yates: positions are shuffled one at a time until `k`
/// accepted features are found or the pool runs out, and the returned order
/// is the draw order. Rejected features do not count toward `k`. An empty
/// result means no feature was accepted.
pub(crate) fn sample_features(
    n_features: usize,
    k: usize,
    rng: &mut impl Rng,
    mut varies: impl FnMut(usize) -> bool,
) -> Vec<usize> {
    let mut order: Vec<usize> = (0..n_features).collect();
    let mut drawn = Vec::with_capacity(k.min(n_features));
    for i in 0..n_features {
        if drawn.len() == k {
            break;
        }
        let j = rng.gen_range(i..n_features);
        order.swap(i, j);
        if varies(order[i]) {
            drawn.push(order[i]);
        }
    }
    drawn
}

/// `true` when `column` takes more than one value over `rows`.
pub(crate) fn varies_over(column: &[f64], rows: &[usize]) -> bool {
    let Some(&first) = rows.first() else {
        return false;
    };
    rows.iter().any(|&row| column[row] != column[first])
}
