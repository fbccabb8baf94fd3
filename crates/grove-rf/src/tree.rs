use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    config::Seed,
    dataset::{check_training_set, check_width, distinct_labels},
    node::{Node, NodeIndex},
    split::{best_split, sample_features, varies_over},
};

/// Configuration for a single entropy-based decision tree.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter           | Default               |
/// |---------------------|-----------------------|
/// | `min_samples_split` | 2                     |
/// | `max_depth`         | 10                    |
/// | `max_features`      | `None` (all features) |
/// | `seed`              | `Seed::Fixed(42)`     |
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeConfig {
    pub(crate) min_samples_split: usize,
    pub(crate) max_depth: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: Seed,
}

impl DecisionTreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_samples_split: 2,
            max_depth: 10,
            max_features: None,
            seed: Seed::default(),
        }
    }

    /// Set the minimum number of samples required to attempt a split.
    ///
    /// Nodes with fewer samples become leaves. 0 and 1 behave the same.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Set the maximum tree depth. The root is depth 0.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum number of features to consider at each split.
    ///
    /// `None` means consider all features. A cap above the feature count
    /// of the training set is clamped to that count at fit time.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Set the random seed for feature subsampling.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = seed.into();
        self
    }

    // --- Getters ---

    /// Return the minimum samples required to split a node.
    #[must_use]
    pub fn min_samples_split(&self) -> usize {
        self.min_samples_split
    }

    /// Return the maximum depth.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Return the per-split feature cap, if set.
    #[must_use]
    pub fn max_features(&self) -> Option<usize> {
        self.max_features
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    pub(crate) fn validate(&self) -> Result<(), RfError> {
        if self.max_depth == 0 {
            return Err(RfError::InvalidMaxDepth { max_depth: 0 });
        }
        if self.max_features == Some(0) {
            return Err(RfError::InvalidMaxFeatures { max_features: 0 });
        }
        Ok(())
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A binary decision tree classifier grown by information gain.
///
/// Created unfitted from a validated [`DecisionTreeConfig`]. [`fit`](Self::fit)
/// grows the whole tree in one pass; afterwards the tree is read-only and can
/// serve any number of [`predict`](Self::predict) calls.
///
/// Nodes live in an arena (`Vec<Node>`, root at index 0) referenced by
/// [`NodeIndex`], so traversal is a loop and dropping a deep tree is flat.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    config: DecisionTreeConfig,
    fitted: Option<FittedTree>,
}

#[derive(Debug, Clone)]
struct FittedTree {
    nodes: Vec<Node>,
    n_features: usize,
    max_features: usize,
    classes: Vec<usize>,
}

/// A node waiting to be grown: its arena slot, its rows, and its depth.
struct Pending {
    slot: usize,
    rows: Vec<usize>,
    depth: usize,
}

impl DecisionTree {
    /// Create an unfitted tree.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                    |
    /// |----------------------------------|-------------------------|
    /// | [`RfError::InvalidMaxDepth`]     | `max_depth` is 0        |
    /// | [`RfError::InvalidMaxFeatures`]  | `max_features` is `Some(0)` |
    pub fn new(config: DecisionTreeConfig) -> Result<Self, RfError> {
        config.validate()?;
        Ok(Self {
            config,
            fitted: None,
        })
    }

    /// Grow the tree on a row-major dataset, replacing any previous fit.
    ///
    /// `features[sample_idx][feature_idx]` is row-major; `labels[sample_idx]`
    /// may be any non-negative integers, dense or not.
    ///
    /// On error the tree is left unfitted.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                              |
    /// |-------------------------------------|-----------------------------------|
    /// | [`RfError::EmptyDataset`]           | `features` is empty               |
    /// | [`RfError::LabelCountMismatch`]     | `labels.len() != features.len()`  |
    /// | [`RfError::ZeroFeatures`]           | rows have zero feature columns    |
    /// | [`RfError::FeatureCountMismatch`]   | rows have inconsistent lengths    |
    /// | [`RfError::NonFiniteValue`]         | any value is NaN or infinite      |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize]) -> Result<(), RfError> {
        self.fitted = None;
        let n_features = check_training_set(features, labels)?;
        let max_features = self
            .config
            .max_features
            .map_or(n_features, |cap| cap.min(n_features));

        // Dense class indices keep the split sweep on flat count vectors.
        let classes = distinct_labels(labels);
        let class_idx: Vec<usize> = labels
            .iter()
            .map(|label| match classes.binary_search(label) {
                Ok(i) | Err(i) => i,
            })
            .collect();

        debug!(
            n_samples = features.len(),
            n_features,
            n_classes = classes.len(),
            max_features,
            "fitting decision tree"
        );

        // Column-major layout for the split sweep.
        let columns: Vec<Vec<f64>> = (0..n_features)
            .map(|feat_idx| features.iter().map(|row| row[feat_idx]).collect())
            .collect();

        let mut rng = self.config.seed.rng();
        let nodes = grow(
            &columns,
            &class_idx,
            &classes,
            &self.config,
            max_features,
            &mut rng,
        );

        let fitted = FittedTree {
            nodes,
            n_features,
            max_features,
            classes,
        };
        debug!(
            n_nodes = fitted.nodes.len(),
            depth = fitted.depth(),
            "decision tree built"
        );
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Predict a class label for every row.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                            |
    /// |------------------------------------------|---------------------------------|
    /// | [`RfError::NotFitted`]                   | called before a successful `fit` |
    /// | [`RfError::PredictionFeatureMismatch`]   | a row width differs from training |
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        let fitted = self.fitted()?;
        features.iter().map(|row| fitted.classify(row)).collect()
    }

    /// Predict the class label for a single sample.
    ///
    /// Traverses from the root: at each `Split`, goes left when
    /// `sample[feature] <= threshold`, right otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_one(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.fitted()?.classify(sample)
    }

    /// Return the configuration this tree was built with.
    #[must_use]
    pub fn config(&self) -> &DecisionTreeConfig {
        &self.config
    }

    /// Return `true` once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Return the node arena (root first); empty before `fit`.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        self.fitted
            .as_ref()
            .map(|f| f.nodes.as_slice())
            .unwrap_or_default()
    }

    /// Return the root node, if fitted.
    #[must_use]
    pub fn root(&self) -> Option<&Node> {
        self.nodes().first()
    }

    /// Return the number of features seen at fit time, if fitted.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.n_features)
    }

    /// Return the effective number of features drawn per split, if fitted.
    #[must_use]
    pub fn max_features_resolved(&self) -> Option<usize> {
        self.fitted.as_ref().map(|f| f.max_features)
    }

    /// Return the sorted distinct labels seen at fit time.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        self.fitted
            .as_ref()
            .map(|f| f.classes.as_slice())
            .unwrap_or_default()
    }

    /// Return the total number of nodes (splits and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes().len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes().iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree. A single root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.fitted.as_ref().map_or(0, FittedTree::depth)
    }

    fn fitted(&self) -> Result<&FittedTree, RfError> {
        self.fitted.as_ref().ok_or(RfError::NotFitted)
    }
}

impl FittedTree {
    fn classify(&self, sample: &[f64]) -> Result<usize, RfError> {
        check_width(sample, self.n_features)?;
        let mut idx = 0usize;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { label } => return Ok(*label),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((node_idx, d)) = stack.pop() {
            match &self.nodes[node_idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    stack.push((left.index(), d + 1));
                    stack.push((right.index(), d + 1));
                }
            }
        }
        max_depth
    }
}

/// Grow the arena from a work stack instead of recursion.
///
/// Nodes are expanded in pre-order, left subtree before right.
fn grow(
    columns: &[Vec<f64>],
    class_idx: &[usize],
    classes: &[usize],
    config: &DecisionTreeConfig,
    max_features: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<Node> {
    let n_features = columns.len();
    let n_classes = classes.len();

    let mut arena = vec![Node::Leaf { label: classes[0] }];
    let mut stack = vec![Pending {
        slot: 0,
        rows: (0..class_idx.len()).collect(),
        depth: 0,
    }];

    while let Some(Pending { slot, rows, depth }) = stack.pop() {
        let mut counts = vec![0usize; n_classes];
        for &row in &rows {
            counts[class_idx[row]] += 1;
        }
        let leaf = Node::Leaf {
            label: classes[majority(&counts)],
        };

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if depth >= config.max_depth || pure || rows.len() < config.min_samples_split {
            arena[slot] = leaf;
            continue;
        }

        // Constant columns cannot separate these rows and do not count
        // toward the per-split cap.
        let candidates = sample_features(n_features, max_features, rng, |feature| {
            varies_over(&columns[feature], &rows)
        });
        let Some(split) = best_split(columns, class_idx, &rows, n_classes, &candidates) else {
            // Every column is constant over these rows.
            arena[slot] = leaf;
            continue;
        };
        if split.is_degenerate() {
            arena[slot] = leaf;
            continue;
        }

        let column = &columns[split.feature.index()];
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&row| column[row] <= split.threshold);

        let left = arena.len();
        arena.push(leaf.clone());
        let right = arena.len();
        arena.push(leaf);

        arena[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: NodeIndex::new(left),
            right: NodeIndex::new(right),
        };

        stack.push(Pending {
            slot: right,
            rows: right_rows,
            depth: depth + 1,
        });
        stack.push(Pending {
            slot: left,
            rows: left_rows,
            depth: depth + 1,
        });
    }

    arena
}

/// Index of the largest count; ties go to the smallest index.
pub(crate) fn majority(counts: &[usize]) -> usize {
    let mut best = 0usize;
    for (idx, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = idx;
        }
    }
    best
}
