//! Configuration builders for tree and forest training.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::RfError;
use crate::forest::RandomForest;
use crate::tree::DecisionTreeConfig;

/// Source of randomness for feature subsampling and bootstrap draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    /// Reproducible stream seeded from the given value.
    Fixed(u64),
    /// Seeded from OS entropy; results differ from run to run.
    Entropy,
}

impl Seed {
    /// Build the ChaCha stream this seed describes.
    pub(crate) fn rng(self) -> ChaCha8Rng {
        match self {
            Seed::Fixed(seed) => ChaCha8Rng::seed_from_u64(seed),
            Seed::Entropy => ChaCha8Rng::from_entropy(),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Fixed(42)
    }
}

impl From<u64> for Seed {
    fn from(seed: u64) -> Self {
        Seed::Fixed(seed)
    }
}

/// Configuration for Random Forest training.
///
/// Construct via [`RandomForestConfig::new`], then chain `with_*` methods.
/// Every tree in the ensemble shares the same hyperparameters; only its
/// bootstrap sample and random stream differ.
///
/// # Defaults
///
/// | Parameter           | Default            |
/// |---------------------|--------------------|
/// | `max_depth`         | 10                 |
/// | `min_samples_split` | 2                  |
/// | `max_features`      | `None` (all)       |
/// | `seed`              | `Seed::Fixed(42)`  |
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) tree: DecisionTreeConfig,
    pub(crate) seed: Seed,
}

impl RandomForestConfig {
    /// Create a new config with the given number of trees.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            tree: DecisionTreeConfig::new(),
            seed: Seed::default(),
        })
    }

    // --- Setters ---

    /// Set the maximum depth of every tree (root is depth 0).
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.tree = self.tree.with_max_depth(max_depth);
        self
    }

    /// Set the minimum number of samples required to attempt a split.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.tree = self.tree.with_min_samples_split(min_samples_split);
        self
    }

    /// Set the cap on features considered per split. `None` means all.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.tree = self.tree.with_max_features(max_features);
        self
    }

    /// Set the master seed from which every tree's stream is derived.
    #[must_use]
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = seed.into();
        self
    }

    // --- Getters ---

    /// Return the number of trees.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the hyperparameters shared by every tree.
    ///
    /// The per-tree seed is assigned at fit time and is not part of this value.
    #[must_use]
    pub fn tree_config(&self) -> &DecisionTreeConfig {
        &self.tree
    }

    /// Return the master seed.
    #[must_use]
    pub fn seed(&self) -> Seed {
        self.seed
    }

    /// Validate the configuration and build an unfitted forest.
    ///
    /// # Errors
    ///
    /// Same as [`RandomForest::new`].
    pub fn build(self) -> Result<RandomForest, RfError> {
        RandomForest::new(self)
    }
}
