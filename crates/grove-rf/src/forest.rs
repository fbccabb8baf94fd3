//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::{RandomForestConfig, Seed};
use crate::dataset::{check_training_set, distinct_labels};
use crate::error::RfError;
use crate::tree::DecisionTree;

/// A bagged ensemble of decision trees voting on each sample.
///
/// Created unfitted from a [`RandomForestConfig`]. Every call to
/// [`fit`](Self::fit) throws away the previous ensemble and grows
/// `n_trees` fresh trees, each on its own bootstrap resample.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub(crate) config: RandomForestConfig,
    pub(crate) ensemble: Option<Ensemble>,
}

#[derive(Debug, Clone)]
pub(crate) struct Ensemble {
    pub(crate) trees: Vec<DecisionTree>,
    /// Row indices drawn for each tree, in draw order.
    pub(crate) bags: Vec<Vec<usize>>,
    pub(crate) n_samples: usize,
    pub(crate) n_features: usize,
    pub(crate) classes: Vec<usize>,
}

/// Draw `n_samples` row indices uniformly with replacement.
fn bootstrap_sample(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

impl RandomForest {
    /// Create an unfitted forest.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                        |
    /// |----------------------------------|-----------------------------|
    /// | [`RfError::InvalidMaxDepth`]     | `max_depth` is 0            |
    /// | [`RfError::InvalidMaxFeatures`]  | `max_features` is `Some(0)` |
    pub fn new(config: RandomForestConfig) -> Result<Self, RfError> {
        config.tree.validate()?;
        Ok(Self {
            config,
            ensemble: None,
        })
    }

    /// Fit the ensemble, replacing any previous one.
    ///
    /// A master stream seeded from the forest seed hands out one seed per
    /// tree. Each tree then draws its bootstrap bag and its own split seed
    /// from that stream, so the result does not depend on how rayon
    /// schedules the trees. The first failing tree aborts the fit and the
    /// forest is left unfitted.
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
    #[instrument(skip_all, fields(n_trees = self.config.n_trees, n_samples = features.len()))]
    pub fn fit(&mut self, features: &[Vec<f64>], labels: &[usize]) -> Result<(), RfError> {
        self.ensemble = None;

        let n_features = check_training_set(features, labels)?;
        let n_samples = features.len();
        let classes = distinct_labels(labels);

        info!(
            n_trees = self.config.n_trees,
            n_samples,
            n_features,
            n_classes = classes.len(),
            "training random forest"
        );

        let mut master_rng = self.config.seed.rng();
        let tree_seeds: Vec<u64> = (0..self.config.n_trees)
            .map(|_| master_rng.r#gen())
            .collect();

        let tree_config = &self.config.tree;
        let grown: Vec<(DecisionTree, Vec<usize>)> = tree_seeds
            .into_par_iter()
            .enumerate()
            .map(|(tree_idx, seed)| -> Result<(DecisionTree, Vec<usize>), RfError> {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let bag = bootstrap_sample(n_samples, &mut rng);

                let boot_features: Vec<Vec<f64>> =
                    bag.iter().map(|&i| features[i].clone()).collect();
                let boot_labels: Vec<usize> = bag.iter().map(|&i| labels[i]).collect();

                let mut tree = DecisionTree::new(
                    tree_config.clone().with_seed(Seed::Fixed(rng.r#gen())),
                )?;
                tree.fit(&boot_features, &boot_labels)?;

                debug!(
                    tree_idx,
                    n_nodes = tree.n_nodes(),
                    depth = tree.depth(),
                    "tree fitted"
                );
                Ok((tree, bag))
            })
            .collect::<Result<_, _>>()?;

        let (trees, bags): (Vec<DecisionTree>, Vec<Vec<usize>>) = grown.into_iter().unzip();

        info!(n_trees_trained = trees.len(), "random forest training complete");

        self.ensemble = Some(Ensemble {
            trees,
            bags,
            n_samples,
            n_features,
            classes,
        });
        Ok(())
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &RandomForestConfig {
        &self.config
    }

    /// Return `true` once `fit` has succeeded.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.ensemble.is_some()
    }

    /// Return the fitted trees in ensemble order; empty before `fit`.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        self.ensemble
            .as_ref()
            .map(|e| e.trees.as_slice())
            .unwrap_or_default()
    }

    /// Return each tree's bootstrap row indices; empty before `fit`.
    #[must_use]
    pub fn bags(&self) -> &[Vec<usize>] {
        self.ensemble
            .as_ref()
            .map(|e| e.bags.as_slice())
            .unwrap_or_default()
    }

    /// Return the number of trees in the fitted ensemble.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees().len()
    }

    /// Return the number of features seen at fit time, if fitted.
    #[must_use]
    pub fn n_features(&self) -> Option<usize> {
        self.ensemble.as_ref().map(|e| e.n_features)
    }

    /// Return the sorted distinct labels seen at fit time.
    #[must_use]
    pub fn classes(&self) -> &[usize] {
        self.ensemble
            .as_ref()
            .map(|e| e.classes.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn ensemble(&self) -> Result<&Ensemble, RfError> {
        self.ensemble.as_ref().ok_or(RfError::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::DecisionTreeConfig;

    /// Generate a simple 3-class separable dataset.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for class in 0..3 {
            for i in 0..20 {
                features.push(vec![class as f64 * 10.0 + i as f64 * 0.15, 0.5]);
                labels.push(class);
            }
        }
        (features, labels)
    }

    fn fitted(config: RandomForestConfig, features: &[Vec<f64>], labels: &[usize]) -> RandomForest {
        let mut forest = RandomForest::new(config).unwrap();
        forest.fit(features, labels).unwrap();
        forest
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels) = make_separable_data();
        let forest = fitted(RandomForestConfig::new(25).unwrap(), &features, &labels);
        let predictions = forest.predict(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(&p, &l)| p == l)
            .count();
        let accuracy = correct as f64 / labels.len() as f64;
        assert!(accuracy > 0.9, "accuracy = {accuracy}");
    }

    #[test]
    fn bags_are_full_size_with_replacement() {
        let (features, labels) = make_separable_data();
        let forest = fitted(RandomForestConfig::new(8).unwrap(), &features, &labels);
        assert_eq!(forest.bags().len(), 8);
        for bag in forest.bags() {
            assert_eq!(bag.len(), features.len());
            assert!(bag.iter().all(|&i| i < features.len()));
        }
        // 60 draws from 60 rows without a single repeat is vanishingly unlikely.
        let mut first = forest.bags()[0].clone();
        first.sort_unstable();
        first.dedup();
        assert!(first.len() < features.len());
    }

    #[test]
    fn bags_differ_between_trees() {
        let (features, labels) = make_separable_data();
        let forest = fitted(RandomForestConfig::new(2).unwrap(), &features, &labels);
        assert_ne!(forest.bags()[0], forest.bags()[1]);
    }

    #[test]
    fn trees_share_hyperparameters_but_not_seeds() {
        let (features, labels) = make_separable_data();
        let config = RandomForestConfig::new(4)
            .unwrap()
            .with_max_depth(3)
            .with_min_samples_split(4)
            .with_max_features(Some(1));
        let forest = fitted(config, &features, &labels);
        let seeds: Vec<Seed> = forest.trees().iter().map(|t| t.config().seed()).collect();
        for tree in forest.trees() {
            assert_eq!(tree.config().max_depth(), 3);
            assert_eq!(tree.config().min_samples_split(), 4);
            assert_eq!(tree.config().max_features(), Some(1));
            assert!(tree.depth() <= 3);
        }
        assert!(seeds.windows(2).all(|w| w[0] != w[1]));
    }

    #[test]
    fn single_tree_forest_matches_plain_tree_on_same_bag() {
        let (features, labels) = make_separable_data();
        let config = RandomForestConfig::new(1)
            .unwrap()
            .with_max_depth(4)
            .with_min_samples_split(3)
            .with_seed(17);
        let forest = fitted(config, &features, &labels);

        let bag = &forest.bags()[0];
        let boot_features: Vec<Vec<f64>> = bag.iter().map(|&i| features[i].clone()).collect();
        let boot_labels: Vec<usize> = bag.iter().map(|&i| labels[i]).collect();
        let tree_config = DecisionTreeConfig::new()
            .with_max_depth(4)
            .with_min_samples_split(3)
            .with_seed(forest.trees()[0].config().seed());
        let mut tree = DecisionTree::new(tree_config).unwrap();
        tree.fit(&boot_features, &boot_labels).unwrap();

        let queries: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64 * 0.6, 0.5]).collect();
        assert_eq!(forest.predict(&queries).unwrap(), tree.predict(&queries).unwrap());
        assert_eq!(forest.trees()[0].nodes(), tree.nodes());
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels) = make_separable_data();
        let config = RandomForestConfig::new(10)
            .unwrap()
            .with_max_features(Some(1))
            .with_seed(99);
        let a = fitted(config.clone(), &features, &labels);
        let b = fitted(config, &features, &labels);
        assert_eq!(a.bags(), b.bags());
        assert_eq!(a.predict(&features).unwrap(), b.predict(&features).unwrap());
    }

    #[test]
    fn refit_rebuilds_ensemble() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(RandomForestConfig::new(3).unwrap()).unwrap();
        forest.fit(&features, &labels).unwrap();
        let relabeled = vec![4usize; labels.len()];
        forest.fit(&features, &relabeled).unwrap();
        assert_eq!(forest.n_trees(), 3);
        assert_eq!(forest.classes(), &[4]);
        assert!(forest.predict(&features).unwrap().iter().all(|&p| p == 4));
    }

    #[test]
    fn failed_fit_discards_previous_ensemble() {
        let (features, labels) = make_separable_data();
        let mut forest = RandomForest::new(RandomForestConfig::new(3).unwrap()).unwrap();
        forest.fit(&features, &labels).unwrap();
        let err = forest.fit(&features, &labels[1..]).unwrap_err();
        assert!(matches!(err, RfError::LabelCountMismatch { .. }));
        assert!(!forest.is_fitted());
        assert!(matches!(forest.predict(&features), Err(RfError::NotFitted)));
    }

    #[test]
    fn invalid_tree_config_rejected_at_construction() {
        let err = RandomForest::new(RandomForestConfig::new(5).unwrap().with_max_depth(0))
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxDepth { .. }));
        let err = RandomForestConfig::new(5)
            .unwrap()
            .with_max_features(Some(0))
            .build()
            .unwrap_err();
        assert!(matches!(err, RfError::InvalidMaxFeatures { .. }));
    }

    #[test]
    fn empty_dataset_error() {
        let mut forest = RandomForest::new(RandomForestConfig::new(10).unwrap()).unwrap();
        let err = forest.fit(&[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }

    #[test]
    fn bootstrap_draws_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let bag = bootstrap_sample(5, &mut rng);
        assert_eq!(bag.len(), 5);
        assert!(bag.iter().all(|&i| i < 5));
    }
}
