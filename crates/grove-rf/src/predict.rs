//! Prediction methods for the Random Forest ensemble.

use rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::dataset::check_width;
use crate::error::RfError;
use crate::forest::RandomForest;

/// Per-label vote counts for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTally {
    /// `(label, votes)` pairs in ascending label order, zero counts omitted.
    votes: Vec<(usize, usize)>,
    n_trees: usize,
}

impl VoteTally {
    pub(crate) fn from_predictions(mut predictions: Vec<usize>) -> Self {
        let n_trees = predictions.len();
        predictions.sort_unstable();
        let mut votes: Vec<(usize, usize)> = Vec::new();
        for label in predictions {
            match votes.last_mut() {
                Some((last, count)) if *last == label => *count += 1,
                _ => votes.push((label, 1)),
            }
        }
        Self { votes, n_trees }
    }

    /// Return the majority label; ties go to the smallest label.
    ///
    /// `None` only for an empty tally.
    #[must_use]
    pub fn winner(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for &(label, count) in &self.votes {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((label, count));
            }
        }
        best.map(|(label, _)| label)
    }

    /// Return the number of votes cast for `label`.
    #[must_use]
    pub fn votes_for(&self, label: usize) -> usize {
        self.votes
            .binary_search_by_key(&label, |&(l, _)| l)
            .map_or(0, |i| self.votes[i].1)
    }

    /// Return the share of trees that voted for `label`.
    #[must_use]
    pub fn fraction(&self, label: usize) -> f64 {
        if self.n_trees == 0 {
            return 0.0;
        }
        self.votes_for(label) as f64 / self.n_trees as f64
    }

    /// Return the top-k labels by vote count, ties broken by smaller label.
    #[must_use]
    pub fn top_k(&self, k: usize) -> Vec<(usize, usize)> {
        let mut ranked = self.votes.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(k);
        ranked
    }

    /// Return the `(label, votes)` pairs in ascending label order.
    #[must_use]
    pub fn as_slice(&self) -> &[(usize, usize)] {
        &self.votes
    }

    /// Return the number of trees that voted.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }
}

impl RandomForest {
    /// Predict a label for every row by majority vote across trees.
    ///
    /// Rows are processed in parallel; the output has one label per input
    /// row, in input order.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                              |
    /// |------------------------------------------|-----------------------------------|
    /// | [`RfError::NotFitted`]                   | called before a successful `fit`  |
    /// | [`RfError::PredictionFeatureMismatch`]   | a row width differs from training |
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<usize>, RfError> {
        self.ensemble()?;
        features
            .into_par_iter()
            .map(|sample| self.predict_one(sample))
            .collect()
    }

    /// Predict the label for a single sample.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn predict_one(&self, sample: &[f64]) -> Result<usize, RfError> {
        let tally = self.tally(sample)?;
        // Unreachable: `tally` succeeds only on a fitted ensemble, which holds
        // at least one tree, so some label always has a vote.
        tally.winner().ok_or(RfError::NotFitted)
    }

    /// Collect every tree's vote for a single sample.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn tally(&self, sample: &[f64]) -> Result<VoteTally, RfError> {
        let ensemble = self.ensemble()?;
        check_width(sample, ensemble.n_features)?;
        let predictions = ensemble
            .trees
            .iter()
            .map(|tree| tree.predict_one(sample))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VoteTally::from_predictions(predictions))
    }

    /// Return vote tallies for a batch of samples in parallel.
    ///
    /// # Errors
    ///
    /// Same as [`predict`](Self::predict).
    pub fn tally_batch(&self, features: &[Vec<f64>]) -> Result<Vec<VoteTally>, RfError> {
        self.ensemble()?;
        features
            .into_par_iter()
            .map(|sample| self.tally(sample))
            .collect()
    }
}
