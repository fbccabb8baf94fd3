//! Out-of-bag (OOB) evaluation for Random Forest.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::confusion::ConfusionMatrix;
use crate::dataset::check_width;
use crate::error::RfError;
use crate::forest::RandomForest;
use crate::predict::VoteTally;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone)]
pub struct OobScore {
    /// Fraction of OOB-evaluated samples predicted correctly.
    pub accuracy: f64,
    /// Confusion matrix over the OOB-evaluated samples only.
    pub confusion: ConfusionMatrix,
    /// Number of samples that had at least one OOB tree.
    pub n_oob_samples: usize,
}

impl RandomForest {
    /// Score the forest on its own training rows using out-of-bag votes.
    ///
    /// Each row is predicted only by the trees whose bootstrap bag did not
    /// draw it, with ties going to the smallest label. Rows drawn by every
    /// tree are skipped. `features` and `labels` must be the exact set the
    /// forest was fitted on.
    ///
    /// # Errors
    ///
    /// | Variant                                  | When                                    |
    /// |------------------------------------------|-----------------------------------------|
    /// | [`RfError::NotFitted`]                   | called before a successful `fit`        |
    /// | [`RfError::LabelCountMismatch`]          | `labels.len() != features.len()`        |
    /// | [`RfError::OobEvaluationFailed`]         | row count differs from training, or no row has an OOB tree |
    /// | [`RfError::PredictionFeatureMismatch`]   | a row width differs from training       |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn oob_score(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<OobScore, RfError> {
        let ensemble = self.ensemble()?;
        if labels.len() != features.len() {
            return Err(RfError::LabelCountMismatch {
                n_samples: features.len(),
                n_labels: labels.len(),
            });
        }
        if features.len() != ensemble.n_samples {
            return Err(RfError::OobEvaluationFailed {
                reason: format!(
                    "forest was fitted on {} rows, got {}",
                    ensemble.n_samples,
                    features.len()
                ),
            });
        }

        let in_bag: Vec<Vec<bool>> = ensemble
            .bags
            .iter()
            .map(|bag| {
                let mut mask = vec![false; ensemble.n_samples];
                for &i in bag {
                    mask[i] = true;
                }
                mask
            })
            .collect();

        let votes: Vec<Option<usize>> = (0..features.len())
            .into_par_iter()
            .map(|row| -> Result<Option<usize>, RfError> {
                check_width(&features[row], ensemble.n_features)?;
                let predictions = ensemble
                    .trees
                    .iter()
                    .zip(&in_bag)
                    .filter(|(_, mask)| !mask[row])
                    .map(|(tree, _)| tree.predict_one(&features[row]))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(VoteTally::from_predictions(predictions).winner())
            })
            .collect::<Result<_, _>>()?;

        let (truth, predicted): (Vec<usize>, Vec<usize>) = votes
            .iter()
            .zip(labels)
            .filter_map(|(vote, &label)| vote.map(|p| (label, p)))
            .unzip();

        if truth.is_empty() {
            return Err(RfError::OobEvaluationFailed {
                reason: "no sample has any OOB tree".to_string(),
            });
        }

        let confusion = ConfusionMatrix::from_labels(&truth, &predicted)?;
        let accuracy = confusion.accuracy();
        debug!(n_oob_samples = truth.len(), accuracy, "oob evaluation complete");

        Ok(OobScore {
            accuracy,
            confusion,
            n_oob_samples: truth.len(),
        })
    }
}
