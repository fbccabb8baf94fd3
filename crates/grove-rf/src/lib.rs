//! Decision trees and random forests for classification.
//!
//! Trees are grown greedily with information gain (Shannon entropy, natural
//! log) over every distinct feature value as a candidate threshold. A
//! [`RandomForest`] bags `n_trees` such trees, each on its own bootstrap
//! resample, trains them in parallel via rayon, and predicts by majority
//! vote. Out-of-bag scoring and a confusion matrix are provided for
//! evaluation.
//!
//! ```no_run
//! use grove_rf::RandomForestConfig;
//!
//! # fn main() -> Result<(), grove_rf::RfError> {
//! let features = vec![vec![0.1, 0.2], vec![0.9, 0.8], vec![0.2, 0.1], vec![0.8, 0.9]];
//! let labels = vec![0, 1, 0, 1];
//!
//! let mut forest = RandomForestConfig::new(10)?.with_max_depth(4).build()?;
//! forest.fit(&features, &labels)?;
//! let predictions = forest.predict(&features)?;
//! assert_eq!(predictions.len(), 4);
//! # Ok(())
//! # }
//! ```

mod config;
mod confusion;
mod dataset;
mod error;
mod forest;
mod node;
mod oob;
mod predict;
mod split;
mod tree;

pub use config::{RandomForestConfig, Seed};
pub use confusion::{ClassMetrics, ConfusionMatrix, accuracy};
pub use error::RfError;
pub use forest::RandomForest;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use oob::OobScore;
pub use predict::VoteTally;
pub use split::{Partition, entropy, information_gain, split};
pub use tree::{DecisionTree, DecisionTreeConfig};
