//! Labeled datasets for grove: CSV loading, synthetic generation, and
//! holdout splitting.

mod domain;
mod error;
pub mod holdout;
mod reader;
pub mod synthetic;

pub use domain::LabeledDataset;
pub use error::IoError;
pub use holdout::train_test_split;
pub use reader::LabeledCsvReader;
pub use synthetic::sum_threshold;
