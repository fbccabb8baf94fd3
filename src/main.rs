use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use grove_io::{LabeledCsvReader, LabeledDataset, sum_threshold, train_test_split};
use grove_rf::{ConfusionMatrix, RandomForest, RandomForestConfig};

#[derive(Parser)]
#[command(name = "grove")]
#[command(about = "Decision tree and random forest classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared hyperparameters for the Random Forest.
#[derive(Args, Debug, Clone)]
struct ForestArgs {
    /// Number of trees in the Random Forest
    #[arg(long, default_value_t = 10)]
    n_trees: usize,

    /// Maximum tree depth (the root is depth 0)
    #[arg(long, default_value_t = 10)]
    max_depth: usize,

    /// Minimum number of samples required to split a node
    #[arg(long, default_value_t = 2)]
    min_samples_split: usize,

    /// Features considered per split (all if not set)
    #[arg(long)]
    max_features: Option<usize>,

    /// Also report out-of-bag accuracy on the training set
    #[arg(long, default_value_t = false)]
    oob: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Train and score a forest on the synthetic sum-threshold dataset
    Demo {
        /// Number of generated samples
        #[arg(long, default_value_t = 1000)]
        samples: usize,

        /// Number of generated features
        #[arg(long, default_value_t = 5)]
        features: usize,

        /// Fraction of samples held out for testing
        #[arg(long, default_value_t = 0.2)]
        test_fraction: f64,

        #[command(flatten)]
        forest: ForestArgs,
    },

    /// Train a forest on a labeled CSV file and optionally score a test file
    Fit {
        /// Path to the training CSV file
        #[arg(long)]
        train: PathBuf,

        /// Path to a held-out CSV file with the same columns
        #[arg(long)]
        test: Option<PathBuf>,

        /// Name of the label column
        #[arg(long, default_value = "label")]
        label_column: String,

        #[command(flatten)]
        forest: ForestArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct DemoOutput {
    n_samples: usize,
    n_features: usize,
    n_train: usize,
    n_test: usize,
    accuracy: f64,
    oob_accuracy: Option<f64>,
    model: ModelOutput,
    classes: Vec<ClassOutput>,
}

#[derive(Serialize)]
struct FitOutput {
    train_path: PathBuf,
    n_train: usize,
    n_features: usize,
    feature_names: Vec<String>,
    train_accuracy: f64,
    oob_accuracy: Option<f64>,
    test: Option<TestOutput>,
    model: ModelOutput,
}

#[derive(Serialize)]
struct TestOutput {
    path: PathBuf,
    n_test: usize,
    accuracy: f64,
    classes: Vec<ClassOutput>,
}

#[derive(Serialize)]
struct ModelOutput {
    n_trees: usize,
    n_classes: usize,
    mean_depth: f64,
    max_depth: usize,
    mean_nodes: f64,
}

#[derive(Serialize)]
struct ClassOutput {
    label: usize,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

fn build_forest(args: &ForestArgs, seed: u64) -> Result<RandomForest> {
    RandomForestConfig::new(args.n_trees)
        .context("invalid forest configuration")?
        .with_max_depth(args.max_depth)
        .with_min_samples_split(args.min_samples_split)
        .with_max_features(args.max_features)
        .with_seed(seed)
        .build()
        .context("invalid forest configuration")
}

fn fit_forest(args: &ForestArgs, seed: u64, train: &LabeledDataset) -> Result<RandomForest> {
    let mut forest = build_forest(args, seed)?;
    forest
        .fit(train.features(), train.labels())
        .context("random forest training failed")?;
    Ok(forest)
}

fn oob_report(
    args: &ForestArgs,
    forest: &RandomForest,
    train: &LabeledDataset,
) -> Result<Option<f64>> {
    if !args.oob {
        return Ok(None);
    }
    let score = forest
        .oob_score(train.features(), train.labels())
        .context("OOB evaluation failed")?;
    info!(
        oob_accuracy = score.accuracy,
        n_oob_samples = score.n_oob_samples,
        "OOB evaluation complete"
    );
    Ok(Some(score.accuracy))
}

fn score(forest: &RandomForest, data: &LabeledDataset) -> Result<ConfusionMatrix> {
    let predictions = forest.predict(data.features()).context("prediction failed")?;
    ConfusionMatrix::from_labels(data.labels(), &predictions).context("scoring failed")
}

fn model_summary(forest: &RandomForest) -> ModelOutput {
    let trees = forest.trees();
    let n = trees.len().max(1) as f64;
    ModelOutput {
        n_trees: trees.len(),
        n_classes: forest.classes().len(),
        mean_depth: trees.iter().map(|t| t.depth() as f64).sum::<f64>() / n,
        max_depth: trees.iter().map(|t| t.depth()).max().unwrap_or(0),
        mean_nodes: trees.iter().map(|t| t.n_nodes() as f64).sum::<f64>() / n,
    }
}

fn class_summary(confusion: &ConfusionMatrix) -> Vec<ClassOutput> {
    confusion
        .class_metrics()
        .into_iter()
        .map(|m| ClassOutput {
            label: m.label,
            precision: m.precision,
            recall: m.recall,
            f1: m.f1,
            support: m.support,
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Demo {
            samples,
            features,
            test_fraction,
            forest: forest_args,
        } => {
            let dataset = sum_threshold(samples, features, cli.seed);
            let (train, test) = train_test_split(&dataset, test_fraction, cli.seed)
                .context("failed to split dataset")?;
            info!(
                n_train = train.n_samples(),
                n_test = test.n_samples(),
                "generated sum-threshold dataset"
            );

            let forest = fit_forest(&forest_args, cli.seed, &train)?;
            let oob_accuracy = oob_report(&forest_args, &forest, &train)?;
            let confusion = score(&forest, &test)?;
            info!(accuracy = confusion.accuracy(), "holdout evaluation complete");

            let output = DemoOutput {
                n_samples: samples,
                n_features: features,
                n_train: train.n_samples(),
                n_test: test.n_samples(),
                accuracy: confusion.accuracy(),
                oob_accuracy,
                model: model_summary(&forest),
                classes: class_summary(&confusion),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Fit {
            train: train_path,
            test: test_path,
            label_column,
            forest: forest_args,
        } => {
            let train = LabeledCsvReader::new(&train_path)
                .with_label_column(label_column.as_str())
                .read()
                .context("failed to read training CSV")?;

            let forest = fit_forest(&forest_args, cli.seed, &train)?;
            let oob_accuracy = oob_report(&forest_args, &forest, &train)?;
            let train_accuracy = score(&forest, &train)?.accuracy();

            let test = match test_path {
                Some(path) => {
                    let data = LabeledCsvReader::new(&path)
                        .with_label_column(label_column.as_str())
                        .read()
                        .context("failed to read test CSV")?;
                    if data.feature_names() != train.feature_names() {
                        anyhow::bail!(
                            "test columns {:?} do not match training columns {:?}",
                            data.feature_names(),
                            train.feature_names()
                        );
                    }
                    let confusion = score(&forest, &data)?;
                    info!(accuracy = confusion.accuracy(), "test evaluation complete");
                    Some(TestOutput {
                        path,
                        n_test: data.n_samples(),
                        accuracy: confusion.accuracy(),
                        classes: class_summary(&confusion),
                    })
                }
                None => None,
            };

            let output = FitOutput {
                train_path,
                n_train: train.n_samples(),
                n_features: train.n_features(),
                feature_names: train.feature_names().to_vec(),
                train_accuracy,
                oob_accuracy,
                test,
                model: model_summary(&forest),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
