//! End-to-end integration tests: CSV / synthetic data -> holdout -> forest.

use std::fmt::Write as _;
use std::fs;

use grove_io::{LabeledCsvReader, sum_threshold, train_test_split};
use grove_rf::{RandomForestConfig, accuracy};
use tempfile::TempDir;

#[test]
fn csv_round_trip_through_forest() {
    // 1. Write a synthetic dataset to CSV with the label first.
    let source = sum_threshold(240, 3, 5);
    let mut content = String::from("label,x0,x1,x2\n");
    for (row, label) in source.features().iter().zip(source.labels()) {
        writeln!(content, "{label},{},{},{}", row[0], row[1], row[2]).unwrap();
    }
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("train.csv");
    fs::write(&path, content).unwrap();

    // 2. Read it back.
    let dataset = LabeledCsvReader::new(&path).read().expect("CSV should parse");
    assert_eq!(dataset.n_samples(), 240);
    assert_eq!(dataset.feature_names(), source.feature_names());
    assert_eq!(dataset.labels(), source.labels());
    assert_eq!(dataset.features(), source.features());

    // 3. Hold out 25% and fit.
    let (train, test) = train_test_split(&dataset, 0.25, 42).unwrap();
    assert_eq!(test.n_samples(), 60);

    let mut forest = RandomForestConfig::new(15)
        .unwrap()
        .with_seed(42)
        .build()
        .unwrap();
    forest.fit(train.features(), train.labels()).unwrap();

    // 4. Predict on the holdout.
    let predictions = forest.predict(test.features()).unwrap();
    assert_eq!(predictions.len(), test.n_samples());
    assert!(predictions.iter().all(|p| forest.classes().contains(p)));
    let acc = accuracy(test.labels(), &predictions).unwrap();
    assert!(acc > 0.7, "holdout accuracy {acc} <= 0.7");
}

#[test]
fn demo_pipeline_is_reproducible() {
    let run = || {
        let dataset = sum_threshold(400, 5, 42);
        let (train, test) = train_test_split(&dataset, 0.2, 42).unwrap();
        let mut forest = RandomForestConfig::new(10)
            .unwrap()
            .with_seed(42)
            .build()
            .unwrap();
        forest.fit(train.features(), train.labels()).unwrap();
        forest.predict(test.features()).unwrap()
    };
    assert_eq!(run(), run());
}
