//! Criterion benchmarks for grove-rf: tree and forest training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use grove_rf::{DecisionTree, DecisionTreeConfig, RandomForestConfig};

fn make_classification(
    n_samples: usize,
    n_features: usize,
    n_classes: usize,
    seed: u64,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        let row: Vec<f64> = (0..n_features)
            .map(|f| {
                let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
                base + rng.r#gen::<f64>() * 0.5
            })
            .collect();
        features.push(row);
    }
    (features, labels)
}

fn bench_tree_fit(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let config = DecisionTreeConfig::new().with_seed(42);

    c.bench_function("tree_fit_500x20_5class", |b| {
        b.iter(|| {
            let mut tree = DecisionTree::new(config.clone()).unwrap();
            tree.fit(&features, &labels).unwrap();
            tree
        });
    });
}

fn bench_forest_fit(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let config = RandomForestConfig::new(50)
        .unwrap()
        .with_max_features(Some(5))
        .with_seed(42);

    c.bench_function("forest_fit_500x20_5class_50trees", |b| {
        b.iter(|| {
            let mut forest = config.clone().build().unwrap();
            forest.fit(&features, &labels).unwrap();
            forest
        });
    });
}

fn bench_forest_predict(c: &mut Criterion) {
    let (features, labels) = make_classification(500, 20, 5, 42);
    let mut forest = RandomForestConfig::new(50)
        .unwrap()
        .with_seed(42)
        .build()
        .unwrap();
    forest.fit(&features, &labels).unwrap();

    c.bench_function("forest_predict_500x20_50trees", |b| {
        b.iter(|| forest.predict(&features).unwrap());
    });
}

criterion_group!(benches, bench_tree_fit, bench_forest_fit, bench_forest_predict);
criterion_main!(benches);
