use criterion::{black_box, criterion_group, criterion_main, Criterion};
use feature_engine::Reading;
use inference_engine::{LabelDecoder, ModelArtifact, RiskClassifier, TreeEnsemble};
use std::sync::Arc;

const FOREST: &str = r#"{
    "n_classes": 3,
    "estimators": [{
        "name": "rf",
        "trees": [{"nodes": [
            {"type": "split", "feature": 7, "threshold": 0.3, "left": 1, "right": 2},
            {"type": "leaf", "value": [0, 9, 1]},
            {"type": "split", "feature": 2, "threshold": 0.6, "left": 3, "right": 4},
            {"type": "leaf", "value": [2, 1, 7]},
            {"type": "leaf", "value": [8, 0, 2]}
        ]}]
    }]
}"#;

fn classifier() -> RiskClassifier {
    let ensemble: TreeEnsemble = serde_json::from_str(FOREST).unwrap();
    ensemble.validate().unwrap();
    let decoder = LabelDecoder::from_labels(&["high", "low", "medium"]).unwrap();
    RiskClassifier::new(Arc::new(ModelArtifact::new(
        "bench",
        Arc::new(ensemble),
        decoder,
        None,
    )))
}

fn bench_classify(c: &mut Criterion) {
    let classifier = classifier();
    let ensemble_reading = Reading::new(220.0, 6.1, 0.55, 30);
    let override_reading = Reading::new(400.0, 4.0, 0.9, 100);

    c.bench_function("classify_ensemble", |b| {
        b.iter(|| classifier.classify(black_box(&ensemble_reading)))
    });
    c.bench_function("classify_override", |b| {
        b.iter(|| classifier.classify(black_box(&override_reading)))
    });
}

criterion_group!(benches, bench_classify);
criterion_main!(benches);
