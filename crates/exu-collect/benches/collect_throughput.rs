use std::collections::BTreeMap;

use criterion::{criterion_group, criterion_main, Criterion};
use exu_collect::{Collector, Sampler};

fn sample_collector() -> Collector {
    let mut config = BTreeMap::new();
    config.insert("return".to_string(), Sampler::window(100));
    config.insert("reward".to_string(), Sampler::subsample(100));
    config.insert("error".to_string(), Sampler::moving_average(0.99));
    Collector::new(config, Sampler::identity())
}

fn bench_collect(c: &mut Criterion) {
    c.bench_function("collect_stream", |b| {
        b.iter(|| {
            let mut collector = sample_collector();
            collector.set_idx(0);
            for step in 0..10_000 {
                collector.collect("return", step as f64).unwrap();
                collector.collect("reward", 1.0).unwrap();
                collector.collect("error", 0.5).unwrap();
            }
            collector.end_run();
            collector
        })
    });
}

fn bench_repeat(c: &mut Criterion) {
    c.bench_function("repeat_bulk_window", |b| {
        b.iter(|| {
            let mut collector = sample_collector();
            collector.set_idx(0);
            collector.repeat("return", 1.0, 1_000_000).unwrap();
            collector
        })
    });
}

criterion_group!(benches, bench_collect, bench_repeat);
criterion_main!(benches);
