use criterion::{criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use exu_sweep::{count_permutations, decode};

fn sample_spec() -> Value {
    json!({
        "alpha": [1.0, 0.5, 0.25, 0.125, 0.0625],
        "lambda": [1.0, 0.99, 0.98, 0.96],
        "epsilon": [0.1, 0.05, 0.01],
        "optimizer": {
            "layers": [
                {"units": [16, 32, 64]},
                {"units": [8, 16]},
            ],
        },
    })
}

fn bench_decode(c: &mut Criterion) {
    let spec = sample_spec();
    let count = count_permutations(&spec);
    c.bench_function("decode_full_space", |b| {
        b.iter(|| {
            for idx in 0..count {
                let _ = decode(&spec, idx).unwrap();
            }
        })
    });
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
