use std::collections::BTreeMap;

use exu_collect::{Collector, Sampler};

fn configured(pairs: Vec<(&str, Sampler)>) -> Collector {
    let config: BTreeMap<String, Sampler> = pairs
        .into_iter()
        .map(|(name, sampler)| (name.to_string(), sampler))
        .collect();
    Collector::new(config, Sampler::identity())
}

#[test]
fn identity_stores_everything_in_order() {
    let mut collector = Collector::default();
    collector.set_idx(0);
    for i in 0..10 {
        collector.collect("data", (i * 2) as f64).unwrap();
    }
    let expected: Vec<f64> = (0..10).map(|i| (i * 2) as f64).collect();
    assert_eq!(collector.get("data", 0), expected.as_slice());
}

#[test]
fn window_reduces_to_per_window_means() {
    let mut collector = configured(vec![("a", Sampler::window(3))]);
    collector.set_idx(0);

    for v in [0.0, 1.0, 5.0, 3.0] {
        collector.collect("a", v).unwrap();
    }
    assert_eq!(collector.get("a", 0), &[2.0]);

    for v in [4.0, 5.0] {
        collector.collect("a", v).unwrap();
    }
    assert_eq!(collector.get("a", 0), &[2.0, 4.0]);
}

#[test]
fn subsample_keeps_every_third_observation() {
    let mut collector = configured(vec![("a", Sampler::subsample(3))]);
    collector.set_idx(0);

    for v in [0.0, 1.0, 2.0] {
        collector.collect("a", v).unwrap();
    }
    assert_eq!(collector.get("a", 0), &[0.0]);

    collector.collect("a", 3.0).unwrap();
    assert_eq!(collector.get("a", 0), &[0.0, 3.0]);
}

#[test]
fn switching_index_flushes_residuals_to_the_old_index() {
    let mut collector = configured(vec![("a", Sampler::window(3))]);
    collector.set_idx(0);
    for v in [0.0, 1.0, 5.0, 3.0] {
        collector.collect("a", v).unwrap();
    }

    collector.set_idx(1);
    // the half-full window [3.0] belongs to index 0
    assert_eq!(collector.get("a", 0), &[2.0, 3.0]);
    assert_eq!(collector.get("a", 1), &[] as &[f64]);

    collector.collect("a", 7.0).unwrap();
    collector.collect("a", 9.0).unwrap();
    collector.collect("a", 11.0).unwrap();
    assert_eq!(collector.get("a", 1), &[9.0]);
}

#[test]
fn end_run_flushes_the_final_index() {
    let mut collector = configured(vec![("a", Sampler::window(2))]);
    collector.set_idx(4);
    collector.collect("a", 6.0).unwrap();
    collector.end_run();
    assert_eq!(collector.get("a", 4), &[6.0]);
}

#[test]
fn ignored_names_are_silent_noops() {
    let mut collector = configured(vec![("skip", Sampler::ignore())]);
    collector.set_idx(0);
    collector.collect("skip", 1.0).unwrap();
    collector.collect("kept", 2.0).unwrap();
    assert_eq!(collector.get("skip", 0), &[] as &[f64]);
    assert_eq!(collector.get("kept", 0), &[2.0]);
    assert!(!collector.keys().contains("skip"));
}

#[test]
fn collecting_without_an_index_is_an_error() {
    let mut collector = Collector::default();
    let err = collector.collect("data", 1.0).unwrap_err();
    assert_eq!(err.info().code, "collect-no-idx");
}

#[test]
fn evaluate_skips_expensive_closures_off_tick() {
    let mut collector = configured(vec![("eval", Sampler::subsample(2))]);
    collector.set_idx(0);
    let mut calls = 0;
    for i in 0..4 {
        collector
            .evaluate("eval", || {
                calls += 1;
                i as f64
            })
            .unwrap();
    }
    assert_eq!(calls, 2);
    assert_eq!(collector.get("eval", 0), &[0.0, 2.0]);
}

#[test]
fn repeat_matches_individual_collects() {
    let mut bulk = configured(vec![("a", Sampler::window(3))]);
    let mut looped = configured(vec![("a", Sampler::window(3))]);
    bulk.set_idx(0);
    looped.set_idx(0);

    bulk.collect("a", 1.0).unwrap();
    looped.collect("a", 1.0).unwrap();

    bulk.repeat("a", 5.0, 8).unwrap();
    for _ in 0..8 {
        looped.collect("a", 5.0).unwrap();
    }

    assert_eq!(bulk.get("a", 0), looped.get("a", 0));
}

#[test]
fn collect_list_respects_reducer_state() {
    let mut collector = configured(vec![("a", Sampler::subsample(2))]);
    collector.set_idx(0);
    collector.collect_list("a", &[0.0, 1.0, 2.0, 3.0]).unwrap();
    assert_eq!(collector.get("a", 0), &[0.0, 2.0]);
}

#[test]
fn get_all_sorts_by_index() {
    let mut collector = Collector::default();
    collector.set_idx(5);
    collector.collect("r", 1.0).unwrap();
    collector.set_idx(2);
    collector.collect("r", 2.0).unwrap();

    let all = collector.get_all("r");
    let indices: Vec<u64> = all.keys().copied().collect();
    assert_eq!(indices, vec![2, 5]);
    assert_eq!(collector.indices().len(), 2);
}

#[test]
fn moving_average_state_survives_index_switches() {
    let mut collector = configured(vec![("err", Sampler::moving_average(0.5))]);
    collector.set_idx(0);
    collector.collect("err", 1.0).unwrap();
    collector.set_idx(1);
    collector.collect("err", 1.0).unwrap();
    // z carried over from the previous run: 0.5, then 0.75
    assert_eq!(collector.get("err", 1), &[0.75]);
}
