//! Integration test: counting matched keys across shards.

use keysweep_engine::EngineConfig;
use keysweep_integration_tests::{TestDeployment, init_tracing};
use keysweep_types::ShardStatus;

fn with_hint(hint: Option<u32>) -> EngineConfig {
    EngineConfig {
        scan_page_hint: hint,
        ..EngineConfig::default()
    }
}

/// The total is |S| no matter how S is spread or how small the pages are.
#[tokio::test]
async fn test_total_independent_of_distribution_and_page_hint() {
    init_tracing();

    type Pick = fn(usize) -> usize;
    let distributions: [(&str, Pick); 3] = [
        ("round-robin", |j| j),
        ("all on one", |_| 2),
        ("skewed", |j| if j % 10 == 0 { 0 } else { 1 }),
    ];

    for (name, pick) in distributions {
        let d = TestDeployment::new(4);
        d.seed_with("user", 437, pick);
        d.seed_round_robin("noise", 300);

        for hint in [None, Some(1), Some(3), Some(64), Some(10_000)] {
            let engine = d.engine(with_hint(hint));
            let report = engine.count("user:*").await;

            assert_eq!(report.len(), 4, "{name} / {hint:?}");
            assert_eq!(report.total(), 437, "{name} / {hint:?}");
            for i in 0..d.len() {
                assert_eq!(
                    report.count(&d.id(i)),
                    Some(d.matching_on(i, "user:*") as u64),
                    "{name} / {hint:?} / shard {i}"
                );
            }
            assert_eq!(report.degraded().count(), 0);
        }
    }
}

#[tokio::test]
async fn test_glob_classes_and_single_char_wildcards() {
    init_tracing();
    let d = TestDeployment::new(2);
    for key in ["job:1", "job:2", "job:9", "job:10", "jab:1", "job:a"] {
        d.store(0).insert(key);
        d.store(1).insert(key);
    }
    let engine = d.engine(EngineConfig::default());

    assert_eq!(engine.count("job:?").await.total(), 8);
    assert_eq!(engine.count("job:[1-2]").await.total(), 4);
    assert_eq!(engine.count("job:[^0-9]").await.total(), 2);
    assert_eq!(engine.count("j?b:1*").await.total(), 6);
}

/// An empty pattern reads the keyspace size and never scans.
#[tokio::test]
async fn test_empty_pattern_reports_keyspace_size() {
    init_tracing();
    let d = TestDeployment::new(3);
    d.seed_on(0, "a", 10);
    d.seed_on(1, "b", 0);
    d.seed_on(2, "c", 25);
    let engine = d.engine(EngineConfig::default());

    let report = engine.count("").await;
    assert_eq!(report.count(&d.id(0)), Some(10));
    assert_eq!(report.count(&d.id(1)), Some(0));
    assert_eq!(report.count(&d.id(2)), Some(25));
    for i in 0..d.len() {
        assert_eq!(d.store(i).scan_calls(), 0);
    }
}

#[tokio::test]
async fn test_keyspace_size_failure_is_per_shard() {
    init_tracing();
    let d = TestDeployment::new(2).with_faults(1, |f| f.fail_db_size());
    d.seed_on(0, "a", 4);
    d.seed_on(1, "a", 4);
    let engine = d.engine(EngineConfig::default());

    let report = engine.count("").await;
    assert_eq!(report.count(&d.id(0)), Some(4));
    let failed = report.get(&d.id(1)).unwrap();
    assert_eq!(failed.count, 0);
    assert!(matches!(failed.status, ShardStatus::Degraded(_)));
}

#[tokio::test]
async fn test_no_shard_reachable_yields_empty_report() {
    init_tracing();
    let d = TestDeployment::new(3)
        .with_faults(0, |f| f.fail_scan_after(0))
        .with_faults(1, |f| f.fail_scan_after(0))
        .with_faults(2, |f| f.fail_scan_after(0));
    d.seed_round_robin("k", 30);

    let engine = d.engine(EngineConfig::default());
    assert!(engine.count("k:*").await.is_empty());
}

/// Count reports what the scan yielded, so keys a store repeats across pages
/// are counted again.
#[tokio::test]
async fn test_repeated_keys_are_counted_as_yielded() {
    init_tracing();
    let d = TestDeployment::new(2).with_faults(0, |f| f.duplicate_keys());
    d.seed_on(0, "k", 30);
    d.seed_on(1, "k", 30);

    let report = d.engine(with_hint(Some(10))).count("k:*").await;
    assert_eq!(report.count(&d.id(0)), Some(30 + 20));
    assert_eq!(report.count(&d.id(1)), Some(30));
    assert_eq!(report.degraded().count(), 0);
}
