//! Integration test: one shard failing mid-scan leaves the others untouched.
//!
//! Three shards with 100 matching keys each. The middle shard's scan fails
//! after two steps of ten keys, so its result is the 20 keys seen before
//! the failure.

use keysweep_engine::EngineConfig;
use keysweep_integration_tests::{TestDeployment, init_tracing};
use keysweep_types::ShardStatus;

fn deployment() -> TestDeployment {
    let d = TestDeployment::new(3).with_faults(1, |f| f.fail_scan_after(2));
    for i in 0..d.len() {
        d.seed_on(i, "order", 100);
    }
    d
}

fn config() -> EngineConfig {
    EngineConfig {
        scan_page_hint: Some(10),
        ..EngineConfig::default()
    }
}

#[tokio::test]
async fn test_count_keeps_partial_progress() {
    init_tracing();
    let d = deployment();
    let engine = d.engine(config());

    let report = engine.count("order:*").await;
    assert_eq!(report.len(), 3);
    assert_eq!(report.count(&d.id(0)), Some(100));
    assert_eq!(report.count(&d.id(2)), Some(100));

    let partial = report.get(&d.id(1)).unwrap();
    assert_eq!(partial.count, 20);
    assert!(matches!(partial.status, ShardStatus::Degraded(_)));

    let degraded: Vec<_> = report.degraded().map(|(id, _)| id.clone()).collect();
    assert_eq!(degraded, vec![d.id(1)]);
}

#[tokio::test]
async fn test_clear_deletes_what_was_scanned() {
    init_tracing();
    let d = deployment();
    let engine = d.engine(config());

    let report = engine.clear("order:*").await.unwrap();
    assert_eq!(report.count(&d.id(0)), Some(100));
    assert_eq!(report.count(&d.id(2)), Some(100));

    let partial = report.get(&d.id(1)).unwrap();
    assert_eq!(partial.matched, 20);
    assert_eq!(partial.count, 20);
    assert!(matches!(partial.status, ShardStatus::Degraded(_)));

    assert_eq!(d.matching_on(0, "order:*"), 0);
    assert_eq!(d.matching_on(1, "order:*"), 80);
    assert_eq!(d.matching_on(2, "order:*"), 0);
}

#[tokio::test]
async fn test_slow_shard_does_not_hold_back_results() {
    init_tracing();
    let d = TestDeployment::new(3).with_faults(0, |f| f.latency(2, 4).seed(3));
    d.seed_round_robin("evt", 600);

    let engine = d.engine(EngineConfig {
        scan_page_hint: Some(25),
        delete_batch_size: 50,
        key_queue_capacity: 8,
    });

    let report = engine.clear("evt:*").await.unwrap();
    assert_eq!(report.total(), 600);
    assert_eq!(report.degraded().count(), 0);
    assert_eq!(d.matching("evt:*"), 0);
}
