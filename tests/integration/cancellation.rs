//! Integration test: cooperative cancellation stops scans at the next step
//! and still flushes whatever was already queued for deletion.

use std::time::Duration;

use keysweep_engine::EngineConfig;
use keysweep_integration_tests::{TestDeployment, init_tracing};
use keysweep_types::ShardStatus;

#[tokio::test]
async fn test_cancel_mid_clear_flushes_queued_keys() {
    init_tracing();
    let mut d = TestDeployment::new(2);
    for i in 0..d.len() {
        d = d.with_faults(i, |f| f.latency(1, 3).seed(i as u64));
    }
    d.seed_on(0, "bulk", 1000);
    d.seed_on(1, "bulk", 1000);

    let engine = d.engine(EngineConfig {
        scan_page_hint: Some(10),
        ..EngineConfig::default()
    });

    let (report, ()) = tokio::join!(engine.clear("bulk:*"), async {
        tokio::time::sleep(Duration::from_millis(30)).await;
        engine.cancel();
    });
    let report = report.unwrap();

    for i in 0..d.len() {
        let outcome = report.get(&d.id(i)).unwrap();
        assert_eq!(outcome.status, ShardStatus::Cancelled);
        // Everything scanned before the cancel was deleted.
        assert_eq!(outcome.count, outcome.matched);
        let left = d.matching_on(i, "bulk:*") as u64;
        assert!(left > 0, "shard {i} finished before the cancel");
        assert_eq!(outcome.count + left, 1000);
    }
}

#[tokio::test]
async fn test_cancel_is_sticky_for_later_operations() {
    init_tracing();
    let d = TestDeployment::new(2);
    d.seed_round_robin("k", 50);
    let engine = d.engine(EngineConfig::default());

    engine.cancel();
    let counted = engine.count("k:*").await;
    assert_eq!(counted.len(), 2);
    assert!(counted.iter().all(|(_, o)| o.status == ShardStatus::Cancelled));
    assert_eq!(engine.clear("k:*").await.unwrap().total(), 0);
    assert_eq!(d.matching("k:*"), 50);
}
