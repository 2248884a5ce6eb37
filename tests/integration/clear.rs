//! Integration test: clearing matched keys.

use std::sync::Arc;

use keysweep_engine::EngineConfig;
use keysweep_integration_tests::{TestDeployment, init_tracing};
use keysweep_types::{Key, ShardStatus};

/// Clear removes exactly the matched set; a second clear and a count both see 0.
#[tokio::test]
async fn test_clear_then_count_converges() {
    init_tracing();
    let d = TestDeployment::new(3);
    d.seed_with("session", 1777, |j| j * 7 / 3);
    d.seed_round_robin("user", 90);

    let engine = d.engine(EngineConfig::default());
    let expected: Vec<u64> = (0..3).map(|i| d.matching_on(i, "session:*") as u64).collect();

    let cleared = engine.clear("session:*").await.unwrap();
    for (i, want) in expected.iter().enumerate() {
        assert_eq!(cleared.count(&d.id(i)), Some(*want));
    }
    assert_eq!(cleared.total(), 1777);

    let recount = engine.count("session:*").await;
    assert_eq!(recount.len(), 3);
    assert_eq!(recount.total(), 0);

    let again = engine.clear("session:*").await.unwrap();
    assert_eq!(again.total(), 0);
    assert_eq!(again.degraded().count(), 0);

    assert_eq!(d.matching("user:*"), 90);
}

/// 500, 501 and 1000 matched keys take 1, 2 and 2 pipelines.
#[tokio::test]
async fn test_batch_boundaries() {
    init_tracing();
    for (matched, pipelines) in [(500, 1), (501, 2), (1000, 2)] {
        let d = TestDeployment::new(1);
        d.seed_on(0, "k", matched);
        d.seed_on(0, "other", 37);

        let engine = d.engine(EngineConfig::default());
        let report = engine.clear("k:*").await.unwrap();

        assert_eq!(report.total(), matched as u64, "matched = {matched}");
        assert_eq!(d.store(0).pipeline_calls(), pipelines, "matched = {matched}");
        assert_eq!(d.store(0).len(), 37);
    }
}

/// Keys removed by someone else between scan and delete count 0, not as errors.
#[tokio::test]
async fn test_concurrent_external_deletes_shrink_the_result() {
    init_tracing();
    let d = TestDeployment::new(2);
    let store = d.store(0).clone();
    let d = d.with_faults(0, move |f| {
        f.before_delete(Arc::new(move |keys: &[Key]| {
            // Another client wins the race for the first key of every batch.
            store.remove(&keys[0]);
        }))
    });
    d.seed_on(0, "tmp", 1200);
    d.seed_on(1, "tmp", 1200);

    let engine = d.engine(EngineConfig::default());
    let report = engine.clear("tmp:*").await.unwrap();

    let raced = report.get(&d.id(0)).unwrap();
    assert_eq!(raced.matched, 1200);
    assert_eq!(raced.count, 1197);
    assert_eq!(raced.status, ShardStatus::Complete);
    assert_eq!(report.count(&d.id(1)), Some(1200));
    assert_eq!(d.matching("tmp:*"), 0);
}

#[tokio::test]
async fn test_blank_pattern_is_refused() {
    init_tracing();
    let d = TestDeployment::new(2);
    d.seed_round_robin("k", 40);
    let engine = d.engine(EngineConfig::default());

    for pattern in ["", "   ", "\t\n"] {
        assert!(engine.clear(pattern).await.is_none());
    }
    assert_eq!(d.matching("*"), 40);
    for i in 0..d.len() {
        assert_eq!(d.store(i).scan_calls(), 0);
        assert_eq!(d.store(i).pipeline_calls(), 0);
    }
}

/// A failed pipeline costs that batch only.
#[tokio::test]
async fn test_failed_pipeline_costs_one_batch() {
    init_tracing();
    let d = TestDeployment::new(1).with_faults(0, |f| f.fail_batch(1));
    d.seed_on(0, "k", 1300);

    let engine = d.engine(EngineConfig::default());
    let report = engine.clear("k:*").await.unwrap();
    let outcome = report.get(&d.id(0)).unwrap();

    assert_eq!(outcome.matched, 1300);
    assert_eq!(outcome.count, 800);
    assert!(matches!(outcome.status, ShardStatus::Degraded(_)));
    assert_eq!(d.store(0).len(), 500);

    // The leftovers go on the next run.
    let retry = engine.clear("k:*").await.unwrap();
    assert_eq!(retry.total(), 500);
}

/// Keys repeated across scan pages are deleted once; the repeats count 0.
#[tokio::test]
async fn test_repeated_keys_across_pages_are_harmless() {
    init_tracing();
    let d = TestDeployment::new(1).with_faults(0, |f| f.duplicate_keys());
    d.seed_on(0, "k", 95);
    d.seed_on(0, "other", 5);

    let engine = d.engine(EngineConfig {
        scan_page_hint: Some(10),
        delete_batch_size: 20,
        ..EngineConfig::default()
    });
    let report = engine.clear("k:*").await.unwrap();
    let outcome = report.get(&d.id(0)).unwrap();

    // Ten pages of 10, 10, ..., 5 matches; pages two to ten repeat their predecessor.
    assert_eq!(outcome.matched, 95 + 90);
    assert_eq!(outcome.count, 95);
    assert_eq!(outcome.status, ShardStatus::Complete);
    assert_eq!(d.matching_on(0, "k:*"), 0);
    assert_eq!(d.matching_on(0, "other:*"), 5);
}
