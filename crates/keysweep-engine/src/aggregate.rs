//! Per-shard result collection.

use std::collections::BTreeMap;
use std::sync::Mutex;

use keysweep_types::{ShardId, ShardOutcome, ShardStatus};
use tracing::warn;

/// Mapping from shard identity to that shard's outcome.
///
/// Summing the counts is left to the caller; [`total`](Self::total) is a
/// convenience for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    entries: BTreeMap<ShardId, ShardOutcome>,
}

impl EngineReport {
    /// Outcome of one shard.
    pub fn get(&self, shard: &ShardId) -> Option<&ShardOutcome> {
        self.entries.get(shard)
    }

    /// Count of one shard.
    pub fn count(&self, shard: &ShardId) -> Option<u64> {
        self.entries.get(shard).map(|o| o.count)
    }

    /// All outcomes, ordered by shard identity.
    pub fn iter(&self) -> impl Iterator<Item = (&ShardId, &ShardOutcome)> {
        self.entries.iter()
    }

    /// Number of shards reported.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no shard is reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of counts across shards.
    pub fn total(&self) -> u64 {
        self.entries.values().map(|o| o.count).sum()
    }

    /// Shards whose result is not complete.
    pub fn degraded(&self) -> impl Iterator<Item = (&ShardId, &ShardOutcome)> {
        self.entries.iter().filter(|(_, o)| !o.status.is_complete())
    }

    /// Drop statuses and keep only the counts.
    pub fn into_counts(self) -> BTreeMap<ShardId, u64> {
        self.entries
            .into_iter()
            .map(|(id, outcome)| (id, outcome.count))
            .collect()
    }

    /// Whether every shard failed before making any progress.
    pub fn failed_everywhere(&self) -> bool {
        !self.entries.is_empty()
            && self.entries.values().all(|o| {
                matches!(o.status, ShardStatus::Degraded(_)) && o.count == 0 && o.matched == 0
            })
    }
}

impl FromIterator<(ShardId, ShardOutcome)> for EngineReport {
    fn from_iter<I: IntoIterator<Item = (ShardId, ShardOutcome)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Collects one outcome per shard from concurrently finishing shard tasks.
///
/// Shard tasks record into it independently. [`finish`](Self::finish) fills
/// in any expected shard that never reported, so the report always has
/// exactly one entry per shard.
pub struct ResultAggregator {
    expected: Vec<ShardId>,
    results: Mutex<BTreeMap<ShardId, ShardOutcome>>,
}

impl ResultAggregator {
    /// Create an aggregator expecting one result from each of `shards`.
    pub fn new(shards: impl IntoIterator<Item = ShardId>) -> Self {
        Self {
            expected: shards.into_iter().collect(),
            results: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record a shard's outcome. Only the first outcome per shard is kept.
    pub fn record(&self, shard: ShardId, outcome: ShardOutcome) {
        let mut results = self.results.lock().expect("results lock poisoned");
        if results.contains_key(&shard) {
            warn!(%shard, "ignoring second result for shard");
            return;
        }
        results.insert(shard, outcome);
    }

    /// Number of shards that have reported.
    pub fn reported(&self) -> usize {
        self.results.lock().expect("results lock poisoned").len()
    }

    /// Take the collected results as a report.
    pub fn finish(&self) -> EngineReport {
        let mut results = std::mem::take(&mut *self.results.lock().expect("results lock poisoned"));

        for shard in &self.expected {
            if !results.contains_key(shard) {
                warn!(%shard, "shard produced no result");
                results.insert(
                    shard.clone(),
                    ShardOutcome::degraded(0, 0, "shard task did not report"),
                );
            }
        }

        EngineReport { entries: results }
    }
}
