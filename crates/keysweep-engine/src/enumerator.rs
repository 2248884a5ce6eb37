//! Fan-out of one unit of work per shard.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use keysweep_store::Shard;
use keysweep_types::{ShardId, ShardOutcome};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info_span};

use crate::aggregate::{EngineReport, ResultAggregator};
use crate::error::EngineError;

/// The fixed set of shards an engine works on.
///
/// [`run`](Self::run) starts one task per shard, lets them run fully in
/// parallel, and returns once every task has finished. A failure inside one
/// shard's task never aborts the others.
#[derive(Debug)]
pub struct ShardEnumerator {
    shards: Vec<Shard>,
}

impl ShardEnumerator {
    /// Build from a non-empty list of shards with distinct identities.
    pub fn new(shards: Vec<Shard>) -> Result<Self, EngineError> {
        if shards.is_empty() {
            return Err(EngineError::NoShards);
        }

        let mut seen = HashSet::new();
        for shard in &shards {
            if !seen.insert(shard.id().clone()) {
                return Err(EngineError::DuplicateShard(shard.id().clone()));
            }
        }

        Ok(Self { shards })
    }

    /// The shards, in topology order.
    pub fn shards(&self) -> &[Shard] {
        &self.shards
    }

    /// Shard identities, in topology order.
    pub fn ids(&self) -> impl Iterator<Item = &ShardId> {
        self.shards.iter().map(Shard::id)
    }

    /// Run `unit` once per shard, concurrently, and collect the outcomes.
    ///
    /// Each unit runs inside a `shard` span carrying the shard identity, so
    /// everything it logs is attributed to its shard. A unit that panics is
    /// reported as degraded with zero progress.
    pub async fn run<F, Fut>(&self, unit: F) -> EngineReport
    where
        F: Fn(Shard) -> Fut,
        Fut: Future<Output = ShardOutcome> + Send + 'static,
    {
        let aggregator = Arc::new(ResultAggregator::new(self.ids().cloned()));
        let mut tasks = JoinSet::new();

        for shard in &self.shards {
            let id = shard.id().clone();
            let span = info_span!("shard", shard = %id);
            let work = unit(shard.clone());
            let aggregator = aggregator.clone();

            tasks.spawn(
                async move {
                    let outcome = work.await;
                    debug!(count = outcome.count, status = %outcome.status, "shard finished");
                    aggregator.record(id, outcome);
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "shard task failed");
            }
        }

        aggregator.finish()
    }
}
