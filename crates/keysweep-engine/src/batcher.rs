//! Size-bounded pipelined deletion for one shard.

use keysweep_store::{Shard, StoreError};
use keysweep_types::Key;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Totals of one batcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeletionOutcome {
    /// Keys submitted for deletion.
    pub submitted: u64,
    /// Keys that existed and were removed.
    pub deleted: u64,
    /// Pipelines submitted, including failed ones.
    pub batches: u64,
    /// Pipelines that failed as a whole.
    pub failed_batches: u64,
}

/// Accumulates keys into fixed-capacity delete batches for one shard.
///
/// Every time the running key count reaches a multiple of the capacity, the
/// pending batch is submitted as one pipeline and the slot array is reused.
/// [`finish`](Self::finish) flushes the final partial batch. A failed
/// pipeline contributes nothing and does not stop later batches.
pub struct DeleteBatcher {
    shard: Shard,
    capacity: usize,
    slots: Vec<Key>,
    outcome: DeletionOutcome,
}

impl DeleteBatcher {
    /// Create a batcher submitting `capacity` deletes per pipeline.
    pub fn new(shard: Shard, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            shard,
            capacity,
            slots: Vec::with_capacity(capacity),
            outcome: DeletionOutcome::default(),
        }
    }

    /// Drain `keys` until the producer closes the queue, then flush.
    pub async fn consume(mut self, mut keys: mpsc::Receiver<Key>) -> DeletionOutcome {
        while let Some(key) = keys.recv().await {
            self.push(key).await;
        }
        self.finish().await
    }

    /// Add one key, submitting the batch when it fills up.
    pub async fn push(&mut self, key: Key) {
        self.slots.push(key);
        self.outcome.submitted += 1;
        if self.outcome.submitted % self.capacity as u64 == 0 {
            self.flush().await;
        }
    }

    /// Flush the final partial batch, if any, and return the totals.
    pub async fn finish(mut self) -> DeletionOutcome {
        if self.outcome.submitted % self.capacity as u64 != 0 {
            self.flush().await;
        }
        self.outcome
    }

    /// Totals so far.
    pub fn outcome(&self) -> DeletionOutcome {
        self.outcome
    }

    async fn flush(&mut self) {
        let batch = self.outcome.batches;
        self.outcome.batches += 1;

        match flush_batch(&self.shard, &self.slots).await {
            Ok(deleted) => {
                self.outcome.deleted += deleted;
                debug!(
                    shard = %self.shard.id(),
                    batch,
                    submitted = self.slots.len(),
                    deleted,
                    "delete batch flushed"
                );
            }
            Err(e) => {
                self.outcome.failed_batches += 1;
                error!(
                    shard = %self.shard.id(),
                    batch,
                    submitted = self.slots.len(),
                    error = %e,
                    "delete batch failed"
                );
            }
        }

        self.slots.clear();
    }
}

/// Submit `keys` as one pipeline of single-key deletes.
///
/// Returns the number of keys actually removed: only executed commands
/// count, and a key that was already gone counts zero. Nothing is retried.
pub async fn flush_batch(shard: &Shard, keys: &[Key]) -> Result<u64, StoreError> {
    if keys.is_empty() {
        return Ok(0);
    }
    let results = shard.commands().delete_pipeline(keys).await?;
    Ok(results.into_iter().flatten().sum())
}
