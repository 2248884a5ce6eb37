//! The `count` / `clear` / `close` facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use keysweep_store::Shard;
use keysweep_types::{Key, ShardId, ShardOutcome, ShardStatus};
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, warn};

use crate::aggregate::EngineReport;
use crate::batcher::DeleteBatcher;
use crate::cancel::{CancelHandle, CancelSignal};
use crate::config::EngineConfig;
use crate::enumerator::ShardEnumerator;
use crate::error::EngineError;
use crate::scanner::KeyScanner;

/// Scan-and-delete engine over a fixed set of connected shards.
///
/// Construction is the only fallible step. After that, remote failures are
/// contained per batch or per shard, logged, and reflected in each shard's
/// [`ShardStatus`].
#[derive(Debug)]
pub struct Engine {
    enumerator: ShardEnumerator,
    config: EngineConfig,
    cancel: CancelHandle,
    closed: AtomicBool,
}

impl Engine {
    /// Build an engine over `shards`.
    pub fn new(shards: Vec<Shard>, config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let enumerator = ShardEnumerator::new(shards)?;
        info!(shards = enumerator.shards().len(), ?config, "engine ready");
        Ok(Self {
            enumerator,
            config,
            cancel: CancelHandle::new(),
            closed: AtomicBool::new(false),
        })
    }

    /// Identities of the shards this engine works on.
    pub fn shard_ids(&self) -> Vec<ShardId> {
        self.enumerator.ids().cloned().collect()
    }

    /// Tuning this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Count keys matching `pattern` on every shard.
    ///
    /// An empty pattern uses the store's keyspace-size query instead of a
    /// scan. Returns an empty report when no shard could be enumerated at all.
    pub async fn count(&self, pattern: &str) -> EngineReport {
        if self.is_closed() {
            error!("count called on a closed engine");
            return EngineReport::default();
        }

        let pattern: Arc<str> = Arc::from(pattern.trim());
        let page_hint = self.config.scan_page_hint;
        let cancel = self.cancel.signal();

        let report = self
            .enumerator
            .run(|shard| {
                let pattern = pattern.clone();
                let cancel = cancel.clone();
                async move {
                    if pattern.is_empty() {
                        count_keyspace(shard, cancel).await
                    } else {
                        count_matching(shard, &pattern, page_hint, cancel).await
                    }
                }
            })
            .await;

        if report.failed_everywhere() {
            error!(pattern = %pattern, "count failed on every shard");
            return EngineReport::default();
        }
        report
    }

    /// Delete keys matching `pattern` on every shard.
    ///
    /// Each shard runs its scanner and batcher as two concurrent tasks
    /// joined by a bounded queue. An empty or whitespace-only pattern is
    /// rejected: nothing is deleted and `None` is returned.
    pub async fn clear(&self, pattern: &str) -> Option<EngineReport> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            error!("refusing to clear with an empty pattern");
            return None;
        }
        if self.is_closed() {
            error!("clear called on a closed engine");
            return None;
        }

        let pattern: Arc<str> = Arc::from(pattern);
        let config = self.config;
        let cancel = self.cancel.signal();

        let report = self
            .enumerator
            .run(|shard| {
                let pattern = pattern.clone();
                let cancel = cancel.clone();
                async move { clear_shard(shard, &pattern, config, cancel).await }
            })
            .await;
        Some(report)
    }

    /// Ask every running and future scan to stop at its next step.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            info!("cancellation requested");
        }
        self.cancel.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Release every shard connection. Safe to call more than once; only the
    /// first call does anything. Failures are logged, never returned.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        for shard in self.enumerator.shards() {
            if let Err(e) = shard.commands().close().await {
                warn!(shard = %shard.id(), error = %e, "failed to close shard connection");
            }
        }
        info!("engine closed");
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

async fn count_keyspace(shard: Shard, cancel: CancelSignal) -> ShardOutcome {
    if cancel.is_cancelled() {
        return ShardOutcome {
            count: 0,
            matched: 0,
            status: ShardStatus::Cancelled,
        };
    }

    match shard.commands().db_size().await {
        Ok(size) => {
            info!(keys = size, "keyspace size");
            ShardOutcome::complete(size, size)
        }
        Err(e) => {
            error!(error = %e, "keyspace size query failed");
            ShardOutcome::degraded(0, 0, format!("dbsize failed: {e}"))
        }
    }
}

async fn count_matching(
    shard: Shard,
    pattern: &str,
    page_hint: Option<u32>,
    cancel: CancelSignal,
) -> ShardOutcome {
    info!(%pattern, "scanning shard");
    let mut scanner = KeyScanner::new(shard, pattern, page_hint, cancel);
    while scanner.next_batch().await.is_some() {}

    let matched = scanner.yielded();
    info!(%pattern, matched, steps = scanner.steps(), "finished shard");
    ShardOutcome {
        count: matched,
        matched,
        status: scanner.status(),
    }
}

async fn clear_shard(
    shard: Shard,
    pattern: &str,
    config: EngineConfig,
    cancel: CancelSignal,
) -> ShardOutcome {
    info!(%pattern, "scanning shard");
    let (tx, rx) = mpsc::channel(config.key_queue_capacity);
    let scanner = KeyScanner::new(shard.clone(), pattern, config.scan_page_hint, cancel);
    let batcher = DeleteBatcher::new(shard, config.delete_batch_size);

    let producer = tokio::spawn(feed_queue(scanner, tx).in_current_span());
    let consumer = tokio::spawn(batcher.consume(rx).in_current_span());
    let (produced, consumed) = tokio::join!(producer, consumer);

    let (queued, scan_status) = match produced {
        Ok(produced) => produced,
        Err(e) => {
            error!(error = %e, "scanner task failed");
            (0, ShardStatus::Degraded(format!("scanner task failed: {e}")))
        }
    };
    let deletion = match consumed {
        Ok(deletion) => deletion,
        Err(e) => {
            error!(error = %e, "batcher task failed");
            return ShardOutcome::degraded(0, queued, format!("batcher task failed: {e}"));
        }
    };

    let status = match scan_status {
        ShardStatus::Complete if deletion.failed_batches > 0 => ShardStatus::Degraded(format!(
            "{} of {} delete batches failed",
            deletion.failed_batches, deletion.batches
        )),
        status => status,
    };

    info!(
        %pattern,
        matched = queued,
        deleted = deletion.deleted,
        batches = deletion.batches,
        "finished shard"
    );
    ShardOutcome {
        count: deletion.deleted,
        matched: queued,
        status,
    }
}

/// Push every scanned key into the queue, then close it by dropping `tx`.
///
/// Returns the number of keys queued and how the scan ended.
async fn feed_queue(mut scanner: KeyScanner, tx: mpsc::Sender<Key>) -> (u64, ShardStatus) {
    let mut queued = 0;
    while let Some(batch) = scanner.next_batch().await {
        for key in batch {
            if tx.send(key).await.is_err() {
                error!("delete queue closed before scan finished");
                return (
                    queued,
                    ShardStatus::Degraded("delete queue closed early".to_string()),
                );
            }
            queued += 1;
        }
    }
    (queued, scanner.status())
}
