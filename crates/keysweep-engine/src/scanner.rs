//! Cursor-driven key enumeration for one shard.

use keysweep_store::Shard;
use keysweep_types::{KeyBatch, ScanCursor, ShardStatus};
use tracing::{debug, error, info};

use crate::cancel::CancelSignal;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Running,
    Exhausted,
    Failed(String),
    Cancelled,
}

/// A lazy, finite, non-restartable sequence of key batches from one shard.
///
/// The scanner starts at [`ScanCursor::START`] and issues one scan step per
/// [`next_batch`](Self::next_batch) call. It stops when a step hands the
/// start cursor back, when a step fails, or when cancellation is observed.
/// An empty batch mid-scan is yielded like any other. Once stopped it only
/// returns `None`; [`status`](Self::status) tells how it ended.
pub struct KeyScanner {
    shard: Shard,
    pattern: String,
    page_hint: Option<u32>,
    cancel: CancelSignal,
    cursor: ScanCursor,
    steps: u64,
    yielded: u64,
    state: ScanState,
}

impl KeyScanner {
    /// Prepare a scan of `shard` for keys matching `pattern`.
    pub fn new(
        shard: Shard,
        pattern: impl Into<String>,
        page_hint: Option<u32>,
        cancel: CancelSignal,
    ) -> Self {
        Self {
            shard,
            pattern: pattern.into(),
            page_hint,
            cancel,
            cursor: ScanCursor::START,
            steps: 0,
            yielded: 0,
            state: ScanState::Running,
        }
    }

    /// Run the next scan step and return its keys.
    pub async fn next_batch(&mut self) -> Option<KeyBatch> {
        if self.state != ScanState::Running {
            return None;
        }

        if self.cancel.is_cancelled() {
            info!(shard = %self.shard.id(), steps = self.steps, "scan cancelled");
            self.state = ScanState::Cancelled;
            return None;
        }

        let step = self
            .shard
            .commands()
            .scan(self.cursor, &self.pattern, self.page_hint)
            .await;

        match step {
            Ok(page) => {
                self.steps += 1;
                self.cursor = page.next;
                self.yielded += page.keys.len() as u64;
                if page.next.is_start() {
                    debug!(shard = %self.shard.id(), steps = self.steps, keys = self.yielded, "scan exhausted");
                    self.state = ScanState::Exhausted;
                }
                Some(page.keys)
            }
            Err(e) => {
                error!(
                    shard = %self.shard.id(),
                    pattern = %self.pattern,
                    cursor = %self.cursor,
                    error = %e,
                    "scan failed"
                );
                self.state = ScanState::Failed(e.to_string());
                None
            }
        }
    }

    /// Scan steps that completed successfully.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Keys yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// The shard being scanned.
    pub fn shard(&self) -> &Shard {
        &self.shard
    }

    /// How the scan ended.
    ///
    /// A scan dropped before it stopped on its own counts as degraded.
    pub fn status(&self) -> ShardStatus {
        match &self.state {
            ScanState::Exhausted => ShardStatus::Complete,
            ScanState::Failed(reason) => ShardStatus::Degraded(format!("scan failed: {reason}")),
            ScanState::Cancelled => ShardStatus::Cancelled,
            ScanState::Running => {
                ShardStatus::Degraded("scan abandoned before exhaustion".to_string())
            }
        }
    }
}
