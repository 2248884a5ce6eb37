//! Core trait and handle for per-shard command execution.

use std::fmt;
use std::sync::Arc;

use keysweep_types::{Key, KeyBatch, ScanCursor, ShardId};

use crate::error::StoreError;

/// One page returned by a cursor scan step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScanPage {
    /// Keys matched during this step. May be empty mid-scan.
    pub keys: KeyBatch,
    /// Cursor to pass to the next step. [`ScanCursor::START`] ends the scan.
    pub next: ScanCursor,
}

/// Commands the engine needs from a single shard.
///
/// All implementations must be `Send + Sync` so a shard can be driven by
/// its scanner and batcher tasks at the same time.
#[async_trait::async_trait]
pub trait ShardCommands: Send + Sync {
    /// Run one cursor scan step for keys matching `pattern`.
    ///
    /// An empty pattern matches every key. `page_hint` is a size hint only;
    /// `None` defers to the store's default.
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
        page_hint: Option<u32>,
    ) -> Result<ScanPage, StoreError>;

    /// Number of keys in the shard's keyspace.
    async fn db_size(&self) -> Result<u64, StoreError>;

    /// Delete `keys` in one pipelined round trip.
    ///
    /// Returns one entry per key, in order: `Some(n)` for an executed delete
    /// that removed `n` keys, `None` for a command that did not execute.
    /// An `Err` means the whole pipeline failed.
    async fn delete_pipeline(&self, keys: &[Key]) -> Result<Vec<Option<u64>>, StoreError>;

    /// Health check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release the underlying connection. Must be idempotent.
    async fn close(&self) -> Result<(), StoreError>;
}

/// A shard: its identity plus the command surface that reaches it.
///
/// Cloning is cheap; clones share the same command surface.
#[derive(Clone)]
pub struct Shard {
    id: ShardId,
    commands: Arc<dyn ShardCommands>,
}

impl Shard {
    /// Pair an identity with a command surface.
    pub fn new(id: impl Into<ShardId>, commands: Arc<dyn ShardCommands>) -> Self {
        Self {
            id: id.into(),
            commands,
        }
    }

    /// The shard's identity.
    pub fn id(&self) -> &ShardId {
        &self.id
    }

    /// The shard's command surface.
    pub fn commands(&self) -> &Arc<dyn ShardCommands> {
        &self.commands
    }
}

impl fmt::Debug for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shard").field("id", &self.id).finish()
    }
}
