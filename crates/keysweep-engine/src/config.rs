//! Engine tuning.

use keysweep_types::{DELETE_BATCH_CAPACITY, KEY_QUEUE_CAPACITY};

use crate::error::EngineError;

/// Tuning for scans and deletes. Immutable once handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Page-size hint sent with every scan step. `None` defers to the
    /// store's default. Termination never depends on this value.
    pub scan_page_hint: Option<u32>,
    /// Delete commands per pipelined round trip.
    pub delete_batch_size: usize,
    /// Capacity of the per-shard queue between scanner and batcher.
    pub key_queue_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_page_hint: None,
            delete_batch_size: DELETE_BATCH_CAPACITY,
            key_queue_capacity: KEY_QUEUE_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.scan_page_hint == Some(0) {
            return Err(EngineError::InvalidConfig("scan page hint must be positive"));
        }
        if self.delete_batch_size == 0 {
            return Err(EngineError::InvalidConfig("delete batch size must be positive"));
        }
        if self.key_queue_capacity == 0 {
            return Err(EngineError::InvalidConfig("key queue capacity must be positive"));
        }
        Ok(())
    }
}
