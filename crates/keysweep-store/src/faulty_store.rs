//! A [`ShardCommands`] wrapper that injects failures and latency.
//!
//! `FaultyShard` wraps any `Arc<dyn ShardCommands>` and can be told to fail
//! scans after a number of successful steps, fail chosen delete pipelines,
//! fail keyspace-size queries, run a hook before every delete pipeline (to
//! simulate another client mutating the keyspace), repeat keys across scan
//! pages the way a rehashing store may, and sleep for a seeded random
//! duration before each command.
//!
//! # Example
//!
//! ```ignore
//! let faulty = FaultyShard::new(inner)
//!     .fail_scan_after(2)   // third scan step errors
//!     .fail_batch(0)        // first delete pipeline errors
//!     .latency(1, 5)        // 1–5 ms per command
//!     .seed(42);
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use keysweep_types::{Key, ScanCursor};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::StoreError;
use crate::traits::{ScanPage, ShardCommands};

/// Callback run with the submitted keys before a delete pipeline executes.
pub type DeleteHook = Arc<dyn Fn(&[Key]) + Send + Sync>;

/// A [`ShardCommands`] wrapper with configurable fault injection.
pub struct FaultyShard {
    inner: Arc<dyn ShardCommands>,
    fail_scan_after: Option<u64>,
    failing_batches: HashSet<u64>,
    fail_db_size: bool,
    fail_ping: bool,
    before_delete: Option<DeleteHook>,
    duplicate_keys: bool,
    last_page: Mutex<Vec<Key>>,
    latency_ms: (u64, u64),
    rng: Mutex<StdRng>,
    scan_steps: AtomicU64,
    pipelines: AtomicU64,
}

impl FaultyShard {
    /// Wrap a backend with no faults and no latency.
    pub fn new(inner: Arc<dyn ShardCommands>) -> Self {
        Self {
            inner,
            fail_scan_after: None,
            failing_batches: HashSet::new(),
            fail_db_size: false,
            fail_ping: false,
            before_delete: None,
            duplicate_keys: false,
            last_page: Mutex::new(Vec::new()),
            latency_ms: (0, 0),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            scan_steps: AtomicU64::new(0),
            pipelines: AtomicU64::new(0),
        }
    }

    /// Let `steps` scan steps succeed, then fail every later step.
    pub fn fail_scan_after(mut self, steps: u64) -> Self {
        self.fail_scan_after = Some(steps);
        self
    }

    /// Fail the delete pipeline with the given 0-based submission index.
    pub fn fail_batch(mut self, index: u64) -> Self {
        self.failing_batches.insert(index);
        self
    }

    /// Fail every keyspace-size query.
    pub fn fail_db_size(mut self) -> Self {
        self.fail_db_size = true;
        self
    }

    /// Fail every health check.
    pub fn fail_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// Run `hook` with the submitted keys before each delete pipeline.
    pub fn before_delete(mut self, hook: DeleteHook) -> Self {
        self.before_delete = Some(hook);
        self
    }

    /// Repeat the previous page's keys at the start of every later page.
    pub fn duplicate_keys(mut self) -> Self {
        self.duplicate_keys = true;
        self
    }

    /// Set the per-command latency range in milliseconds (uniform random).
    pub fn latency(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.latency_ms = (min_ms, max_ms);
        self
    }

    /// Set the RNG seed for deterministic latency.
    pub fn seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Scan steps attempted so far, including failed ones.
    pub fn scan_steps(&self) -> u64 {
        self.scan_steps.load(Ordering::Relaxed)
    }

    /// Delete pipelines attempted so far, including failed ones.
    pub fn pipelines(&self) -> u64 {
        self.pipelines.load(Ordering::Relaxed)
    }

    async fn delay(&self) {
        let (min, max) = self.latency_ms;

        if max == 0 {
            return;
        }

        let ms = if min >= max {
            max
        } else {
            self.rng
                .lock()
                .expect("rng lock poisoned")
                .random_range(min..=max)
        };

        if ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait::async_trait]
impl ShardCommands for FaultyShard {
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
        page_hint: Option<u32>,
    ) -> Result<ScanPage, StoreError> {
        self.delay().await;
        let step = self.scan_steps.fetch_add(1, Ordering::Relaxed);
        if self.fail_scan_after.is_some_and(|limit| step >= limit) {
            return Err(StoreError::Unavailable(format!(
                "injected scan failure at step {step}"
            )));
        }
        let mut page = self.inner.scan(cursor, pattern, page_hint).await?;
        if self.duplicate_keys {
            let mut last = self.last_page.lock().expect("last page lock poisoned");
            let fresh = std::mem::replace(&mut page.keys, std::mem::take(&mut *last));
            *last = fresh.clone();
            page.keys.extend(fresh);
        }
        Ok(page)
    }

    async fn db_size(&self) -> Result<u64, StoreError> {
        self.delay().await;
        if self.fail_db_size {
            return Err(StoreError::Unavailable("injected dbsize failure".into()));
        }
        self.inner.db_size().await
    }

    async fn delete_pipeline(&self, keys: &[Key]) -> Result<Vec<Option<u64>>, StoreError> {
        self.delay().await;
        let index = self.pipelines.fetch_add(1, Ordering::Relaxed);
        if self.failing_batches.contains(&index) {
            return Err(StoreError::Unavailable(format!(
                "injected pipeline failure on batch {index}"
            )));
        }
        if let Some(hook) = &self.before_delete {
            hook(keys);
        }
        self.inner.delete_pipeline(keys).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.fail_ping {
            return Err(StoreError::Unavailable("injected ping failure".into()));
        }
        self.inner.ping().await
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.inner.close().await
    }
}
