//! In-memory shard backend.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use keysweep_types::{Key, ScanCursor};
use tracing::debug;

use crate::error::StoreError;
use crate::pattern::glob_match;
use crate::traits::{ScanPage, ShardCommands};

/// Keys visited per scan step when the caller gives no page hint.
const DEFAULT_PAGE: usize = 10;

/// In-memory keyspace with cursor scan semantics matching a real store.
///
/// Every key gets a sequence number on first insert, and cursors are
/// positions in sequence order. A scan step visits up to `page` slots and
/// then filters by pattern, so a step can legitimately return no keys while
/// the scan is still in progress. Deleting keys never moves a cursor, so a
/// key present for the whole scan is always returned.
pub struct MemoryShard {
    inner: RwLock<Keyspace>,
    default_page: usize,
    scan_calls: AtomicU64,
    pipeline_calls: AtomicU64,
    closed: AtomicBool,
}

#[derive(Default)]
struct Keyspace {
    by_seq: BTreeMap<u64, Key>,
    seq_of: HashMap<Key, u64>,
    next_seq: u64,
}

impl MemoryShard {
    /// Create an empty shard.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Keyspace {
                next_seq: 1,
                ..Keyspace::default()
            }),
            default_page: DEFAULT_PAGE,
            scan_calls: AtomicU64::new(0),
            pipeline_calls: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Set the number of slots visited per step when no hint is given.
    pub fn with_default_page(mut self, page: usize) -> Self {
        self.default_page = page.max(1);
        self
    }

    /// Insert a key. Returns `false` if it already existed.
    pub fn insert(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let mut space = self.inner.write().expect("lock poisoned");
        if space.seq_of.contains_key(&key) {
            return false;
        }
        let seq = space.next_seq;
        space.next_seq += 1;
        space.seq_of.insert(key.clone(), seq);
        space.by_seq.insert(seq, key);
        true
    }

    /// Remove a key. Returns `true` if it existed.
    pub fn remove(&self, key: impl AsRef<[u8]>) -> bool {
        let mut space = self.inner.write().expect("lock poisoned");
        match space.seq_of.remove(key.as_ref()) {
            Some(seq) => {
                space.by_seq.remove(&seq);
                true
            }
            None => false,
        }
    }

    /// Whether a key exists.
    pub fn contains(&self, key: impl AsRef<[u8]>) -> bool {
        let space = self.inner.read().expect("lock poisoned");
        space.seq_of.contains_key(key.as_ref())
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").by_seq.len()
    }

    /// Whether the shard holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of keys matching `pattern`, computed without scanning.
    pub fn count_matching(&self, pattern: &str) -> usize {
        let space = self.inner.read().expect("lock poisoned");
        space
            .by_seq
            .values()
            .filter(|k| pattern.is_empty() || glob_match(pattern.as_bytes(), k.as_bytes()))
            .count()
    }

    /// Scan steps served so far.
    pub fn scan_calls(&self) -> u64 {
        self.scan_calls.load(Ordering::Relaxed)
    }

    /// Delete pipelines executed so far.
    pub fn pipeline_calls(&self) -> u64 {
        self.pipeline_calls.load(Ordering::Relaxed)
    }

    /// Whether [`ShardCommands::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Default for MemoryShard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ShardCommands for MemoryShard {
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
        page_hint: Option<u32>,
    ) -> Result<ScanPage, StoreError> {
        self.ensure_open()?;
        self.scan_calls.fetch_add(1, Ordering::Relaxed);

        let page = page_hint
            .map(|hint| (hint as usize).max(1))
            .unwrap_or(self.default_page);
        let space = self.inner.read().expect("lock poisoned");

        let mut keys = Vec::new();
        let mut last = None;
        for (seq, key) in space.by_seq.range(cursor.get()..).take(page) {
            last = Some(*seq);
            if pattern.is_empty() || glob_match(pattern.as_bytes(), key.as_bytes()) {
                keys.push(key.clone());
            }
        }

        let next = match last {
            Some(seq) if space.by_seq.range(seq + 1..).next().is_some() => {
                ScanCursor::new(seq + 1)
            }
            _ => ScanCursor::START,
        };

        Ok(ScanPage { keys, next })
    }

    async fn db_size(&self) -> Result<u64, StoreError> {
        self.ensure_open()?;
        Ok(self.len() as u64)
    }

    async fn delete_pipeline(&self, keys: &[Key]) -> Result<Vec<Option<u64>>, StoreError> {
        self.ensure_open()?;
        self.pipeline_calls.fetch_add(1, Ordering::Relaxed);

        let results = keys
            .iter()
            .map(|key| Some(u64::from(self.remove(key))))
            .collect::<Vec<_>>();
        debug!(submitted = keys.len(), "executed delete pipeline in memory");
        Ok(results)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}
