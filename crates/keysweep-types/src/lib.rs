//! Shared types and identifiers for keysweep.
//!
//! This crate defines the value types passed between the store, connection,
//! and engine crates: shard identity ([`ShardId`]), keys ([`Key`]), scan
//! state ([`ScanCursor`], [`KeyBatch`]), per-shard results ([`ShardOutcome`],
//! [`ShardStatus`]), and the engine's fixed capacities.

use std::borrow::Borrow;
use std::fmt;

// ---------------------------------------------------------------------------
// Capacities
// ---------------------------------------------------------------------------

/// Number of delete commands submitted per pipelined round trip.
pub const DELETE_BATCH_CAPACITY: usize = 500;

/// Capacity of the bounded key queue between a shard's scanner and batcher.
pub const KEY_QUEUE_CAPACITY: usize = 1000;

// ---------------------------------------------------------------------------
// Shard identity
// ---------------------------------------------------------------------------

/// Identity of one shard: its network address or logical node id.
///
/// Shard ids are the keys of every per-shard result mapping, so they order
/// and hash by their string form.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct ShardId(String);

impl ShardId {
    /// Create a shard id from an address or node name.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ShardId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ShardId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<str> for ShardId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ShardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ShardId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Scan state
// ---------------------------------------------------------------------------

/// Opaque resumption token of a cursor-based pattern scan.
///
/// A scan starts at [`ScanCursor::START`]. Every step returns a new cursor;
/// receiving `START` back after the first step means the scan is complete.
/// There is no other termination signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ScanCursor(u64);

impl ScanCursor {
    /// The initial cursor, and the cursor that signals completion.
    pub const START: ScanCursor = ScanCursor(0);

    /// Wrap a raw cursor value returned by the store.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw value to send back to the store.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the initial (or terminal) cursor.
    pub const fn is_start(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ScanCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A store key. Keys are binary-safe byte strings, not necessarily UTF-8.
///
/// Display and Debug render the bytes lossily; the bytes themselves are
/// passed to the store unchanged.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Key(Vec<u8>);

impl Key {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Key {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for Key {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<String> for Key {
    fn from(key: String) -> Self {
        Self(key.into_bytes())
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        &self.0
    }
}

impl PartialEq<str> for Key {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for Key {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", String::from_utf8_lossy(&self.0))
    }
}

/// Keys discovered by one scan step.
///
/// Batches from different steps are not guaranteed to be disjoint when the
/// keyspace is mutated during the scan.
pub type KeyBatch = Vec<Key>;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// How a shard's unit of work ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardStatus {
    /// The scan ran to exhaustion and every delete batch executed.
    Complete,
    /// The unit stopped early or lost work; the count reflects progress
    /// made before the failure.
    Degraded(String),
    /// The engine was cancelled while this shard was still scanning.
    Cancelled,
}

impl ShardStatus {
    /// Whether the shard's result is complete.
    pub fn is_complete(&self) -> bool {
        matches!(self, ShardStatus::Complete)
    }
}

impl fmt::Display for ShardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardStatus::Complete => f.write_str("complete"),
            ShardStatus::Degraded(reason) => write!(f, "degraded: {reason}"),
            ShardStatus::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of one shard's unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardOutcome {
    /// Matched keys for a count, deleted keys for a clear.
    pub count: u64,
    /// Keys yielded by the shard's scan (equal to `count` for a count).
    pub matched: u64,
    /// How the unit ended.
    pub status: ShardStatus,
}

impl ShardOutcome {
    /// A unit that finished normally.
    pub fn complete(count: u64, matched: u64) -> Self {
        Self {
            count,
            matched,
            status: ShardStatus::Complete,
        }
    }

    /// A unit that failed after making the given progress.
    pub fn degraded(count: u64, matched: u64, reason: impl Into<String>) -> Self {
        Self {
            count,
            matched,
            status: ShardStatus::Degraded(reason.into()),
        }
    }
}
