//! Per-shard command surface and store backends.
//!
//! This crate defines the [`ShardCommands`] trait that the engine drives for
//! every shard (cursor scan, keyspace size, pipelined delete), the [`Shard`]
//! handle pairing a command surface with its identity, and two backends:
//!
//! - [`MemoryShard`]: in-memory keyspace with store-faithful SCAN semantics.
//! - [`FaultyShard`]: wraps any backend to inject failures and latency.
//!
//! The network-backed implementation lives in `keysweep-conn`.

mod error;
mod faulty_store;
mod memory_store;
mod pattern;
mod traits;

pub use error::StoreError;
pub use faulty_store::{DeleteHook, FaultyShard};
pub use memory_store::MemoryShard;
pub use pattern::glob_match;
pub use traits::{ScanPage, Shard, ShardCommands};
