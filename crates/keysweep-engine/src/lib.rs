//! The keysweep engine: concurrent pattern scan and batched delete across
//! every shard of a deployment.
//!
//! - [`KeyScanner`]: drives one shard's cursor scan as a lazy sequence of
//!   key batches.
//! - [`DeleteBatcher`]: turns a stream of keys into pipelined delete batches
//!   of fixed capacity and sums what was actually removed.
//! - [`ShardEnumerator`]: runs one unit of work per shard, all concurrently.
//! - [`ResultAggregator`]: collects exactly one [`ShardOutcome`] per shard
//!   into an [`EngineReport`].
//! - [`Engine`]: the `count` / `clear` / `close` facade.
//!
//! Failures are contained at the smallest unit that can continue: a failed
//! delete batch costs that batch, a failed scan costs the rest of that shard.
//!
//! [`ShardOutcome`]: keysweep_types::ShardOutcome

pub mod aggregate;
pub mod batcher;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod enumerator;
pub mod error;
pub mod scanner;

pub use aggregate::{EngineReport, ResultAggregator};
pub use batcher::{DeleteBatcher, DeletionOutcome, flush_batch};
pub use cancel::{CancelHandle, CancelSignal};
pub use config::EngineConfig;
pub use engine::Engine;
pub use enumerator::ShardEnumerator;
pub use error::EngineError;
pub use scanner::KeyScanner;
