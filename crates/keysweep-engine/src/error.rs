//! Error types for the engine.

use keysweep_types::ShardId;

/// Errors raised while constructing an engine.
///
/// Once an engine exists, no operation returns an error: remote failures are
/// logged and reflected in the per-shard status instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The topology has no shards.
    #[error("topology has no shards")]
    NoShards,

    /// Two shards share one identity.
    #[error("duplicate shard in topology: {0}")]
    DuplicateShard(ShardId),

    /// A tuning value is out of range.
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(&'static str),
}
