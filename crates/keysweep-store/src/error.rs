//! Error types for shard command execution.

use std::time::Duration;

/// Errors returned by a shard's command surface.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The shard could not be reached or the connection broke.
    #[error("shard unavailable: {0}")]
    Unavailable(String),

    /// The shard answered with something the command did not expect.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The shard did not answer within the response timeout.
    #[error("{command} timed out after {after:?}")]
    Timeout {
        /// Command that timed out.
        command: &'static str,
        /// Configured response timeout.
        after: Duration,
    },

    /// The handle was closed before the command was issued.
    #[error("shard connection closed")]
    Closed,
}
