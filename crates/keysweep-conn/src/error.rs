//! Error types for configuration validation and topology resolution.

use keysweep_store::StoreError;

/// Errors raised while validating settings or resolving the topology.
///
/// All of these are fatal for engine construction: no partial operation is
/// attempted once one is returned.
#[derive(Debug, thiserror::Error)]
pub enum ConnError {
    /// No endpoint was given.
    #[error("no endpoints configured")]
    NoEndpoints,

    /// An endpoint string could not be parsed.
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint {
        /// The offending endpoint text.
        endpoint: String,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// The same endpoint was listed twice.
    #[error("duplicate endpoint: {0}")]
    DuplicateEndpoint(String),

    /// Single mode was given more than one endpoint.
    #[error("single mode takes exactly one endpoint, got {0}")]
    SingleModeEndpoints(usize),

    /// A negative logical database index was requested.
    #[error("database index must not be negative: {0}")]
    NegativeDatabase(i64),

    /// A tuning value is out of range.
    #[error("invalid connection configuration: {0}")]
    InvalidConfig(&'static str),

    /// A connection could not be established.
    #[error("failed to connect to {endpoint}: {reason}")]
    Connect {
        /// Endpoint that refused or timed out.
        endpoint: String,
        /// Underlying failure.
        reason: String,
    },

    /// A connected endpoint failed its health check.
    #[error("health check failed for {endpoint}: {source}")]
    HealthCheck {
        /// Endpoint that failed.
        endpoint: String,
        /// Underlying command failure.
        source: StoreError,
    },

    /// Cluster mode found no reachable master.
    #[error("no reachable master among {tried} endpoint(s)")]
    NoReachableShards {
        /// Endpoints that were tried.
        tried: usize,
    },
}
