//! Connection layer for keysweep.
//!
//! Turns a [`ConnectionConfig`] into validated [`ConnectionSettings`], and
//! resolves those settings into a list of reachable, health-checked master
//! [`Shard`](keysweep_store::Shard)s backed by [`RedisShard`]:
//!
//! - single mode: exactly one endpoint, which must answer `PING`;
//! - cluster mode: every listed endpoint that answers `PING` and reports
//!   itself as a master through `ROLE`.

mod config;
mod error;
mod redis_shard;
mod topology;

pub use config::{
    ConnectionConfig, ConnectionSettings, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_RESPONSE_TIMEOUT_MS,
    DeploymentMode, Endpoint,
};
pub use error::ConnError;
pub use redis_shard::{NodeRole, RedisShard};
pub use topology::connect;
