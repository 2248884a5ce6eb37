//! [`ShardCommands`] over the Redis protocol.
//!
//! One multiplexed connection per shard. Every command and pipeline is
//! bounded by the configured response timeout.

use std::time::Duration;

use keysweep_store::{ScanPage, ShardCommands, StoreError};
use keysweep_types::{Key, ScanCursor};
use redis::aio::MultiplexedConnection;
use redis::{FromRedisValue, RedisError, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::{ConnectionSettings, Endpoint};
use crate::error::ConnError;

/// Replication role reported by `ROLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeRole {
    /// A writable master.
    Master,
    /// A read-only replica.
    Replica,
    /// Anything else (e.g. a sentinel).
    Other(String),
}

/// A shard reached over one multiplexed Redis-protocol connection.
pub struct RedisShard {
    endpoint: Endpoint,
    /// `None` once closed.
    conn: Mutex<Option<MultiplexedConnection>>,
    response_timeout: Duration,
}

impl RedisShard {
    /// Open a connection to `endpoint` with the given settings.
    pub async fn connect(
        endpoint: &Endpoint,
        settings: &ConnectionSettings,
    ) -> Result<Self, ConnError> {
        let connect_failed = |reason: String| ConnError::Connect {
            endpoint: endpoint.to_string(),
            reason,
        };

        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(endpoint.host.clone(), endpoint.port),
            redis: redis::RedisConnectionInfo {
                db: settings.database(),
                username: settings.username().map(str::to_owned),
                password: settings.password().map(str::to_owned),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info).map_err(|e| connect_failed(e.to_string()))?;

        let conn = tokio::time::timeout(
            settings.connect_timeout(),
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| connect_failed(format!("timed out after {:?}", settings.connect_timeout())))?
        .map_err(|e| connect_failed(e.to_string()))?;

        debug!(%endpoint, "connection established");
        Ok(Self {
            endpoint: endpoint.clone(),
            conn: Mutex::new(Some(conn)),
            response_timeout: settings.response_timeout(),
        })
    }

    /// The endpoint this shard is connected to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Ask the node for its replication role.
    pub async fn role(&self) -> Result<NodeRole, StoreError> {
        let reply: Vec<Value> = self.query("ROLE", redis::cmd("ROLE")).await?;
        parse_role(&reply)
    }

    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        self.conn.lock().await.clone().ok_or(StoreError::Closed)
    }

    async fn query<T: FromRedisValue>(
        &self,
        command: &'static str,
        cmd: redis::Cmd,
    ) -> Result<T, StoreError> {
        let mut conn = self.connection().await?;
        let fut = cmd.query_async(&mut conn);
        tokio::time::timeout(self.response_timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout {
                command,
                after: self.response_timeout,
            })?
            .map_err(store_error)
    }
}

#[async_trait::async_trait]
impl ShardCommands for RedisShard {
    async fn scan(
        &self,
        cursor: ScanCursor,
        pattern: &str,
        page_hint: Option<u32>,
    ) -> Result<ScanPage, StoreError> {
        let mut cmd = redis::cmd("SCAN");
        cmd.arg(cursor.get());
        if !pattern.is_empty() {
            cmd.arg("MATCH").arg(pattern);
        }
        if let Some(hint) = page_hint {
            cmd.arg("COUNT").arg(hint);
        }

        // Keys are binary-safe; never decode them here.
        let (next, keys): (u64, Vec<Vec<u8>>) = self.query("SCAN", cmd).await?;
        Ok(ScanPage {
            keys: keys.into_iter().map(Key::from).collect(),
            next: ScanCursor::new(next),
        })
    }

    async fn db_size(&self) -> Result<u64, StoreError> {
        self.query("DBSIZE", redis::cmd("DBSIZE")).await
    }

    async fn delete_pipeline(&self, keys: &[Key]) -> Result<Vec<Option<u64>>, StoreError> {
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.cmd("DEL").arg(key.as_bytes());
        }

        let mut conn = self.connection().await?;
        let replies: Vec<Value> = tokio::time::timeout(self.response_timeout, pipe.query_async(&mut conn))
            .await
            .map_err(|_| StoreError::Timeout {
                command: "DEL pipeline",
                after: self.response_timeout,
            })?
            .map_err(store_error)?;

        Ok(pipeline_results(&replies, keys.len()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let _: String = self.query("PING", redis::cmd("PING")).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        if self.conn.lock().await.take().is_some() {
            debug!(endpoint = %self.endpoint, "connection released");
        }
        Ok(())
    }
}

/// Classify a client error: transport failures versus everything else.
fn store_error(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal() {
        StoreError::Unavailable(e.to_string())
    } else {
        StoreError::Protocol(e.to_string())
    }
}

/// One entry per submitted key; integer replies executed, anything else did not.
fn pipeline_results(replies: &[Value], submitted: usize) -> Vec<Option<u64>> {
    let mut results: Vec<Option<u64>> = replies
        .iter()
        .take(submitted)
        .map(|reply| {
            redis::from_redis_value::<i64>(reply)
                .ok()
                .and_then(|n| u64::try_from(n).ok())
        })
        .collect();
    results.resize(submitted, None);
    results
}

fn parse_role(reply: &[Value]) -> Result<NodeRole, StoreError> {
    let first = reply
        .first()
        .ok_or_else(|| StoreError::Protocol("empty ROLE reply".into()))?;
    let role: String =
        redis::from_redis_value(first).map_err(|e| StoreError::Protocol(e.to_string()))?;

    Ok(match role.as_str() {
        "master" => NodeRole::Master,
        "slave" | "replica" => NodeRole::Replica,
        _ => NodeRole::Other(role),
    })
}
