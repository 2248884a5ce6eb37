//! Connection configuration and validation.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConnError;

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Default time allowed for any single command or pipeline round trip.
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 3_000;

/// How the store is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// One standalone instance.
    #[default]
    Single,
    /// A sharded cluster; every master is one shard.
    Cluster,
}

/// A `host:port` network endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    /// Host name or IP address (IPv6 without brackets).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl FromStr for Endpoint {
    type Err = ConnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = |reason| ConnError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason,
        };

        let (host, port) = raw.rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port: u16 = port.parse().map_err(|_| invalid("port is not a number"))?;
        if port == 0 {
            return Err(invalid("port must be non-zero"));
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Raw connection configuration, as read from a file or the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Single instance or cluster.
    pub mode: DeploymentMode,
    /// Endpoints as `host:port`. Entries may themselves be comma-separated.
    pub nodes: Vec<String>,
    /// ACL user name, if any.
    pub username: Option<String>,
    /// Password, if the store requires one.
    pub password: Option<String>,
    /// Logical database index. Only meaningful in single mode.
    pub database: i64,
    /// Connection establishment timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Per-command response timeout in milliseconds.
    pub response_timeout_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Single,
            nodes: Vec::new(),
            username: None,
            password: None,
            database: 0,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        }
    }
}

impl ConnectionConfig {
    /// Validate the configuration into immutable [`ConnectionSettings`].
    pub fn validate(&self) -> Result<ConnectionSettings, ConnError> {
        if self.database < 0 {
            return Err(ConnError::NegativeDatabase(self.database));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConnError::InvalidConfig("connect timeout must be non-zero"));
        }
        if self.response_timeout_ms == 0 {
            return Err(ConnError::InvalidConfig("response timeout must be non-zero"));
        }

        let mut endpoints = Vec::new();
        let mut seen = HashSet::new();
        for raw in self
            .nodes
            .iter()
            .flat_map(|entry| entry.split(','))
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            let endpoint: Endpoint = raw.parse()?;
            if !seen.insert(endpoint.clone()) {
                return Err(ConnError::DuplicateEndpoint(endpoint.to_string()));
            }
            endpoints.push(endpoint);
        }

        if endpoints.is_empty() {
            return Err(ConnError::NoEndpoints);
        }
        if self.mode == DeploymentMode::Single && endpoints.len() != 1 {
            return Err(ConnError::SingleModeEndpoints(endpoints.len()));
        }

        let database = match self.mode {
            DeploymentMode::Single => self.database,
            DeploymentMode::Cluster => {
                if self.database != 0 {
                    warn!(
                        database = self.database,
                        "database index is ignored in cluster mode"
                    );
                }
                0
            }
        };

        Ok(ConnectionSettings {
            mode: self.mode,
            endpoints,
            username: self.username.clone().filter(|u| !u.is_empty()),
            password: self.password.clone().filter(|p| !p.is_empty()),
            database,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            response_timeout: Duration::from_millis(self.response_timeout_ms),
        })
    }
}

/// Validated, immutable connection settings.
///
/// Only [`ConnectionConfig::validate`] constructs this type.
#[derive(Clone)]
pub struct ConnectionSettings {
    mode: DeploymentMode,
    endpoints: Vec<Endpoint>,
    username: Option<String>,
    password: Option<String>,
    database: i64,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl ConnectionSettings {
    /// Deployment mode.
    pub fn mode(&self) -> DeploymentMode {
        self.mode
    }

    /// Endpoints to connect to, in configuration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// ACL user name.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Password.
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// Logical database index (always 0 in cluster mode).
    pub fn database(&self) -> i64 {
        self.database
    }

    /// Connection establishment timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Per-command response timeout.
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("mode", &self.mode)
            .field("endpoints", &self.endpoints)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("connect_timeout", &self.connect_timeout)
            .field("response_timeout", &self.response_timeout)
            .finish()
    }
}
