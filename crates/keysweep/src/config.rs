//! TOML configuration for the keysweep binary.
//!
//! Every section and field is optional. Command-line flags override whatever
//! the file sets.

use std::path::Path;

use keysweep_conn::ConnectionConfig;
use keysweep_engine::EngineConfig;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Deployment and credentials.
    pub connection: ConnectionConfig,
    /// Scan and delete tuning.
    pub engine: EngineSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[engine]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Page-size hint sent with every scan step. Omit to use the store's.
    pub scan_page_hint: Option<u32>,
    /// Delete commands per pipeline.
    pub delete_batch_size: Option<usize>,
    /// Capacity of the per-shard key queue.
    pub key_queue_capacity: Option<usize>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective engine tuning: file values over built-in defaults.
    pub fn engine_config(&self) -> EngineConfig {
        let defaults = EngineConfig::default();
        EngineConfig {
            scan_page_hint: self.engine.scan_page_hint.or(defaults.scan_page_hint),
            delete_batch_size: self
                .engine
                .delete_batch_size
                .unwrap_or(defaults.delete_batch_size),
            key_queue_capacity: self
                .engine
                .key_queue_capacity
                .unwrap_or(defaults.key_queue_capacity),
        }
    }
}
