//! `keysweep`: count or delete keys by pattern on a standalone instance or
//! across every master of a cluster.
//!
//! # Usage
//!
//! ```text
//! keysweep -n 127.0.0.1:6379 count                     # keyspace size
//! keysweep -n 127.0.0.1:6379 -d 2 count -f 'user:*'    # matching keys in db 2
//! keysweep -c -n 10.0.0.1:7000,10.0.0.2:7000 clear -f 'session:*'
//! keysweep --config keysweep.toml clear -f 'tmp:*'
//! ```

mod config;
mod summary;
mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use keysweep_conn::DeploymentMode;
use keysweep_engine::{Engine, EngineReport};
use tracing::{info, warn};

use config::CliConfig;
use summary::{Operation, log_summary};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(
    name = "keysweep",
    version,
    about = "Count or delete keys by pattern across every shard"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat the nodes as cluster masters instead of one standalone instance.
    #[arg(short, long, global = true)]
    cluster: bool,

    /// Comma-separated `host:port` list.
    #[arg(short, long, global = true)]
    nodes: Option<String>,

    /// ACL user name.
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password, if the store requires one.
    #[arg(short = 'a', long, global = true, env = "KEYSWEEP_PASSWORD")]
    password: Option<String>,

    /// Logical database index (single mode only).
    #[arg(short, long, global = true, allow_negative_numbers = true)]
    database: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Count keys matching a pattern. Without a pattern, report the keyspace size.
    Count {
        /// Glob-style key pattern.
        #[arg(short = 'f', long, default_value = "")]
        pattern: String,
    },

    /// Delete keys matching a pattern. An empty pattern is refused.
    Clear {
        /// Glob-style key pattern.
        #[arg(short = 'f', long)]
        pattern: String,
    },
}

impl Cli {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(&self, config: &mut CliConfig) {
        if self.cluster {
            config.connection.mode = DeploymentMode::Cluster;
        }
        if let Some(nodes) = &self.nodes {
            config.connection.nodes = vec![nodes.clone()];
        }
        if let Some(username) = &self.username {
            config.connection.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.connection.password = Some(password.clone());
        }
        if let Some(database) = self.database {
            config.connection.database = database;
        }
    }
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    telemetry::init(&config.log.level);
    cli.apply(&mut config);

    let settings = config
        .connection
        .validate()
        .context("invalid connection configuration")?;
    let shards = keysweep_conn::connect(&settings)
        .await
        .context("failed to resolve topology")?;
    let engine =
        Engine::new(shards, config.engine_config()).context("failed to start engine")?;

    let result = run(&engine, &cli.command).await;
    engine.close().await;

    let (operation, report) = result?;
    log_summary(operation, &report);
    if engine.is_cancelled() {
        warn!("interrupted: results are partial");
    }
    Ok(())
}

/// Run the command, cancelling cooperatively on Ctrl-C.
async fn run(engine: &Engine, command: &Commands) -> Result<(Operation, EngineReport)> {
    let work = execute(engine, command);
    tokio::pin!(work);

    tokio::select! {
        result = &mut work => result,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("interrupt received, stopping scans");
            engine.cancel();
            work.await
        }
    }
}

async fn execute(engine: &Engine, command: &Commands) -> Result<(Operation, EngineReport)> {
    match command {
        Commands::Count { pattern } => {
            info!(%pattern, shards = engine.shard_ids().len(), "counting keys");
            Ok((Operation::Count, engine.count(pattern).await))
        }
        Commands::Clear { pattern } => {
            info!(%pattern, shards = engine.shard_ids().len(), "clearing keys");
            match engine.clear(pattern).await {
                Some(report) => Ok((Operation::Clear, report)),
                None => bail!("clear requires a non-empty pattern"),
            }
        }
    }
}
