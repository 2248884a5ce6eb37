//! Topology resolution: validated settings to health-checked master shards.

use std::sync::Arc;

use keysweep_store::{Shard, ShardCommands};
use tracing::{info, warn};

use crate::config::{ConnectionSettings, DeploymentMode, Endpoint};
use crate::error::ConnError;
use crate::redis_shard::{NodeRole, RedisShard};

/// Connect to every shard described by `settings`.
///
/// Single mode fails if the one endpoint cannot be reached or does not
/// answer `PING`. Cluster mode skips unreachable endpoints and non-masters
/// with a warning, and fails only if no master remains.
pub async fn connect(settings: &ConnectionSettings) -> Result<Vec<Shard>, ConnError> {
    match settings.mode() {
        DeploymentMode::Single => {
            let endpoint = &settings.endpoints()[0];
            let shard = RedisShard::connect(endpoint, settings).await?;
            shard
                .ping()
                .await
                .map_err(|source| ConnError::HealthCheck {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            info!(%endpoint, database = settings.database(), "connected to single instance");
            Ok(vec![into_shard(endpoint, shard)])
        }
        DeploymentMode::Cluster => connect_cluster(settings).await,
    }
}

async fn connect_cluster(settings: &ConnectionSettings) -> Result<Vec<Shard>, ConnError> {
    let mut shards = Vec::new();

    for endpoint in settings.endpoints() {
        let shard = match RedisShard::connect(endpoint, settings).await {
            Ok(shard) => shard,
            Err(e) => {
                warn!(%endpoint, error = %e, "skipping unreachable cluster node");
                continue;
            }
        };

        if let Err(e) = shard.ping().await {
            warn!(%endpoint, error = %e, "skipping cluster node that failed health check");
            let _ = shard.close().await;
            continue;
        }

        match shard.role().await {
            Ok(NodeRole::Master) => {
                info!(%endpoint, "cluster master ready");
                shards.push(into_shard(endpoint, shard));
            }
            Ok(role) => {
                info!(%endpoint, ?role, "skipping cluster node that is not a master");
                let _ = shard.close().await;
            }
            Err(e) => {
                warn!(%endpoint, error = %e, "skipping cluster node with unknown role");
                let _ = shard.close().await;
            }
        }
    }

    if shards.is_empty() {
        return Err(ConnError::NoReachableShards {
            tried: settings.endpoints().len(),
        });
    }

    info!(masters = shards.len(), "cluster topology resolved");
    Ok(shards)
}

fn into_shard(endpoint: &Endpoint, shard: RedisShard) -> Shard {
    let commands: Arc<dyn ShardCommands> = Arc::new(shard);
    Shard::new(endpoint.to_string(), commands)
}
