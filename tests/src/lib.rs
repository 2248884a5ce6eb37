//! Shared test harness for keysweep integration tests.
//!
//! Provides [`TestDeployment`]: N in-memory shards behind the engine, with
//! helpers to seed keys across them and to wrap individual shards in a
//! [`FaultyShard`] before the engine is built.

use std::sync::Arc;

use keysweep_engine::{Engine, EngineConfig};
use keysweep_store::{FaultyShard, MemoryShard, Shard, ShardCommands};
use keysweep_types::ShardId;

/// Install a test-friendly subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// N in-memory shards named `shard-0` .. `shard-{N-1}`.
pub struct TestDeployment {
    stores: Vec<Arc<MemoryShard>>,
    commands: Vec<Arc<dyn ShardCommands>>,
}

impl TestDeployment {
    /// Create `n` empty shards using the store's default page size.
    pub fn new(n: usize) -> Self {
        let stores: Vec<Arc<MemoryShard>> = (0..n).map(|_| Arc::new(MemoryShard::new())).collect();
        let commands = stores
            .iter()
            .map(|s| s.clone() as Arc<dyn ShardCommands>)
            .collect();
        Self { stores, commands }
    }

    /// Wrap shard `i` in a [`FaultyShard`] configured by `configure`.
    pub fn with_faults(mut self, i: usize, configure: impl FnOnce(FaultyShard) -> FaultyShard) -> Self {
        let faulty = configure(FaultyShard::new(self.stores[i].clone()));
        self.commands[i] = Arc::new(faulty);
        self
    }

    /// Number of shards.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Backing store of shard `i`, bypassing any fault wrapper.
    pub fn store(&self, i: usize) -> &Arc<MemoryShard> {
        &self.stores[i]
    }

    /// Identity of shard `i`.
    pub fn id(&self, i: usize) -> ShardId {
        ShardId::new(format!("shard-{i}"))
    }

    /// Insert `{prefix}:{j}` for `j in 0..n` on shard `i`.
    pub fn seed_on(&self, i: usize, prefix: &str, n: usize) {
        for j in 0..n {
            self.stores[i].insert(format!("{prefix}:{j}"));
        }
    }

    /// Insert `{prefix}:{j}` for `j in 0..n`, spread round-robin.
    pub fn seed_round_robin(&self, prefix: &str, n: usize) {
        self.seed_with(prefix, n, |j| j);
    }

    /// Insert `{prefix}:{j}` for `j in 0..n` on the shard `pick(j)` selects
    /// (taken modulo the shard count).
    pub fn seed_with(&self, prefix: &str, n: usize, pick: impl Fn(usize) -> usize) {
        for j in 0..n {
            let i = pick(j) % self.stores.len();
            self.stores[i].insert(format!("{prefix}:{j}"));
        }
    }

    /// Keys matching `pattern` on shard `i`, counted directly on the store.
    pub fn matching_on(&self, i: usize, pattern: &str) -> usize {
        self.stores[i].count_matching(pattern)
    }

    /// Keys matching `pattern` across all shards.
    pub fn matching(&self, pattern: &str) -> usize {
        self.stores.iter().map(|s| s.count_matching(pattern)).sum()
    }

    /// Shard handles, including any fault wrappers.
    pub fn shards(&self) -> Vec<Shard> {
        self.commands
            .iter()
            .enumerate()
            .map(|(i, commands)| Shard::new(self.id(i), commands.clone()))
            .collect()
    }

    /// Build an engine over every shard.
    pub fn engine(&self, config: EngineConfig) -> Engine {
        Engine::new(self.shards(), config).expect("valid test topology")
    }
}
