//! Logging initialization for the keysweep binary.
//!
//! Console-only `tracing-subscriber` output filtered by `RUST_LOG`, or by the
//! configured level when `RUST_LOG` is unset. The engine itself never
//! installs a subscriber; results are emitted through it as log events.

use tracing_subscriber::EnvFilter;

/// Initialize the subscriber. Call once, before any event is emitted.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
