use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info, instrument};

use super::store::InMemorySessionStore;

/// Configuration for the sweep task
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// How often expired entries are dropped
    pub sweep_interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
        }
    }
}

/// Periodically purges expired entries from an in-memory store.
///
/// Redis expires keys natively; the in-memory store only hides them, so
/// without this loop dead sessions would accumulate.
#[instrument(skip(store))]
pub async fn start_sweep_task(store: Arc<InMemorySessionStore>, config: SweepConfig) {
    info!(
        sweep_interval_secs = config.sweep_interval.as_secs(),
        "Starting session sweep background task"
    );

    let mut sweep_interval = interval(config.sweep_interval);

    loop {
        sweep_interval.tick().await;

        let removed = store.purge_expired().await;
        if removed > 0 {
            info!(removed_entries = removed, "Session sweep completed");
        } else {
            debug!("Session sweep found nothing to remove");
        }
    }
}

pub fn spawn_sweep_task(store: Arc<InMemorySessionStore>, config: SweepConfig) -> JoinHandle<()> {
    tokio::spawn(start_sweep_task(store, config))
}
