//! Background scheduler for the periodic price sweep.
//!
//! Each tick re-checks every product without the task channel, then purges
//! channel messages past retention and expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use pricepulse_core::tasks::TaskChannelTrait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Starts the sweep scheduler. The first sweep runs one `every` after start.
pub fn start_sweep_scheduler(
    state: Arc<AppState>,
    every: Duration,
    retention: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Sweep scheduler started ({}s interval)", every.as_secs());
        let mut ticker = interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => run_scheduled_sweep(&state, retention).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Sweep scheduler stopped");
    })
}

/// Runs a single sweep followed by housekeeping.
async fn run_scheduled_sweep(state: &Arc<AppState>, retention: Duration) {
    info!("Running scheduled price sweep...");
    match state.product_service.check_prices().await {
        Ok(summary) => info!(
            "Scheduled sweep completed: {} checked, {} updated, {} unchanged, {} alerts, {} failed",
            summary.checked, summary.updated, summary.unchanged, summary.alerts, summary.failed
        ),
        Err(e) => warn!("Scheduled sweep failed: {}", e),
    }

    match state.task_channel.purge_expired(retention).await {
        Ok(0) => {}
        Ok(purged) => debug!("Purged {} expired task message(s)", purged),
        Err(e) => warn!("Task channel purge failed: {}", e),
    }

    state.product_cache.purge_expired().await;
    debug!("Product cache holds {} entries", state.product_cache.entry_count());
}
