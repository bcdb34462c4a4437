//! Background weather refresher.
//!
//! Periodically refetches every cached city so lookups mostly hit warm
//! data. The task observes the shared stop signal before and during each
//! sleep; a cycle that is already in flight runs to completion before
//! the task exits.

use std::sync::Arc;

use tokio::time::{MissedTickBehavior, interval};
use tracing::info;

use crate::state::AppState;

/// Background refresher that re-fetches all cached cities on a fixed
/// interval.
pub struct Refresher {
    state: Arc<AppState>,
}

impl Refresher {
    /// Create a new refresher.
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Start the refresh loop.
    ///
    /// Spawns a task that runs one cycle immediately and then one per
    /// configured interval. Returns immediately; refreshing happens in
    /// the background until the stop signal fires.
    pub fn start(&self) {
        let state = Arc::clone(&self.state);
        let period = state.config.cache.refresh_interval();
        let mut stop_rx = state.refresher.subscribe_stop();

        state.refresher.set_running(true);
        info!("Starting weather refresher (interval: {}s)", period.as_secs());

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = timer.tick() => {}
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                run_cycle(&state).await;
            }

            state.refresher.set_running(false);
            info!("Weather refresher stopped");
        });
    }
}

/// Run one refresh cycle and record it.
pub async fn run_cycle(state: &AppState) {
    info!("Refreshing weather data for all cached cities");
    state.lookup.refresh_all().await;
    state.refresher.record_cycle().await;
    info!("Weather refresh cycle complete");
}
