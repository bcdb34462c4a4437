//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use nimbus_store::Store;
use nimbus_upstream::FetchWeather;
use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock, watch};

use crate::config::Config;
use crate::lookup::WeatherLookup;

/// Shared application state.
pub struct AppState {
    /// The record store. The mutex guard is the scoped store handle;
    /// it is never held across an upstream call.
    pub store: Arc<Mutex<Store>>,
    /// Service configuration.
    pub config: Config,
    /// The weather lookup service.
    pub lookup: WeatherLookup,
    /// Refresher control state.
    pub refresher: RefresherState,
}

impl AppState {
    /// Create new application state.
    pub fn new(store: Store, fetcher: Arc<dyn FetchWeather>, config: Config) -> Arc<Self> {
        let store = Arc::new(Mutex::new(store));
        let lookup = WeatherLookup::new(Arc::clone(&store), fetcher, config.cache.freshness());
        Arc::new(Self {
            store,
            config,
            lookup,
            refresher: RefresherState::new(),
        })
    }
}

/// State for tracking and controlling the background refresher.
pub struct RefresherState {
    /// Whether the refresher task is currently running.
    running: AtomicBool,
    /// When the refresher was started (Unix timestamp).
    started_at: AtomicU64,
    /// Channel to signal the refresher task to stop.
    stop_tx: watch::Sender<bool>,
    /// Receiver for the stop signal (cloned by the refresher task).
    stop_rx: watch::Receiver<bool>,
    /// Cycle statistics.
    stats: RwLock<RefreshStats>,
}

impl RefresherState {
    /// Create a new refresher state.
    pub fn new() -> Self {
        let (stop_tx, stop_rx) = watch::channel(false);
        Self {
            running: AtomicBool::new(false),
            started_at: AtomicU64::new(0),
            stop_tx,
            stop_rx,
            stats: RwLock::new(RefreshStats::default()),
        }
    }

    /// Check if the refresher is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Mark the refresher as started or stopped.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
        if running {
            let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
            self.started_at.store(now, Ordering::SeqCst);
        }
    }

    /// Get the refresher start time.
    pub fn started_at(&self) -> Option<OffsetDateTime> {
        let ts = self.started_at.load(Ordering::SeqCst);
        if ts == 0 {
            None
        } else {
            OffsetDateTime::from_unix_timestamp(ts as i64).ok()
        }
    }

    /// Get a receiver for the stop signal.
    pub fn subscribe_stop(&self) -> watch::Receiver<bool> {
        self.stop_rx.clone()
    }

    /// Signal the refresher task to stop.
    pub fn signal_stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Record a completed refresh cycle.
    pub async fn record_cycle(&self) {
        let mut stats = self.stats.write().await;
        stats.cycles += 1;
        stats.last_refresh_at = Some(OffsetDateTime::now_utc());
    }

    /// Get a snapshot of the cycle statistics.
    pub async fn stats(&self) -> RefreshStats {
        self.stats.read().await.clone()
    }
}

impl Default for RefresherState {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics for completed refresh cycles.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RefreshStats {
    /// Total refresh cycles completed since startup.
    pub cycles: u64,
    /// Time of the last completed cycle.
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_refresh_at: Option<OffsetDateTime>,
}
