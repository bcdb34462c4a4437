//! Cached weather lookup REST API with background refresh.
//!
//! This crate provides a service that:
//! - Serves current weather by city name or postal code
//! - Caches provider responses locally and trusts them for a
//!   configurable freshness window (default 1 hour)
//! - Refetches stale or missing records from the upstream provider on
//!   demand
//! - Refreshes every cached city in the background on a fixed interval
//!   (default 30 minutes)
//!
//! # REST API Endpoints
//!
//! - `GET /api/health` - Service health check
//! - `GET /api/status` - Refresher state and cache size
//! - `GET /api/weather` - List all cached records
//! - `GET /api/weather/city/{city}` - Current weather for a city
//! - `GET /api/weather/zip/{zip}` - Current weather for a postal code
//! - `POST /api/refresh` - Run one refresh cycle immediately
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/nimbus/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [storage]
//! path = "~/.local/share/nimbus/weather.db"
//!
//! [upstream]
//! base_url = "https://api.openweathermap.org/data/2.5/weather"
//! api_key = "..."   # or set OPENWEATHERMAP_API_KEY
//! timeout_secs = 10
//!
//! [cache]
//! freshness_secs = 3600
//! refresh_interval_secs = 1800
//! ```
//!
//! A missing base URL or API key is a fatal startup error; everything
//! else has working defaults.

pub mod api;
pub mod config;
pub mod lookup;
pub mod refresher;
pub mod state;

pub use config::{
    CacheConfig, Config, ConfigError, ServerConfig, StorageConfig, UpstreamConfig,
};
pub use lookup::WeatherLookup;
pub use refresher::Refresher;
pub use state::{AppState, RefreshStats, RefresherState};
