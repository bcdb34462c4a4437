//! Local persistence for cached weather records.
//!
//! This crate provides SQLite-based storage for weather values fetched
//! from the upstream provider. Records are keyed by city name through the
//! upsert logic (one row per distinct city) and can also be looked up by
//! postal code.
//!
//! # Example
//!
//! ```no_run
//! use nimbus_store::Store;
//!
//! let store = Store::open_default()?;
//! let cached = store.get_by_city("London")?;
//! # Ok::<(), nimbus_store::Error>(())
//! ```

mod error;
mod models;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::StoredWeather;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/nimbus/weather.db`
/// - macOS: `~/Library/Application Support/nimbus/weather.db`
/// - Windows: `C:\Users\<user>\AppData\Local\nimbus\weather.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("nimbus")
        .join("weather.db")
}
