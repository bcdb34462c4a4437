//! Data models for stored records.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// A weather record stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWeather {
    /// Database row ID, assigned on insert and never changed.
    pub id: i64,
    /// Canonical city name; the reconciliation key for upserts.
    pub city: String,
    /// Postal code from the most recent zip-keyed fetch, if any.
    pub zip_code: Option<String>,
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Free-text weather summary.
    pub description: String,
    /// When this value was fetched from the provider (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub retrieved_at: OffsetDateTime,
}

impl StoredWeather {
    /// Whether this record was retrieved within `max_age` of now.
    ///
    /// A record that is not fresh must be refetched before being trusted.
    pub fn is_fresh(&self, max_age: Duration) -> bool {
        OffsetDateTime::now_utc() - self.retrieved_at < max_age
    }
}
