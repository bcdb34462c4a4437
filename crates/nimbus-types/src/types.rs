//! Core data types.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// How an upstream weather lookup is keyed.
///
/// The provider accepts either a city name (`q` query parameter) or a
/// postal code (`zip` query parameter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherQuery {
    /// Look up by city name.
    City(String),
    /// Look up by postal code.
    Zip(String),
}

impl WeatherQuery {
    /// The provider query parameter name for this key.
    pub fn param(&self) -> &'static str {
        match self {
            WeatherQuery::City(_) => "q",
            WeatherQuery::Zip(_) => "zip",
        }
    }

    /// The query value (city name or postal code).
    pub fn value(&self) -> &str {
        match self {
            WeatherQuery::City(v) | WeatherQuery::Zip(v) => v,
        }
    }

    /// The postal code, if this is a zip-keyed query.
    pub fn zip_code(&self) -> Option<&str> {
        match self {
            WeatherQuery::City(_) => None,
            WeatherQuery::Zip(zip) => Some(zip),
        }
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeatherQuery::City(city) => write!(f, "city '{}'", city),
            WeatherQuery::Zip(zip) => write!(f, "zip '{}'", zip),
        }
    }
}

/// A single weather value fetched from the upstream provider.
///
/// Observations are transient: the store assigns an id when one is
/// persisted. `zip_code` is only set when the observation came from a
/// zip-keyed fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    /// Canonical city name as returned by the provider.
    pub city: String,
    /// Postal code used for the fetch, if any.
    pub zip_code: Option<String>,
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
    /// Free-text weather summary.
    pub description: String,
    /// When this value was fetched from the provider (UTC).
    #[serde(with = "time::serde::rfc3339")]
    pub retrieved_at: OffsetDateTime,
}
