//! Shared types for the nimbus weather cache.
//!
//! This crate holds the plain data types passed between the upstream
//! client, the store, and the lookup service:
//!
//! - [`WeatherObservation`] - one weather value fetched from the provider
//! - [`WeatherQuery`] - how a lookup is keyed (city name or postal code)

mod types;

pub use types::{WeatherObservation, WeatherQuery};
