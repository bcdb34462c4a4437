//! HTTP client for the upstream weather provider.
//!
//! The provider is an OpenWeatherMap-style JSON API: one GET per lookup,
//! keyed by city name (`q`) or postal code (`zip`), authenticated with an
//! `appid` query parameter, metric units.
//!
//! The [`FetchWeather`] trait is the seam between the lookup service and
//! the network; [`UpstreamClient`] is the real implementation, and tests
//! substitute their own.
//!
//! # Example
//!
//! ```no_run
//! use nimbus_types::WeatherQuery;
//! use nimbus_upstream::{FetchWeather, UpstreamClient};
//!
//! # async fn example() -> Result<(), nimbus_upstream::Error> {
//! let client = UpstreamClient::new("https://api.openweathermap.org/data/2.5/weather", "key")?;
//! let observation = client.fetch(&WeatherQuery::City("London".to_string())).await?;
//! println!("{}: {} C", observation.city, observation.temperature_c);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod payload;

pub use client::{FetchWeather, UpstreamClient};
pub use error::{Error, Result};
