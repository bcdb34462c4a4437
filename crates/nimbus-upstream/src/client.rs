//! The reqwest-backed provider client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use nimbus_types::{WeatherObservation, WeatherQuery};

use crate::error::{Error, Result};
use crate::payload;

/// Default per-request timeout.
///
/// The provider call is on the request path, so it must be bounded.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait abstracting the upstream weather fetch.
///
/// The lookup service talks to the provider only through this trait, so
/// tests can count and script fetches without a network.
#[async_trait]
pub trait FetchWeather: Send + Sync {
    /// Fetch one observation for the given query.
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherObservation>;
}

/// HTTP client for the upstream weather provider.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl UpstreamClient {
    /// Create a client with the default timeout.
    ///
    /// Fails immediately when the base URL or API key is missing or
    /// malformed; a misconfigured client must never reach first use.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom per-request timeout.
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(Error::MissingBaseUrl);
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::InvalidBaseUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }
        if api_key.is_empty() {
            return Err(Error::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Request)?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl FetchWeather for UpstreamClient {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherObservation> {
        // The API key travels as a query parameter; keep it out of logs.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                (query.param(), query.value()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            debug!("Upstream returned {} for {}", status, query);
            return Err(Error::Status(status));
        }

        let body = response.text().await?;
        payload::parse_observation(&body, query.zip_code())
    }
}
