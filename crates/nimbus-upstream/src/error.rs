//! Error types for nimbus-upstream.

/// Result type for nimbus-upstream operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the upstream provider.
///
/// Configuration variants (`MissingBaseUrl`, `MissingApiKey`,
/// `InvalidBaseUrl`) are raised at construction and are fatal. Everything
/// else is a per-fetch failure that callers absorb as "no data".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base URL is missing or empty.
    #[error("Upstream base URL is not configured")]
    MissingBaseUrl,

    /// The API key is missing or empty.
    #[error("Upstream API key is not configured")]
    MissingApiKey,

    /// The base URL does not look like an HTTP URL.
    #[error("Invalid upstream base URL: {0}")]
    InvalidBaseUrl(String),

    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("Upstream returned status {0}")]
    Status(reqwest::StatusCode),

    /// The response body was not the expected JSON shape.
    #[error("Malformed weather payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Syntactically valid JSON missing a required value.
    #[error("Weather payload is missing required fields")]
    IncompletePayload,
}
