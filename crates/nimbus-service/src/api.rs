//! REST API endpoints for the nimbus-service.
//!
//! Two lookup routes map straight onto the lookup service; "not found"
//! (no cached record and nothing from the provider) is a 404 with a JSON
//! error body, not a failure. Store errors surface as 500s.
//!
//! The store mutex is the only lock handlers touch, and it is held just
//! long enough for the query at hand - lookups release it before any
//! provider call.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use time::OffsetDateTime;

use nimbus_store::StoredWeather;

use crate::refresher;
use crate::state::{AppState, RefreshStats};

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        // Health and status
        .route("/api/health", get(health))
        .route("/api/status", get(get_status))
        // Weather lookups
        .route("/api/weather", get(list_weather))
        .route("/api/weather/city/{city}", get(get_by_city))
        .route("/api/weather/zip/{zip}", get(get_by_zip))
        // Manual refresh trigger
        .route("/api/refresh", post(trigger_refresh))
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
    })
}

/// Service status response.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Service version.
    pub version: &'static str,
    /// Current timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Refresher status.
    pub refresher: RefresherStatus,
    /// Number of cached weather records.
    pub cached_records: u64,
}

/// Refresher status.
#[derive(Debug, Serialize)]
pub struct RefresherStatus {
    /// Whether the refresher task is running.
    pub running: bool,
    /// When the refresher was started (if running).
    #[serde(with = "time::serde::rfc3339::option")]
    pub started_at: Option<OffsetDateTime>,
    /// Cycle statistics.
    #[serde(flatten)]
    pub stats: RefreshStats,
}

/// Get service status including refresher state and cache size.
async fn get_status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, AppError> {
    let cached_records = {
        let store = state.store.lock().await;
        store.count()?
    };

    Ok(Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        timestamp: OffsetDateTime::now_utc(),
        refresher: RefresherStatus {
            running: state.refresher.is_running(),
            started_at: state.refresher.started_at(),
            stats: state.refresher.stats().await,
        },
        cached_records,
    }))
}

/// List all cached weather records, newest first.
async fn list_weather(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredWeather>>, AppError> {
    let records = {
        let store = state.store.lock().await;
        store.list()?
    };
    Ok(Json(records))
}

/// Look up current weather by city name.
async fn get_by_city(
    State(state): State<Arc<AppState>>,
    Path(city): Path<String>,
) -> Result<Json<StoredWeather>, AppError> {
    match state.lookup.by_city(&city).await? {
        Some(record) => Ok(Json(record)),
        None => Err(AppError::NotFound(format!(
            "No weather data found for city '{}'",
            city
        ))),
    }
}

/// Look up current weather by postal code.
async fn get_by_zip(
    State(state): State<Arc<AppState>>,
    Path(zip): Path<String>,
) -> Result<Json<StoredWeather>, AppError> {
    match state.lookup.by_zip(&zip).await? {
        Some(record) => Ok(Json(record)),
        None => Err(AppError::NotFound(format!(
            "No weather data found for zip '{}'",
            zip
        ))),
    }
}

/// Response for the manual refresh trigger.
#[derive(Debug, Serialize)]
pub struct RefreshActionResponse {
    pub success: bool,
    pub message: String,
}

/// Run one refresh cycle immediately.
async fn trigger_refresh(State(state): State<Arc<AppState>>) -> Json<RefreshActionResponse> {
    refresher::run_cycle(&state).await;
    Json(RefreshActionResponse {
        success: true,
        message: "Refresh cycle complete".to_string(),
    })
}

/// API error responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Store(nimbus_store::Error),
}

impl From<nimbus_store::Error> for AppError {
    fn from(e: nimbus_store::Error) -> Self {
        AppError::Store(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}
