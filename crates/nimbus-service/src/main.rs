//! Nimbus Service - cached weather lookup API.
//!
//! Run with: `cargo run -p nimbus-service`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use nimbus_service::{AppState, Config, Refresher, api};
use nimbus_store::Store;
use nimbus_upstream::UpstreamClient;

/// Nimbus Service - cached weather lookup REST API.
#[derive(Parser, Debug)]
#[command(name = "nimbus-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Database path (overrides config).
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Disable the background refresher (API only mode).
    #[arg(long)]
    no_refresher: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nimbus_service=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default().unwrap_or_default(),
    };

    // Override config with CLI args
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(db_path) = args.database {
        config.storage.path = db_path;
    }

    config.validate()?;

    // A missing API key or base URL must fail here, not on first use
    let api_key = config.upstream.resolve_api_key().unwrap_or_default();
    let upstream = UpstreamClient::with_timeout(
        &config.upstream.base_url,
        &api_key,
        config.upstream.timeout(),
    )
    .context("upstream weather provider is not configured")?;

    // Open the database
    info!("Opening database at {:?}", config.storage.path);
    let store = Store::open(&config.storage.path)?;

    // Create application state
    let state = AppState::new(store, Arc::new(upstream), config.clone());

    // Start the background refresher
    if !args.no_refresher {
        Refresher::new(Arc::clone(&state)).start();
    } else {
        info!("Background refresher disabled");
    }

    // Build the router
    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(Arc::clone(&state));

    // Parse bind address
    let addr: SocketAddr = config.server.bind.parse()?;

    info!("Starting server on {}", addr);

    // Run the server; ctrl-c stops the refresher before the listener
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    Ok(())
}

/// Wait for ctrl-c, then signal the refresher to stop scheduling runs.
async fn shutdown_signal(state: Arc<AppState>) {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
    state.refresher.signal_stop();
}
