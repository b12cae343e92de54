//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging when you only want the REST server (with
//! OpenAPI/Swagger UI). The workspace's main `rentdesk-run` binary also runs the monthly
//! invoice scheduler.

use api_rest::{router, AppState, RestConfig};
use rentdesk_core::{CoreConfig, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Rentdesk REST API server
///
/// # Environment Variables
/// - `RENTDESK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `RENTDESK_DATA_DIR`: Record storage directory (default: "rentdesk_data")
/// - `RENTDESK_API_TOKENS`: Comma-separated bearer tokens (empty disables auth)
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the store cannot be opened,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("rentdesk_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest = RestConfig::from_env();
    let cfg = Arc::new(CoreConfig::from_env()?);
    let store = Arc::new(Store::open(cfg.data_dir())?);

    tracing::info!("-- Starting Rentdesk REST API on {}", rest.addr);

    let app = router(AppState::new(cfg, store, rest.tokens));
    let listener = tokio::net::TcpListener::bind(&rest.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
