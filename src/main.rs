mod scheduler;

use api_rest::{AppState, RestConfig, router};
use rentdesk_core::{CoreConfig, Store};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the Rentdesk application
///
/// Runs the REST server and, unless disabled, the monthly rent-invoice scheduler in the same
/// process, sharing one record store.
///
/// # Environment Variables
/// - `RENTDESK_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `RENTDESK_DATA_DIR`: Directory for record storage (default: "rentdesk_data")
/// - `RENTDESK_API_TOKENS`: Comma-separated bearer tokens; empty disables authentication
/// - `RENTDESK_INVOICE_DUE_DAY`, `RENTDESK_INVOICE_GENERATION_DAY`, `RENTDESK_INVOICE_PREFIX`:
///   billing settings
/// - `RENTDESK_SCHEDULER`: set to `false` to turn the invoice scheduler off
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If configuration, startup or the server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rentdesk_run=info".parse()?)
                .add_directive("rentdesk_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest = RestConfig::from_env();
    let cfg = Arc::new(CoreConfig::from_env()?);
    let store = Arc::new(Store::open(cfg.data_dir())?);

    if scheduler::enabled_from_env_value(std::env::var("RENTDESK_SCHEDULER").ok()) {
        tracing::info!(
            "++ Invoice scheduler on; runs from day {} of each month",
            cfg.invoice_generation_day()
        );
        tokio::spawn(scheduler::run(cfg.clone(), store.clone()));
    } else {
        tracing::info!("++ Invoice scheduler disabled");
    }

    tracing::info!("++ Starting Rentdesk REST on {}", rest.addr);
    let app = router(AppState::new(cfg, store, rest.tokens));
    let listener = tokio::net::TcpListener::bind(&rest.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
