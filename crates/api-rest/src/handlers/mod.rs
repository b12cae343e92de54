//! Request handlers, one module per resource.

pub(crate) mod access;
pub(crate) mod asset;
pub(crate) mod invoice;
pub(crate) mod maintenance;
pub(crate) mod payment;
pub(crate) mod property;
pub(crate) mod reference;
pub(crate) mod report;
pub(crate) mod tenant;
pub(crate) mod unit;

use crate::AppState;
use api_shared::{HealthRes, HealthService};
use axum::{extract::State, response::Json};

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Never requires a token.
#[axum::debug_handler]
pub(crate) async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}
