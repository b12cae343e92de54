use crate::error::ApiResult;
use crate::AppState;
use axum::{extract::State, response::Json};
use rentdesk_core::services::today;
use rentdesk_core::{ReportService, Summary};

#[utoipa::path(
    get,
    path = "/api/v1/reports/summary",
    tag = "reports",
    responses(
        (status = 200, description = "Portfolio summary as of today", body = Summary)
    )
)]
/// Occupancy, open maintenance and arrears across the whole portfolio.
#[axum::debug_handler]
pub(crate) async fn summary(State(state): State<AppState>) -> ApiResult<Json<Summary>> {
    Ok(Json(ReportService::new(state.store).summary(today())?))
}
