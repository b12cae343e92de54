//! Maintenance requests.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use api_shared::ErrorBody;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rentdesk_core::models::{
    MaintenanceChanges, MaintenanceFilter, MaintenanceInput, MaintenanceRequest, StatusChange,
};
use rentdesk_core::pagination::MaintenanceRequestPage;
use rentdesk_core::services::MaintenanceService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_requests).post(create_request))
        .route(
            "/:id",
            get(get_request)
                .put(update_request)
                .patch(update_request)
                .delete(delete_request),
        )
        .route("/:id/status", post(change_status))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance-requests",
    tag = "maintenance",
    params(PageRequest, MaintenanceFilter),
    responses(
        (status = 200, description = "Maintenance requests ordered by creation", body = MaintenanceRequestPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_requests(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<MaintenanceFilter>,
) -> ApiResult<Json<Page<MaintenanceRequest>>> {
    Ok(Json(MaintenanceService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/maintenance-requests",
    tag = "maintenance",
    request_body = MaintenanceInput,
    responses(
        (status = 201, description = "Maintenance request created", body = MaintenanceRequest),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Asset already under repair, or unit occupied", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_request(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<MaintenanceInput>,
) -> ApiResult<(StatusCode, Json<MaintenanceRequest>)> {
    let request = MaintenanceService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/v1/maintenance-requests/{id}",
    tag = "maintenance",
    params(("id" = RecordId, Path, description = "Maintenance request id")),
    responses(
        (status = 200, description = "Maintenance request", body = MaintenanceRequest),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<MaintenanceRequest>> {
    Ok(Json(MaintenanceService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/maintenance-requests/{id}",
    tag = "maintenance",
    params(("id" = RecordId, Path, description = "Maintenance request id")),
    request_body = MaintenanceChanges,
    responses(
        (status = 200, description = "Maintenance request updated", body = MaintenanceRequest),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Request is closed", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<MaintenanceChanges>,
) -> ApiResult<Json<MaintenanceRequest>> {
    Ok(Json(MaintenanceService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/maintenance-requests/{id}",
    tag = "maintenance",
    params(("id" = RecordId, Path, description = "Maintenance request id")),
    responses(
        (status = 204, description = "Maintenance request deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Request is still open", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_request(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    MaintenanceService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/maintenance-requests/{id}/status",
    tag = "maintenance",
    params(("id" = RecordId, Path, description = "Maintenance request id")),
    request_body = StatusChange,
    responses(
        (status = 200, description = "Status changed", body = MaintenanceRequest),
        (status = 400, description = "Invalid transition or cost", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Request already closed", body = ErrorBody)
    )
)]
/// Move a request along its workflow.
///
/// Closing a request (`completed` or `cancelled`) releases its asset and, when it blocked
/// occupancy, returns the unit to `vacant`.
#[axum::debug_handler]
pub(crate) async fn change_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(change): ApiJson<StatusChange>,
) -> ApiResult<Json<MaintenanceRequest>> {
    let request = MaintenanceService::new(state.store).change_status(id, change)?;
    tracing::info!(request_id = %request.id, status = ?request.status, "maintenance status changed");
    Ok(Json(request))
}
