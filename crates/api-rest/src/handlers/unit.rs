//! Rental units, including tenant assignment and vacating.

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
    AssignTenant, RentalUnit, RentalUnitChanges, RentalUnitFilter, RentalUnitInput,
};
use rentdesk_core::pagination::RentalUnitPage;
use rentdesk_core::services::RentalUnitService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route(
            "/:id",
            get(get_unit)
                .put(update_unit)
                .patch(update_unit)
                .delete(delete_unit),
        )
        .route("/:id/assign-tenant", post(assign_tenant))
        .route("/:id/vacate", post(vacate))
}

#[utoipa::path(
    get,
    path = "/api/v1/rental-units",
    tag = "rental-units",
    params(PageRequest, RentalUnitFilter),
    responses(
        (status = 200, description = "Rental units ordered by creation", body = RentalUnitPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_units(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<RentalUnitFilter>,
) -> ApiResult<Json<Page<RentalUnit>>> {
    Ok(Json(RentalUnitService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/rental-units",
    tag = "rental-units",
    request_body = RentalUnitInput,
    responses(
        (status = 201, description = "Rental unit created", body = RentalUnit),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Unit number already used in this property", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_unit(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RentalUnitInput>,
) -> ApiResult<(StatusCode, Json<RentalUnit>)> {
    let unit = RentalUnitService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[utoipa::path(
    get,
    path = "/api/v1/rental-units/{id}",
    tag = "rental-units",
    params(("id" = RecordId, Path, description = "Rental unit id")),
    responses(
        (status = 200, description = "Rental unit", body = RentalUnit),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_unit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<RentalUnit>> {
    Ok(Json(RentalUnitService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/rental-units/{id}",
    tag = "rental-units",
    params(("id" = RecordId, Path, description = "Rental unit id")),
    request_body = RentalUnitChanges,
    responses(
        (status = 200, description = "Rental unit updated", body = RentalUnit),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Status change not allowed in the unit's current state", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_unit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<RentalUnitChanges>,
) -> ApiResult<Json<RentalUnit>> {
    Ok(Json(RentalUnitService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/rental-units/{id}",
    tag = "rental-units",
    params(("id" = RecordId, Path, description = "Rental unit id")),
    responses(
        (status = 204, description = "Rental unit deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Unit is occupied or still referenced", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_unit(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    RentalUnitService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/rental-units/{id}/assign-tenant",
    tag = "rental-units",
    params(("id" = RecordId, Path, description = "Rental unit id")),
    request_body = AssignTenant,
    responses(
        (status = 200, description = "Tenant moved in; unit is now occupied", body = RentalUnit),
        (status = 400, description = "Unknown tenant", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Unit not vacant, or tenant inactive or housed elsewhere", body = ErrorBody)
    )
)]
/// Move a tenant into a vacant unit.
///
/// The unit's `tenant_id` and the tenant's `rental_unit_id` are updated in the same
/// write, so either both change or neither does.
#[axum::debug_handler]
pub(crate) async fn assign_tenant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(req): ApiJson<AssignTenant>,
) -> ApiResult<Json<RentalUnit>> {
    let unit = RentalUnitService::new(state.store).assign_tenant(id, req.tenant_id)?;
    Ok(Json(unit))
}

#[utoipa::path(
    post,
    path = "/api/v1/rental-units/{id}/vacate",
    tag = "rental-units",
    params(("id" = RecordId, Path, description = "Rental unit id")),
    responses(
        (status = 200, description = "Unit vacated", body = RentalUnit),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Unit is not occupied", body = ErrorBody)
    )
)]
/// Move the current tenant out. The unit returns to `vacant`.
#[axum::debug_handler]
pub(crate) async fn vacate(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<RentalUnit>> {
    Ok(Json(RentalUnitService::new(state.store).vacate(id)?))
}
