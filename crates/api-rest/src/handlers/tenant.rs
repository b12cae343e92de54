//! Tenants.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use api_shared::ErrorBody;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use rentdesk_core::models::{Tenant, TenantChanges, TenantFilter, TenantInput};
use rentdesk_core::pagination::TenantPage;
use rentdesk_core::services::TenantService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tenants).post(create_tenant))
        .route(
            "/:id",
            get(get_tenant)
                .put(update_tenant)
                .patch(update_tenant)
                .delete(delete_tenant),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    tag = "tenants",
    params(PageRequest, TenantFilter),
    responses(
        (status = 200, description = "Tenants ordered by creation", body = TenantPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_tenants(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<TenantFilter>,
) -> ApiResult<Json<Page<Tenant>>> {
    Ok(Json(TenantService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    tag = "tenants",
    request_body = TenantInput,
    responses(
        (status = 201, description = "Tenant created", body = Tenant),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Unit is not available", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_tenant(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<TenantInput>,
) -> ApiResult<(StatusCode, Json<Tenant>)> {
    let tenant = TenantService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(tenant)))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    tag = "tenants",
    params(("id" = RecordId, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "Tenant", body = Tenant),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_tenant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Tenant>> {
    Ok(Json(TenantService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}",
    tag = "tenants",
    params(("id" = RecordId, Path, description = "Tenant id")),
    request_body = TenantChanges,
    responses(
        (status = 200, description = "Tenant updated", body = Tenant),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Unit is not available", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_tenant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<TenantChanges>,
) -> ApiResult<Json<Tenant>> {
    Ok(Json(TenantService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{id}",
    tag = "tenants",
    params(("id" = RecordId, Path, description = "Tenant id")),
    responses(
        (status = 204, description = "Tenant deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Tenant has unpaid invoices", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_tenant(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    TenantService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
