//! Properties.

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
use rentdesk_core::models::{Property, PropertyChanges, PropertyFilter, PropertyInput};
use rentdesk_core::pagination::PropertyPage;
use rentdesk_core::services::PropertyService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_properties).post(create_property))
        .route(
            "/:id",
            get(get_property)
                .put(update_property)
                .patch(update_property)
                .delete(delete_property),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/properties",
    tag = "properties",
    params(PageRequest, PropertyFilter),
    responses(
        (status = 200, description = "Propertys ordered by creation", body = PropertyPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_properties(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<PropertyFilter>,
) -> ApiResult<Json<Page<Property>>> {
    Ok(Json(PropertyService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/properties",
    tag = "properties",
    request_body = PropertyInput,
    responses(
        (status = 201, description = "Property created", body = Property),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Conflicting property", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_property(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PropertyInput>,
) -> ApiResult<(StatusCode, Json<Property>)> {
    let property = PropertyService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(property)))
}

#[utoipa::path(
    get,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    params(("id" = RecordId, Path, description = "Property id")),
    responses(
        (status = 200, description = "Property", body = Property),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Property>> {
    Ok(Json(PropertyService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    params(("id" = RecordId, Path, description = "Property id")),
    request_body = PropertyChanges,
    responses(
        (status = 200, description = "Property updated", body = Property),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Conflicting property", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<PropertyChanges>,
) -> ApiResult<Json<Property>> {
    Ok(Json(PropertyService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/properties/{id}",
    tag = "properties",
    params(("id" = RecordId, Path, description = "Property id")),
    responses(
        (status = 204, description = "Property deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Property still has units or assets", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_property(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    PropertyService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
