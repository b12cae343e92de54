//! Assets (fixtures and equipment) tracked per property or unit.

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
use rentdesk_core::models::{Asset, AssetChanges, AssetFilter, AssetInput};
use rentdesk_core::pagination::AssetPage;
use rentdesk_core::services::AssetService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_assets).post(create_asset))
        .route(
            "/:id",
            get(get_asset)
                .put(update_asset)
                .patch(update_asset)
                .delete(delete_asset),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/assets",
    tag = "assets",
    params(PageRequest, AssetFilter),
    responses(
        (status = 200, description = "Assets ordered by creation", body = AssetPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_assets(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<AssetFilter>,
) -> ApiResult<Json<Page<Asset>>> {
    Ok(Json(AssetService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/assets",
    tag = "assets",
    request_body = AssetInput,
    responses(
        (status = 201, description = "Asset created", body = Asset),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Conflicting asset", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_asset(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<AssetInput>,
) -> ApiResult<(StatusCode, Json<Asset>)> {
    let asset = AssetService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[utoipa::path(
    get,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    params(("id" = RecordId, Path, description = "Asset id")),
    responses(
        (status = 200, description = "Asset", body = Asset),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Asset>> {
    Ok(Json(AssetService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    params(("id" = RecordId, Path, description = "Asset id")),
    request_body = AssetChanges,
    responses(
        (status = 200, description = "Asset updated", body = Asset),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Asset has an open maintenance request", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<AssetChanges>,
) -> ApiResult<Json<Asset>> {
    Ok(Json(AssetService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/assets/{id}",
    tag = "assets",
    params(("id" = RecordId, Path, description = "Asset id")),
    responses(
        (status = 204, description = "Asset deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Asset has an open maintenance request", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_asset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    AssetService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
