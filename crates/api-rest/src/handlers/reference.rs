//! Currencies, payment types and payment modes.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use api_shared::ErrorBody;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use rentdesk_core::models::{
    Currency, CurrencyChanges, CurrencyInput, LookupChanges, LookupInput, PaymentMode, PaymentType,
};
use rentdesk_core::pagination::{CurrencyPage, PaymentModePage, PaymentTypePage};
use rentdesk_core::services::{CurrencyService, PaymentModeService, PaymentTypeService};
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn currencies() -> Router<AppState> {
    Router::new()
        .route("/", get(list_currencies).post(create_currency))
        .route(
            "/:id",
            get(get_currency)
                .put(update_currency)
                .patch(update_currency)
                .delete(delete_currency),
        )
}

pub(crate) fn payment_types() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payment_types).post(create_payment_type))
        .route(
            "/:id",
            get(get_payment_type)
                .put(update_payment_type)
                .patch(update_payment_type)
                .delete(delete_payment_type),
        )
}

pub(crate) fn payment_modes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payment_modes).post(create_payment_mode))
        .route(
            "/:id",
            get(get_payment_mode)
                .put(update_payment_mode)
                .patch(update_payment_mode)
                .delete(delete_payment_mode),
        )
}

// ============================================================================
// CURRENCIES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/currencies",
    tag = "reference",
    params(PageRequest),
    responses(
        (status = 200, description = "Currencies ordered by creation", body = CurrencyPage),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_currencies(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Currency>>> {
    Ok(Json(CurrencyService::new(state.store).list(&page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/currencies",
    tag = "reference",
    request_body = CurrencyInput,
    responses(
        (status = 201, description = "Currency created", body = Currency),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Code already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_currency(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CurrencyInput>,
) -> ApiResult<(StatusCode, Json<Currency>)> {
    let currency = CurrencyService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(currency)))
}

#[utoipa::path(
    get,
    path = "/api/v1/currencies/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Currency id")),
    responses(
        (status = 200, description = "Currency", body = Currency),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_currency(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Currency>> {
    Ok(Json(CurrencyService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/currencies/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Currency id")),
    request_body = CurrencyChanges,
    responses(
        (status = 200, description = "Currency updated", body = Currency),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Code already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_currency(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<CurrencyChanges>,
) -> ApiResult<Json<Currency>> {
    Ok(Json(CurrencyService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/currencies/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Currency id")),
    responses(
        (status = 204, description = "Currency deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Currency still in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_currency(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    CurrencyService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PAYMENT TYPES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/payment-types",
    tag = "reference",
    params(PageRequest),
    responses((status = 200, description = "Payment types", body = PaymentTypePage))
)]
#[axum::debug_handler]
pub(crate) async fn list_payment_types(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<PaymentType>>> {
    Ok(Json(PaymentTypeService::new(state.store).list(&page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/payment-types",
    tag = "reference",
    request_body = LookupInput,
    responses(
        (status = 201, description = "Payment type created", body = PaymentType),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Name already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_payment_type(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LookupInput>,
) -> ApiResult<(StatusCode, Json<PaymentType>)> {
    let payment_type = PaymentTypeService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(payment_type)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payment-types/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment type id")),
    responses(
        (status = 200, description = "Payment type", body = PaymentType),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_payment_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<PaymentType>> {
    Ok(Json(PaymentTypeService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/payment-types/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment type id")),
    request_body = LookupChanges,
    responses(
        (status = 200, description = "Payment type updated", body = PaymentType),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Name already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_payment_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<LookupChanges>,
) -> ApiResult<Json<PaymentType>> {
    Ok(Json(PaymentTypeService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payment-types/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment type id")),
    responses(
        (status = 204, description = "Payment type deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Payment type still in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_payment_type(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    PaymentTypeService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// PAYMENT MODES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/payment-modes",
    tag = "reference",
    params(PageRequest),
    responses((status = 200, description = "Payment modes", body = PaymentModePage))
)]
#[axum::debug_handler]
pub(crate) async fn list_payment_modes(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<PaymentMode>>> {
    Ok(Json(PaymentModeService::new(state.store).list(&page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/payment-modes",
    tag = "reference",
    request_body = LookupInput,
    responses(
        (status = 201, description = "Payment mode created", body = PaymentMode),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Name already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_payment_mode(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LookupInput>,
) -> ApiResult<(StatusCode, Json<PaymentMode>)> {
    let payment_mode = PaymentModeService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(payment_mode)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payment-modes/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment mode id")),
    responses(
        (status = 200, description = "Payment mode", body = PaymentMode),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_payment_mode(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<PaymentMode>> {
    Ok(Json(PaymentModeService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/payment-modes/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment mode id")),
    request_body = LookupChanges,
    responses(
        (status = 200, description = "Payment mode updated", body = PaymentMode),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Name already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_payment_mode(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<LookupChanges>,
) -> ApiResult<Json<PaymentMode>> {
    Ok(Json(PaymentModeService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payment-modes/{id}",
    tag = "reference",
    params(("id" = RecordId, Path, description = "Payment mode id")),
    responses(
        (status = 204, description = "Payment mode deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Payment mode still in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_payment_mode(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    PaymentModeService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
