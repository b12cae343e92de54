//! Payments received from tenants.

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
use rentdesk_core::models::{Payment, PaymentChanges, PaymentFilter, PaymentInput};
use rentdesk_core::pagination::PaymentPage;
use rentdesk_core::services::PaymentService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route(
            "/:id",
            get(get_payment)
                .put(update_payment)
                .patch(update_payment)
                .delete(delete_payment),
        )
}

#[utoipa::path(
    get,
    path = "/api/v1/payments",
    tag = "payments",
    params(PageRequest, PaymentFilter),
    responses(
        (status = 200, description = "Payments ordered by creation", body = PaymentPage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_payments(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<PaymentFilter>,
) -> ApiResult<Json<Page<Payment>>> {
    Ok(Json(PaymentService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = PaymentInput,
    responses(
        (status = 201, description = "Payment created", body = Payment),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Invoice cannot take this payment", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_payment(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PaymentInput>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let payment = PaymentService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    params(("id" = RecordId, Path, description = "Payment id")),
    responses(
        (status = 200, description = "Payment", body = Payment),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(PaymentService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    params(("id" = RecordId, Path, description = "Payment id")),
    request_body = PaymentChanges,
    responses(
        (status = 200, description = "Payment updated", body = Payment),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Conflicting payment", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<PaymentChanges>,
) -> ApiResult<Json<Payment>> {
    Ok(Json(PaymentService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/payments/{id}",
    tag = "payments",
    params(("id" = RecordId, Path, description = "Payment id")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Conflicting payment", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_payment(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    PaymentService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
