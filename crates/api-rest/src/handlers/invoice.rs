//! Invoices and the monthly rent run.

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
    GenerateInvoices, GenerationReport, Invoice, InvoiceChanges, InvoiceFilter, InvoiceInput,
};
use rentdesk_core::pagination::InvoicePage;
use rentdesk_core::services::InvoiceService;
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route(
            "/:id",
            get(get_invoice)
                .put(update_invoice)
                .patch(update_invoice)
                .delete(delete_invoice),
        )
        .route("/generate", post(generate))
        .route("/:id/cancel", post(cancel_invoice))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices",
    tag = "invoices",
    params(PageRequest, InvoiceFilter),
    responses(
        (status = 200, description = "Invoices ordered by creation", body = InvoicePage),
        (status = 400, description = "Invalid query", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn list_invoices(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<InvoiceFilter>,
) -> ApiResult<Json<Page<Invoice>>> {
    Ok(Json(InvoiceService::new(state.cfg, state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices",
    tag = "invoices",
    request_body = InvoiceInput,
    responses(
        (status = 201, description = "Invoice created", body = Invoice),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "A live rent invoice already exists for this unit and period", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_invoice(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<InvoiceInput>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    let invoice = InvoiceService::new(state.cfg, state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

#[utoipa::path(
    get,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    params(("id" = RecordId, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice", body = Invoice),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(InvoiceService::new(state.cfg, state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    params(("id" = RecordId, Path, description = "Invoice id")),
    request_body = InvoiceChanges,
    responses(
        (status = 200, description = "Invoice updated", body = Invoice),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Invoice is cancelled or already paid against", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<InvoiceChanges>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(InvoiceService::new(state.cfg, state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/invoices/{id}",
    tag = "invoices",
    params(("id" = RecordId, Path, description = "Invoice id")),
    responses(
        (status = 204, description = "Invoice deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Invoice has payments", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    InvoiceService::new(state.cfg, state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/{id}/cancel",
    tag = "invoices",
    params(("id" = RecordId, Path, description = "Invoice id")),
    responses(
        (status = 200, description = "Invoice cancelled", body = Invoice),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Invoice has payments or is already cancelled", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn cancel_invoice(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(InvoiceService::new(state.cfg, state.store).cancel(id)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/invoices/generate",
    tag = "invoices",
    request_body = GenerateInvoices,
    responses(
        (status = 200, description = "Generated invoices and skipped units", body = GenerationReport),
        (status = 400, description = "Invalid period", body = ErrorBody)
    )
)]
/// Issue rent invoices for every occupied unit for a billing period.
///
/// Running the same period again only fills gaps: units that already have a live rent
/// invoice for the period are reported as skipped.
#[axum::debug_handler]
pub(crate) async fn generate(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateInvoices>,
) -> ApiResult<Json<GenerationReport>> {
    let report = InvoiceService::new(state.cfg, state.store).generate_monthly(req.period)?;
    Ok(Json(report))
}
