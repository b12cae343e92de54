//! # API REST
//!
//! REST API implementation for Rentdesk.
//!
//! Handles:
//! - HTTP endpoints with axum, one nested router per resource under `/api/v1`
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON error bodies, bearer-token middleware, CORS, request tracing)
//!
//! Uses `api-shared` for common types and utilities and `rentdesk-core` for all business rules.

#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
mod extract;
mod handlers;
mod middleware;

use api_shared::ApiTokens;
use axum::{middleware::from_fn_with_state, routing::get, Router};
use rentdesk_core::{CoreConfig, Store};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::RestConfig;
pub use error::{ApiError, ApiResult};

/// Application state for the REST API server
///
/// Shared by every handler. Services are cheap to build, so handlers construct the one they
/// need per request from `cfg` and `store`.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Arc<Store>,
    pub tokens: Arc<ApiTokens>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<Store>, tokens: ApiTokens) -> Self {
        Self {
            cfg,
            store,
            tokens: Arc::new(tokens),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Rentdesk API", description = "Property-rental back office"),
    paths(
        handlers::health,
        handlers::reference::list_currencies,
        handlers::reference::create_currency,
        handlers::reference::get_currency,
        handlers::reference::update_currency,
        handlers::reference::delete_currency,
        handlers::reference::list_payment_types,
        handlers::reference::create_payment_type,
        handlers::reference::get_payment_type,
        handlers::reference::update_payment_type,
        handlers::reference::delete_payment_type,
        handlers::reference::list_payment_modes,
        handlers::reference::create_payment_mode,
        handlers::reference::get_payment_mode,
        handlers::reference::update_payment_mode,
        handlers::reference::delete_payment_mode,
        handlers::access::list_roles,
        handlers::access::create_role,
        handlers::access::get_role,
        handlers::access::update_role,
        handlers::access::delete_role,
        handlers::access::list_users,
        handlers::access::create_user,
        handlers::access::get_user,
        handlers::access::update_user,
        handlers::access::change_password,
        handlers::access::delete_user,
        handlers::property::list_properties,
        handlers::property::create_property,
        handlers::property::get_property,
        handlers::property::update_property,
        handlers::property::delete_property,
        handlers::unit::list_units,
        handlers::unit::create_unit,
        handlers::unit::get_unit,
        handlers::unit::update_unit,
        handlers::unit::delete_unit,
        handlers::unit::assign_tenant,
        handlers::unit::vacate,
        handlers::tenant::list_tenants,
        handlers::tenant::create_tenant,
        handlers::tenant::get_tenant,
        handlers::tenant::update_tenant,
        handlers::tenant::delete_tenant,
        handlers::asset::list_assets,
        handlers::asset::create_asset,
        handlers::asset::get_asset,
        handlers::asset::update_asset,
        handlers::asset::delete_asset,
        handlers::maintenance::list_requests,
        handlers::maintenance::create_request,
        handlers::maintenance::get_request,
        handlers::maintenance::update_request,
        handlers::maintenance::delete_request,
        handlers::maintenance::change_status,
        handlers::invoice::list_invoices,
        handlers::invoice::create_invoice,
        handlers::invoice::get_invoice,
        handlers::invoice::update_invoice,
        handlers::invoice::delete_invoice,
        handlers::invoice::cancel_invoice,
        handlers::invoice::generate,
        handlers::payment::list_payments,
        handlers::payment::create_payment,
        handlers::payment::get_payment,
        handlers::payment::update_payment,
        handlers::payment::delete_payment,
        handlers::report::summary,
    ),
    components(schemas(
        api_shared::HealthRes,
        api_shared::ErrorBody,
        rentdesk_core::RecordId,
        rentdesk_core::NonEmptyText,
        rentdesk_core::EmailAddress,
        rentdesk_core::CurrencyCode,
        rentdesk_core::BillingPeriod,
        rentdesk_core::PageMeta,
        rentdesk_core::pagination::CurrencyPage,
        rentdesk_core::pagination::PaymentTypePage,
        rentdesk_core::pagination::PaymentModePage,
        rentdesk_core::pagination::RolePage,
        rentdesk_core::pagination::UserPage,
        rentdesk_core::pagination::PropertyPage,
        rentdesk_core::pagination::RentalUnitPage,
        rentdesk_core::pagination::TenantPage,
        rentdesk_core::pagination::AssetPage,
        rentdesk_core::pagination::MaintenanceRequestPage,
        rentdesk_core::pagination::InvoicePage,
        rentdesk_core::pagination::PaymentPage,
        rentdesk_core::models::Currency,
        rentdesk_core::models::CurrencyInput,
        rentdesk_core::models::CurrencyChanges,
        rentdesk_core::models::PaymentType,
        rentdesk_core::models::PaymentMode,
        rentdesk_core::models::LookupInput,
        rentdesk_core::models::LookupChanges,
        rentdesk_core::models::Role,
        rentdesk_core::models::RoleInput,
        rentdesk_core::models::RoleChanges,
        rentdesk_core::models::UserView,
        rentdesk_core::models::UserInput,
        rentdesk_core::models::UserChanges,
        rentdesk_core::models::PasswordChange,
        rentdesk_core::models::Property,
        rentdesk_core::models::PropertyType,
        rentdesk_core::models::PropertyInput,
        rentdesk_core::models::PropertyChanges,
        rentdesk_core::models::RentalUnit,
        rentdesk_core::models::UnitStatus,
        rentdesk_core::models::RentalUnitInput,
        rentdesk_core::models::RentalUnitChanges,
        rentdesk_core::models::AssignTenant,
        rentdesk_core::models::Tenant,
        rentdesk_core::models::TenantStatus,
        rentdesk_core::models::TenantInput,
        rentdesk_core::models::TenantChanges,
        rentdesk_core::models::Asset,
        rentdesk_core::models::AssetCondition,
        rentdesk_core::models::AssetInput,
        rentdesk_core::models::AssetChanges,
        rentdesk_core::models::MaintenanceRequest,
        rentdesk_core::models::MaintenanceStatus,
        rentdesk_core::models::Priority,
        rentdesk_core::models::MaintenanceInput,
        rentdesk_core::models::MaintenanceChanges,
        rentdesk_core::models::StatusChange,
        rentdesk_core::models::Invoice,
        rentdesk_core::models::InvoiceKind,
        rentdesk_core::models::InvoiceStatus,
        rentdesk_core::models::InvoiceInput,
        rentdesk_core::models::InvoiceChanges,
        rentdesk_core::models::GenerateInvoices,
        rentdesk_core::models::GenerationReport,
        rentdesk_core::models::SkipReason,
        rentdesk_core::models::SkippedUnit,
        rentdesk_core::models::Payment,
        rentdesk_core::models::PaymentInput,
        rentdesk_core::models::PaymentChanges,
        rentdesk_core::reports::Summary,
        rentdesk_core::reports::UnitCounts,
        rentdesk_core::reports::OpenMaintenance,
    ))
)]
pub struct ApiDoc;

/// Build the full application router.
///
/// `/health` and the documentation routes are always open; everything under `/api/v1` passes
/// through the bearer-token check.
pub fn router(state: AppState) -> Router {
    if !state.tokens.is_enabled() {
        tracing::warn!("RENTDESK_API_TOKENS is empty; /api/v1 is served without authentication");
    }

    let api = Router::new()
        .nest("/currencies", handlers::reference::currencies())
        .nest("/payment-types", handlers::reference::payment_types())
        .nest("/payment-modes", handlers::reference::payment_modes())
        .nest("/roles", handlers::access::roles())
        .nest("/users", handlers::access::users())
        .nest("/properties", handlers::property::router())
        .nest("/rental-units", handlers::unit::router())
        .nest("/tenants", handlers::tenant::router())
        .nest("/assets", handlers::asset::router())
        .nest("/maintenance-requests", handlers::maintenance::router())
        .nest("/invoices", handlers::invoice::router())
        .nest("/payments", handlers::payment::router())
        .route("/reports/summary", get(handlers::report::summary))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::require_bearer,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
