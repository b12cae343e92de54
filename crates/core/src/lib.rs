//! # Rentdesk Core
//!
//! Core business logic for the Rentdesk property-rental back office.
//!
//! This crate contains pure data operations:
//! - Records for properties, units, tenants, assets, maintenance, invoices and payments
//! - A write-through record store using sharded JSON files under `RENTDESK_DATA_DIR`
//! - One service per resource, including the occupancy rules that tie units, tenants,
//!   assets and maintenance requests together
//! - The monthly rent-invoice run and the portfolio summary
//!
//! **No API concerns**: Authentication, HTTP servers, or request parsing belong in `api-rest`
//! or `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod pagination;
pub mod password;
pub mod reports;
pub mod seed;
pub mod services;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use error::{RentalError, RentalResult};
pub use pagination::{Page, PageMeta, PageRequest};
pub use reports::{ReportService, Summary};
pub use store::Store;
pub use validation::ValidationErrors;

pub use rentdesk_types::{BillingPeriod, CurrencyCode, EmailAddress, NonEmptyText, TextError};
pub use rentdesk_uuid::RecordId;
