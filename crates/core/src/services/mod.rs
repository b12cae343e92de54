//! One service per resource.
//!
//! Services are cheap handles over a shared [`Store`](crate::store::Store). Each offers the
//! usual index / show / store / update / destroy operations plus whatever workflow the
//! resource needs. Cross-record rules are checked and applied inside a single store write.

pub mod access;
pub mod asset;
pub mod invoice;
pub mod maintenance;
pub mod payment;
pub mod property;
pub mod reference;
pub mod tenant;
pub mod unit;

pub use access::{RoleService, UserService};
pub use asset::AssetService;
pub use invoice::InvoiceService;
pub use maintenance::MaintenanceService;
pub use payment::PaymentService;
pub use property::PropertyService;
pub use reference::{CurrencyService, PaymentModeService, PaymentTypeService};
pub use tenant::TenantService;
pub use unit::RentalUnitService;

use crate::store::{Record, Tables};
use crate::validation::ValidationErrors;
use chrono::{NaiveDate, Utc};
use rentdesk_uuid::RecordId;

/// Current calendar date (UTC).
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Records "The selected {field} is invalid." when `id` does not name a stored `T`.
pub(crate) fn check_reference<T: Record>(
    tables: &Tables,
    errors: &mut ValidationErrors,
    field: &str,
    id: RecordId,
) -> Option<T> {
    match tables.get::<T>(&id) {
        Some(record) => Some(record.clone()),
        None => {
            errors.add(field, format!("The selected {field} is invalid."));
            None
        }
    }
}

/// Merge an optional change into the current value of an optional text field.
///
/// `None` keeps the current value; an explicit (possibly blank) string replaces it.
pub(crate) fn merge_text(change: Option<String>, current: &Option<String>) -> Option<String> {
    change.or_else(|| current.clone())
}
