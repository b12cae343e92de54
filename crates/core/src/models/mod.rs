//! Persisted records and the payloads that create or change them.
//!
//! Each resource has up to four shapes:
//! - the record itself, as stored and returned by the API,
//! - an `*Input` used to create it,
//! - a `*Changes` used to update it (every field optional, blank text clears optional fields,
//!   explicit `null` clears optional dates, amounts and references),
//! - a `*Filter` accepted by the index operation.

pub mod access;
pub mod asset;
pub mod invoice;
pub mod maintenance;
pub mod payment;
pub mod property;
pub mod reference;
pub mod tenant;
pub mod unit;

pub use access::{PasswordChange, Role, RoleChanges, RoleInput, User, UserChanges, UserFilter, UserInput, UserView};
pub use asset::{Asset, AssetChanges, AssetCondition, AssetFilter, AssetInput};
pub use invoice::{
    GenerateInvoices, GenerationReport, Invoice, InvoiceChanges, InvoiceFilter, InvoiceInput,
    InvoiceKind, InvoiceStatus, SkipReason, SkippedUnit,
};
pub use maintenance::{
    MaintenanceChanges, MaintenanceFilter, MaintenanceInput, MaintenanceRequest,
    MaintenanceStatus, Priority, StatusChange,
};
pub use payment::{Payment, PaymentChanges, PaymentFilter, PaymentInput};
pub use property::{Property, PropertyChanges, PropertyFilter, PropertyInput, PropertyType};
pub use reference::{
    Currency, CurrencyChanges, CurrencyInput, LookupChanges, LookupInput, PaymentMode,
    PaymentType,
};
pub use tenant::{Tenant, TenantChanges, TenantFilter, TenantInput, TenantStatus};
pub use unit::{AssignTenant, RentalUnit, RentalUnitChanges, RentalUnitFilter, RentalUnitInput, UnitStatus};

/// Deserializes a field that tells "absent" apart from `null`.
///
/// Used with `#[serde(default, deserialize_with = "nullable")]`: a missing field stays
/// `None` (keep the current value), `null` becomes `Some(None)` (clear it).
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    <Option<T> as serde::Deserialize>::deserialize(deserializer).map(Some)
}

/// Case-insensitive substring match used by `q` filters.
pub(crate) fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}
