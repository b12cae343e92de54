//! Default reference data for a fresh installation.
//!
//! Seeding is idempotent: records that already exist (matched by currency code or by name)
//! are left untouched.

use crate::models::{CurrencyInput, LookupInput, RoleInput};
use crate::services::{CurrencyService, PaymentModeService, PaymentTypeService, RoleService};
use crate::store::Store;
use crate::RentalResult;
use rentdesk_types::CurrencyCode;
use serde::Serialize;
use std::sync::Arc;

const CURRENCIES: &[(&str, &str, &str)] = &[
    ("KES", "Kenyan Shilling", "KSh"),
    ("USD", "US Dollar", "$"),
    ("EUR", "Euro", "€"),
    ("GBP", "Pound Sterling", "£"),
];

const PAYMENT_TYPES: &[(&str, &str)] = &[
    ("Rent", "Monthly rent"),
    ("Deposit", "Security deposit"),
    ("Utilities", "Water, electricity and service charges"),
    ("Penalty", "Late payment penalty"),
];

const PAYMENT_MODES: &[(&str, &str)] = &[
    ("Cash", "Paid in cash at the office"),
    ("Bank transfer", "Direct bank transfer"),
    ("Mobile money", "M-Pesa or similar"),
    ("Cheque", "Bank cheque"),
];

const ROLES: &[(&str, &[&str])] = &[
    ("Administrator", &["*"]),
    (
        "Property manager",
        &[
            "properties.*",
            "rental_units.*",
            "tenants.*",
            "assets.*",
            "maintenance_requests.*",
            "invoices.*",
            "payments.*",
        ],
    ),
    (
        "Accountant",
        &["invoices.*", "payments.*", "tenants.view", "reports.view"],
    ),
];

/// How many records of each kind a seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub currencies: usize,
    pub payment_types: usize,
    pub payment_modes: usize,
    pub roles: usize,
}

/// Create any missing default currencies, payment types, payment modes and roles.
pub fn seed_reference_data(store: &Arc<Store>) -> RentalResult<SeedReport> {
    let mut report = SeedReport::default();

    let currencies = CurrencyService::new(store.clone());
    for (code, name, symbol) in CURRENCIES {
        if currencies.find_by_code(&CurrencyCode::parse(code)?)?.is_none() {
            currencies.create(CurrencyInput {
                code: (*code).to_owned(),
                name: (*name).to_owned(),
                symbol: Some((*symbol).to_owned()),
            })?;
            report.currencies += 1;
        }
    }

    let payment_types = PaymentTypeService::new(store.clone());
    for (name, description) in PAYMENT_TYPES {
        if payment_types.find_by_name(name)?.is_none() {
            payment_types.create(lookup(name, description))?;
            report.payment_types += 1;
        }
    }

    let payment_modes = PaymentModeService::new(store.clone());
    for (name, description) in PAYMENT_MODES {
        if payment_modes.find_by_name(name)?.is_none() {
            payment_modes.create(lookup(name, description))?;
            report.payment_modes += 1;
        }
    }

    let roles = RoleService::new(store.clone());
    for (name, permissions) in ROLES {
        if roles.find_by_name(name)?.is_none() {
            roles.create(RoleInput {
                name: (*name).to_owned(),
                permissions: permissions.iter().map(|p| (*p).to_owned()).collect(),
            })?;
            report.roles += 1;
        }
    }

    tracing::info!(
        currencies = report.currencies,
        payment_types = report.payment_types,
        payment_modes = report.payment_modes,
        roles = report.roles,
        "reference data seeded"
    );
    Ok(report)
}

fn lookup(name: &str, description: &str) -> LookupInput {
    LookupInput {
        name: name.to_owned(),
        description: Some(description.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn seeding_twice_creates_nothing_new() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(Store::open(dir.path()).unwrap());

        let first = seed_reference_data(&store).unwrap();
        assert_eq!(first.currencies, CURRENCIES.len());
        assert_eq!(first.roles, ROLES.len());

        let second = seed_reference_data(&store).unwrap();
        assert_eq!(second, SeedReport::default());
    }
}
