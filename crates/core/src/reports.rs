//! Portfolio summary for the dashboard.

use crate::models::{Currency, InvoiceStatus, Priority, TenantStatus, UnitStatus};
use crate::store::Store;
use crate::RentalResult;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UnitCounts {
    pub total: usize,
    pub vacant: usize,
    pub occupied: usize,
    pub under_maintenance: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OpenMaintenance {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub urgent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub as_of: NaiveDate,
    pub properties: usize,
    pub units: UnitCounts,
    /// Occupied units over all units, `0` when there are none.
    pub occupancy_rate: Decimal,
    pub active_tenants: usize,
    pub open_maintenance: OpenMaintenance,
    /// Unpaid balance keyed by currency code.
    pub outstanding_by_currency: BTreeMap<String, Decimal>,
    pub overdue_invoices: usize,
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<Store>,
}

impl ReportService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn summary(&self, today: NaiveDate) -> RentalResult<Summary> {
        self.store.read(|t| {
            let mut units = UnitCounts::default();
            for unit in t.rental_units.iter() {
                units.total += 1;
                match unit.status {
                    UnitStatus::Vacant => units.vacant += 1,
                    UnitStatus::Occupied => units.occupied += 1,
                    UnitStatus::UnderMaintenance => units.under_maintenance += 1,
                }
            }
            let occupancy_rate = if units.total == 0 {
                Decimal::ZERO
            } else {
                (Decimal::from(units.occupied) / Decimal::from(units.total)).round_dp(4)
            };

            let mut open_maintenance = OpenMaintenance::default();
            for request in t.maintenance_requests.iter().filter(|m| m.status.is_open()) {
                match request.priority {
                    Priority::Low => open_maintenance.low += 1,
                    Priority::Medium => open_maintenance.medium += 1,
                    Priority::High => open_maintenance.high += 1,
                    Priority::Urgent => open_maintenance.urgent += 1,
                }
            }

            let mut outstanding_by_currency: BTreeMap<String, Decimal> = BTreeMap::new();
            let mut overdue_invoices = 0;
            for invoice in t.invoices.iter() {
                if invoice.status == InvoiceStatus::Cancelled {
                    continue;
                }
                let outstanding = invoice.outstanding();
                if !outstanding.is_zero() {
                    let code = t
                        .get::<Currency>(&invoice.currency_id)
                        .map(|c| c.code.to_string())
                        .unwrap_or_else(|| invoice.currency_id.to_string());
                    *outstanding_by_currency.entry(code).or_default() += outstanding;
                }
                if invoice.is_overdue(today) {
                    overdue_invoices += 1;
                }
            }

            Ok(Summary {
                as_of: today,
                properties: t.properties.len(),
                units,
                occupancy_rate,
                active_tenants: t
                    .tenants
                    .iter()
                    .filter(|tenant| tenant.status == TenantStatus::Active)
                    .count(),
                open_maintenance,
                outstanding_by_currency,
                overdue_invoices,
            })
        })
    }
}
