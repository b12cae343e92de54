//! Invoices and the monthly rent run.
//!
//! Invoice numbers have the form `{prefix}-{YYYYMM}-{seq:04}`, where the sequence restarts
//! each month. Rent invoices are keyed by `(rental unit, billing period)`: a unit has at most
//! one live rent invoice per period, and [`InvoiceService::generate_monthly`] skips units that
//! already have one. The whole run executes inside a single store write, so overlapping runs
//! cannot invoice the same unit twice.
//!
//! An explicit run reissues rent whose invoice was cancelled. The scheduled run
//! ([`InvoiceService::generate_scheduled`]) leaves such units alone, so waived rent stays waived.

use crate::config::CoreConfig;
use crate::models::{
    Currency, GenerationReport, Invoice, InvoiceChanges, InvoiceFilter, InvoiceInput,
    InvoiceKind, InvoiceStatus, Property, RentalUnit, SkipReason, SkippedUnit, Tenant,
};
use crate::pagination::{Page, PageRequest};
use crate::services::{check_reference, merge_text, today};
use crate::store::{Store, Tables, Transaction};
use crate::validation::{ValidationErrors, MAX_LONG_TEXT};
use crate::{RentalError, RentalResult};
use chrono::{NaiveDate, Utc};
use rentdesk_types::BillingPeriod;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct InvoiceService {
    cfg: Arc<CoreConfig>,
    store: Arc<Store>,
}

/// Next free number for invoices numbered under `period`.
fn next_invoice_number(tables: &Tables, prefix: &str, period: BillingPeriod) -> String {
    let stem = format!("{prefix}-{}-", period.compact());
    let last = tables
        .invoices
        .iter()
        .filter_map(|i| i.invoice_number.strip_prefix(&stem))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("{stem}{:04}", last + 1)
}

/// The live (not cancelled) rent invoice for `unit_id` in `period`, if any.
fn live_rent_invoice(tables: &Tables, unit_id: RecordId, period: BillingPeriod) -> Option<&Invoice> {
    tables.invoices.iter().find(|i| {
        i.kind == InvoiceKind::Rent
            && i.rental_unit_id == unit_id
            && i.period == Some(period)
            && i.status != InvoiceStatus::Cancelled
    })
}

/// Whether `unit_id` has a cancelled rent invoice for `period`.
fn cancelled_rent_invoice(tables: &Tables, unit_id: RecordId, period: BillingPeriod) -> bool {
    tables.invoices.iter().any(|i| {
        i.kind == InvoiceKind::Rent
            && i.rental_unit_id == unit_id
            && i.period == Some(period)
            && i.status == InvoiceStatus::Cancelled
    })
}

/// Which runs may reissue a cancelled rent invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Explicit,
    Scheduled,
}

/// Issue date for a rent invoice: today when the period is current, otherwise the first of
/// the period.
fn rent_issue_date(period: BillingPeriod, today: NaiveDate) -> NaiveDate {
    if period.contains(today) {
        today
    } else {
        period.first_day()
    }
}

fn ensure_mutable(invoice: &Invoice) -> RentalResult<()> {
    let state = match invoice.status {
        InvoiceStatus::Paid => "paid",
        InvoiceStatus::Cancelled => "cancelled",
        InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid => return Ok(()),
    };
    Err(RentalError::conflict(format!(
        "invoice {} is {state} and can no longer be changed",
        invoice.invoice_number
    )))
}

fn has_payments(tables: &Tables, invoice_id: RecordId) -> bool {
    tables
        .payments
        .iter()
        .any(|p| p.invoice_id == Some(invoice_id))
}

impl InvoiceService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<Store>) -> Self {
        Self { cfg, store }
    }

    pub fn list(&self, filter: &InvoiceFilter, page: &PageRequest) -> RentalResult<Page<Invoice>> {
        let today = today();
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.invoices.ordered_where(|i| filter.matches(i, today)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Invoice> {
        self.store.read(|t| t.require::<Invoice>(&id).cloned())
    }

    /// Raise an invoice by hand. `kind` defaults to `other`; rent invoices need a period.
    pub fn create(&self, input: InvoiceInput) -> RentalResult<Invoice> {
        let issued_on = input.issued_on.unwrap_or_else(today);
        let kind = input.kind.unwrap_or(InvoiceKind::Other);

        let invoice = self.store.write(|tx| {
            let t = tx.tables();
            let mut errors = ValidationErrors::new();
            check_reference::<Tenant>(t, &mut errors, "tenant_id", input.tenant_id);
            check_reference::<RentalUnit>(t, &mut errors, "rental_unit_id", input.rental_unit_id);
            check_reference::<Currency>(t, &mut errors, "currency_id", input.currency_id);
            let amount = errors.positive_amount("amount", input.amount);
            let description =
                errors.optional_text("description", input.description.as_deref(), MAX_LONG_TEXT);
            errors.date_order("issued_on", Some(issued_on), "due_on", Some(input.due_on));
            errors.check(
                kind != InvoiceKind::Rent || input.period.is_some(),
                "period",
                "The period field is required for rent invoices.",
            );
            let amount = match amount {
                Some(amount) if errors.is_empty() => amount,
                _ => return Err(RentalError::Validation(errors)),
            };

            if let (InvoiceKind::Rent, Some(period)) = (kind, input.period) {
                if let Some(existing) = live_rent_invoice(t, input.rental_unit_id, period) {
                    return Err(RentalError::conflict(format!(
                        "rent for {period} is already invoiced as {}",
                        existing.invoice_number
                    )));
                }
            }

            let numbering_period = input
                .period
                .unwrap_or_else(|| BillingPeriod::containing(issued_on));
            let now = Utc::now();
            let invoice = Invoice {
                id: RecordId::new(),
                invoice_number: next_invoice_number(t, self.cfg.invoice_prefix(), numbering_period),
                kind,
                tenant_id: input.tenant_id,
                rental_unit_id: input.rental_unit_id,
                period: input.period,
                description,
                amount,
                amount_paid: Decimal::ZERO,
                currency_id: input.currency_id,
                issued_on,
                due_on: input.due_on,
                status: InvoiceStatus::Unpaid,
                created_at: now,
                updated_at: now,
            };
            tx.put(invoice.clone())?;
            Ok(invoice)
        })?;
        tracing::info!(invoice = %invoice.invoice_number, amount = %invoice.amount, "invoice created");
        Ok(invoice)
    }

    /// Change the description, due date or amount of an unsettled invoice.
    pub fn update(&self, id: RecordId, changes: InvoiceChanges) -> RentalResult<Invoice> {
        self.store.write(|tx| {
            let current = tx.require::<Invoice>(&id)?.clone();
            ensure_mutable(&current)?;

            let mut errors = ValidationErrors::new();
            let description = errors.optional_text(
                "description",
                merge_text(changes.description, &current.description).as_deref(),
                MAX_LONG_TEXT,
            );
            let due_on = changes.due_on.unwrap_or(current.due_on);
            errors.date_order("issued_on", Some(current.issued_on), "due_on", Some(due_on));
            let amount = changes.amount.unwrap_or(current.amount);
            if errors.positive_amount("amount", amount).is_some() {
                errors.check(
                    amount >= current.amount_paid,
                    "amount",
                    format!(
                        "The amount may not be less than the {} already paid.",
                        current.amount_paid
                    ),
                );
            }
            errors.finish()?;

            let mut updated = Invoice {
                description,
                due_on,
                amount,
                updated_at: Utc::now(),
                ..current
            };
            updated.refresh_status();
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Cancel an invoice that has no payments against it.
    pub fn cancel(&self, id: RecordId) -> RentalResult<Invoice> {
        let invoice = self.store.write(|tx| {
            let current = tx.require::<Invoice>(&id)?.clone();
            if current.status == InvoiceStatus::Cancelled {
                return Err(RentalError::conflict(format!(
                    "invoice {} is already cancelled",
                    current.invoice_number
                )));
            }
            if !current.amount_paid.is_zero() || has_payments(tx.tables(), id) {
                return Err(RentalError::conflict(format!(
                    "invoice {} has payments recorded against it",
                    current.invoice_number
                )));
            }
            let cancelled = Invoice {
                status: InvoiceStatus::Cancelled,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(cancelled.clone())?;
            Ok(cancelled)
        })?;
        tracing::info!(invoice = %invoice.invoice_number, "invoice cancelled");
        Ok(invoice)
    }

    /// Only cancelled invoices, or unpaid ones with no payments, can be deleted.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let invoice = tx.require::<Invoice>(&id)?;
            let deletable = match invoice.status {
                InvoiceStatus::Cancelled => true,
                InvoiceStatus::Unpaid => !has_payments(tx.tables(), id),
                InvoiceStatus::PartiallyPaid | InvoiceStatus::Paid => false,
            };
            if !deletable {
                return Err(RentalError::conflict(format!(
                    "invoice {} has payments recorded against it and cannot be deleted",
                    invoice.invoice_number
                )));
            }
            tx.delete::<Invoice>(&id)?;
            Ok(())
        })
    }

    /// Raise rent invoices for every occupied unit in `period`.
    pub fn generate_monthly(&self, period: BillingPeriod) -> RentalResult<GenerationReport> {
        self.generate_monthly_on(period, today())
    }

    /// [`Self::generate_monthly`] with an explicit "today".
    pub fn generate_monthly_on(
        &self,
        period: BillingPeriod,
        today: NaiveDate,
    ) -> RentalResult<GenerationReport> {
        self.run(period, today, RunKind::Explicit)
    }

    /// The background run: like [`Self::generate_monthly`], but units whose rent invoice for
    /// `period` was cancelled are skipped rather than invoiced again.
    pub fn generate_scheduled(&self, period: BillingPeriod) -> RentalResult<GenerationReport> {
        self.generate_scheduled_on(period, today())
    }

    pub fn generate_scheduled_on(
        &self,
        period: BillingPeriod,
        today: NaiveDate,
    ) -> RentalResult<GenerationReport> {
        self.run(period, today, RunKind::Scheduled)
    }

    fn run(
        &self,
        period: BillingPeriod,
        today: NaiveDate,
        kind: RunKind,
    ) -> RentalResult<GenerationReport> {
        let report = self
            .store
            .write(|tx| generate_in_tx(tx, &self.cfg, period, today, kind))?;
        tracing::info!(
            %period,
            scheduled = kind == RunKind::Scheduled,
            generated = report.generated.len(),
            skipped = report.skipped.len(),
            "monthly rent invoices generated"
        );
        Ok(report)
    }
}

fn generate_in_tx(
    tx: &mut Transaction<'_>,
    cfg: &CoreConfig,
    period: BillingPeriod,
    today: NaiveDate,
    kind: RunKind,
) -> RentalResult<GenerationReport> {
    let mut units: Vec<RentalUnit> = tx.tables().rental_units.iter().cloned().collect();
    {
        let t = tx.tables();
        let property_name = |unit: &RentalUnit| {
            t.get::<Property>(&unit.property_id)
                .map(|p| p.name.as_str().to_lowercase())
                .unwrap_or_default()
        };
        units.sort_by_cached_key(|u| {
            (
                property_name(u),
                u.property_id,
                u.unit_number.as_str().to_lowercase(),
                u.id,
            )
        });
    }

    let issued_on = rent_issue_date(period, today);
    let due_on = period.date_in_period(cfg.invoice_due_day()).max(issued_on);

    let mut generated = Vec::new();
    let mut skipped = Vec::new();
    for unit in units {
        let Some(tenant_id) = unit.tenant_id else {
            skipped.push(SkippedUnit {
                rental_unit_id: unit.id,
                reason: SkipReason::NotOccupied,
            });
            continue;
        };
        if live_rent_invoice(tx.tables(), unit.id, period).is_some() {
            skipped.push(SkippedUnit {
                rental_unit_id: unit.id,
                reason: SkipReason::AlreadyInvoiced,
            });
            continue;
        }
        if kind == RunKind::Scheduled && cancelled_rent_invoice(tx.tables(), unit.id, period) {
            skipped.push(SkippedUnit {
                rental_unit_id: unit.id,
                reason: SkipReason::Cancelled,
            });
            continue;
        }

        let now = Utc::now();
        let invoice = Invoice {
            id: RecordId::new(),
            invoice_number: next_invoice_number(tx.tables(), cfg.invoice_prefix(), period),
            kind: InvoiceKind::Rent,
            tenant_id,
            rental_unit_id: unit.id,
            period: Some(period),
            description: Some(format!("Rent for {period}, unit {}", unit.unit_number)),
            amount: unit.rent_amount,
            amount_paid: Decimal::ZERO,
            currency_id: unit.currency_id,
            issued_on,
            due_on,
            status: InvoiceStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };
        tx.put(invoice.clone())?;
        tracing::debug!(invoice = %invoice.invoice_number, rental_unit_id = %unit.id, "rent invoice raised");
        generated.push(invoice);
    }

    Ok(GenerationReport {
        period,
        generated,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::unit::tests::Fixture;
    use crate::services::RentalUnitService;
    use rust_decimal_macros::dec;

    fn service(fx: &Fixture) -> InvoiceService {
        let cfg = CoreConfig::new(fx.store.data_dir().to_path_buf(), 5, 1, "INV").unwrap();
        InvoiceService::new(Arc::new(cfg), fx.store.clone())
    }

    fn period(s: &str) -> BillingPeriod {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn generation_skips_vacant_units_and_is_idempotent() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        let a2 = fx.unit("A2");
        let tenant = fx.tenant("wanjiru@example.com", Some(a1.id));
        let invoices = service(&fx);

        let report = invoices
            .generate_monthly_on(period("2025-03"), date(2025, 3, 1))
            .unwrap();
        assert_eq!(report.generated.len(), 1);
        let invoice = &report.generated[0];
        assert_eq!(invoice.invoice_number, "INV-202503-0001");
        assert_eq!(invoice.tenant_id, tenant.id);
        assert_eq!(invoice.amount, dec!(25000));
        assert_eq!(invoice.issued_on, date(2025, 3, 1));
        assert_eq!(invoice.due_on, date(2025, 3, 5));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
        assert_eq!(
            report.skipped,
            vec![SkippedUnit {
                rental_unit_id: a2.id,
                reason: SkipReason::NotOccupied
            }]
        );

        let again = invoices
            .generate_monthly_on(period("2025-03"), date(2025, 3, 2))
            .unwrap();
        assert!(again.generated.is_empty());
        assert!(again.skipped.contains(&SkippedUnit {
            rental_unit_id: a1.id,
            reason: SkipReason::AlreadyInvoiced
        }));
    }

    #[test]
    fn cancelled_rent_invoice_can_be_regenerated() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        fx.tenant("wanjiru@example.com", Some(a1.id));
        let invoices = service(&fx);

        let first = invoices
            .generate_monthly_on(period("2025-04"), date(2025, 4, 1))
            .unwrap();
        invoices.cancel(first.generated[0].id).unwrap();

        let second = invoices
            .generate_monthly_on(period("2025-04"), date(2025, 4, 1))
            .unwrap();
        assert_eq!(second.generated.len(), 1);
        assert_eq!(second.generated[0].invoice_number, "INV-202504-0002");
    }

    #[test]
    fn scheduled_run_leaves_cancelled_rent_alone() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        let a2 = fx.unit("A2");
        fx.tenant("wanjiru@example.com", Some(a1.id));
        fx.tenant("otieno@example.com", Some(a2.id));
        let invoices = service(&fx);

        let first = invoices
            .generate_scheduled_on(period("2025-03"), date(2025, 3, 1))
            .unwrap();
        assert_eq!(first.generated.len(), 2);
        let waived = first
            .generated
            .iter()
            .find(|i| i.rental_unit_id == a1.id)
            .unwrap();
        invoices.cancel(waived.id).unwrap();

        let next = invoices
            .generate_scheduled_on(period("2025-03"), date(2025, 3, 1))
            .unwrap();
        assert!(next.generated.is_empty());
        assert!(next.skipped.contains(&SkippedUnit {
            rental_unit_id: a1.id,
            reason: SkipReason::Cancelled
        }));
        assert!(next.skipped.contains(&SkippedUnit {
            rental_unit_id: a2.id,
            reason: SkipReason::AlreadyInvoiced
        }));

        let explicit = invoices
            .generate_monthly_on(period("2025-03"), date(2025, 3, 1))
            .unwrap();
        assert_eq!(explicit.generated.len(), 1);
        assert_eq!(explicit.generated[0].rental_unit_id, a1.id);
    }

    #[test]
    fn late_run_issues_today_and_never_falls_due_before_issue() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        fx.tenant("wanjiru@example.com", Some(a1.id));
        let invoices = service(&fx);

        let report = invoices
            .generate_monthly_on(period("2025-05"), date(2025, 5, 20))
            .unwrap();
        let invoice = &report.generated[0];
        assert_eq!(invoice.issued_on, date(2025, 5, 20));
        assert_eq!(invoice.due_on, date(2025, 5, 20));
    }

    #[test]
    fn units_are_processed_in_unit_number_order() {
        let fx = Fixture::new();
        let b = fx.unit("B1");
        let a = fx.unit("A1");
        fx.tenant("one@example.com", Some(b.id));
        fx.tenant("two@example.com", Some(a.id));

        let report = service(&fx)
            .generate_monthly_on(period("2025-06"), date(2025, 6, 1))
            .unwrap();
        let order: Vec<_> = report.generated.iter().map(|i| i.rental_unit_id).collect();
        assert_eq!(order, vec![a.id, b.id]);
        assert_eq!(report.generated[1].invoice_number, "INV-202506-0002");
    }

    #[test]
    fn manual_invoice_validation_and_duplicate_rent() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", Some(a1.id));
        let invoices = service(&fx);

        let base = InvoiceInput {
            tenant_id: tenant.id,
            rental_unit_id: a1.id,
            amount: dec!(1500),
            currency_id: fx.currency_id,
            kind: None,
            period: None,
            description: Some("Broken window".into()),
            issued_on: Some(date(2025, 7, 10)),
            due_on: date(2025, 7, 9),
        };
        match invoices.create(base.clone()).unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("due_on")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let ok = invoices
            .create(InvoiceInput {
                due_on: date(2025, 7, 20),
                ..base.clone()
            })
            .unwrap();
        assert_eq!(ok.kind, InvoiceKind::Other);
        assert_eq!(ok.invoice_number, "INV-202507-0001");

        invoices
            .generate_monthly_on(period("2025-07"), date(2025, 7, 1))
            .unwrap();
        let duplicate_rent = invoices.create(InvoiceInput {
            kind: Some(InvoiceKind::Rent),
            period: Some(period("2025-07")),
            due_on: date(2025, 7, 20),
            ..base
        });
        assert!(matches!(duplicate_rent, Err(RentalError::Conflict(_))));
    }

    #[test]
    fn update_cannot_drop_amount_below_paid_and_settled_invoices_are_frozen() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        fx.tenant("wanjiru@example.com", Some(a1.id));
        let invoices = service(&fx);
        let report = invoices
            .generate_monthly_on(period("2025-08"), date(2025, 8, 1))
            .unwrap();
        let id = report.generated[0].id;

        fx.store
            .write(|tx| {
                let mut invoice = tx.require::<Invoice>(&id)?.clone();
                invoice.amount_paid = dec!(10000);
                invoice.refresh_status();
                tx.put(invoice)
            })
            .unwrap();

        let err = invoices
            .update(
                id,
                InvoiceChanges {
                    amount: Some(dec!(5000)),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));

        let settled = invoices
            .update(
                id,
                InvoiceChanges {
                    amount: Some(dec!(10000)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(settled.status, InvoiceStatus::Paid);
        assert!(matches!(
            invoices.update(id, InvoiceChanges::default()),
            Err(RentalError::Conflict(_))
        ));
        assert!(matches!(invoices.cancel(id), Err(RentalError::Conflict(_))));
    }

    #[test]
    fn unit_with_invoices_cannot_be_deleted() {
        let fx = Fixture::new();
        let a1 = fx.unit("A1");
        fx.tenant("wanjiru@example.com", Some(a1.id));
        let report = service(&fx)
            .generate_monthly_on(period("2025-09"), date(2025, 9, 1))
            .unwrap();
        assert_eq!(report.generated.len(), 1);

        let units = RentalUnitService::new(fx.store.clone());
        units.vacate(a1.id).unwrap();
        assert!(matches!(units.delete(a1.id), Err(RentalError::Conflict(_))));
    }
}
