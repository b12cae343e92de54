//! Payments received from tenants, optionally settling an invoice.

use crate::models::{
    Currency, Invoice, InvoiceStatus, Payment, PaymentChanges, PaymentFilter, PaymentInput,
    PaymentMode, PaymentType, Tenant,
};
use crate::pagination::{Page, PageRequest};
use crate::services::{check_reference, merge_text, today};
use crate::store::Store;
use crate::validation::{ValidationErrors, MAX_LONG_TEXT, MAX_SHORT_TEXT};
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<Store>,
}

impl PaymentService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &PaymentFilter, page: &PageRequest) -> RentalResult<Page<Payment>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.payments.ordered_where(|p| filter.matches(p)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Payment> {
        self.store.read(|t| t.require::<Payment>(&id).cloned())
    }

    /// Record a payment. When it names an invoice, the amount is applied to that invoice and
    /// may not exceed what is still owed.
    pub fn create(&self, input: PaymentInput) -> RentalResult<Payment> {
        let paid_on = input.paid_on.unwrap_or_else(today);

        let payment = self.store.write(|tx| {
            let t = tx.tables();
            let mut errors = ValidationErrors::new();
            let tenant = check_reference::<Tenant>(t, &mut errors, "tenant_id", input.tenant_id);
            check_reference::<Currency>(t, &mut errors, "currency_id", input.currency_id);
            check_reference::<PaymentType>(t, &mut errors, "payment_type_id", input.payment_type_id);
            check_reference::<PaymentMode>(t, &mut errors, "payment_mode_id", input.payment_mode_id);
            let amount = errors.positive_amount("amount", input.amount);
            errors.check(
                paid_on <= today(),
                "paid_on",
                "The paid_on must be a date before or equal to today.",
            );
            let reference = errors.optional_text("reference", input.reference.as_deref(), MAX_SHORT_TEXT);
            let notes = errors.optional_text("notes", input.notes.as_deref(), MAX_LONG_TEXT);

            let invoice = match input.invoice_id {
                Some(invoice_id) => check_reference::<Invoice>(t, &mut errors, "invoice_id", invoice_id),
                None => None,
            };
            if let Some(invoice) = &invoice {
                errors.check(
                    invoice.tenant_id == input.tenant_id,
                    "invoice_id",
                    "The selected invoice_id belongs to another tenant.",
                );
                errors.check(
                    invoice.status != InvoiceStatus::Cancelled,
                    "invoice_id",
                    "The selected invoice_id is cancelled.",
                );
                errors.check(
                    invoice.currency_id == input.currency_id,
                    "currency_id",
                    "The currency_id must match the invoice currency.",
                );
                if let Some(amount) = amount {
                    let outstanding = invoice.outstanding();
                    errors.check(
                        amount <= outstanding,
                        "amount",
                        format!(
                            "The amount may not be greater than the outstanding balance of {outstanding}."
                        ),
                    );
                }
            }

            let (tenant, amount) = match (tenant, amount) {
                (Some(tenant), Some(amount)) if errors.is_empty() => (tenant, amount),
                _ => return Err(RentalError::Validation(errors)),
            };

            let rental_unit_id = invoice
                .as_ref()
                .map(|i| i.rental_unit_id)
                .or(tenant.rental_unit_id);
            let now = Utc::now();
            let payment = Payment {
                id: RecordId::new(),
                tenant_id: tenant.id,
                rental_unit_id,
                invoice_id: input.invoice_id,
                amount,
                currency_id: input.currency_id,
                payment_type_id: input.payment_type_id,
                payment_mode_id: input.payment_mode_id,
                paid_on,
                reference,
                notes,
                created_at: now,
                updated_at: now,
            };

            if let Some(invoice) = invoice {
                let mut invoice = Invoice {
                    amount_paid: invoice.amount_paid + amount,
                    updated_at: now,
                    ..invoice
                };
                invoice.refresh_status();
                tx.put(invoice)?;
            }
            tx.put(payment.clone())?;
            Ok(payment)
        })?;
        tracing::info!(
            payment_id = %payment.id,
            tenant_id = %payment.tenant_id,
            amount = %payment.amount,
            "payment recorded"
        );
        Ok(payment)
    }

    /// Change descriptive fields. Amounts are corrected by deleting and re-recording.
    pub fn update(&self, id: RecordId, changes: PaymentChanges) -> RentalResult<Payment> {
        self.store.write(|tx| {
            let current = tx.require::<Payment>(&id)?.clone();
            let t = tx.tables();
            let mut errors = ValidationErrors::new();
            let reference = errors.optional_text(
                "reference",
                merge_text(changes.reference, &current.reference).as_deref(),
                MAX_SHORT_TEXT,
            );
            let notes = errors.optional_text(
                "notes",
                merge_text(changes.notes, &current.notes).as_deref(),
                MAX_LONG_TEXT,
            );
            let payment_type_id = changes.payment_type_id.unwrap_or(current.payment_type_id);
            check_reference::<PaymentType>(t, &mut errors, "payment_type_id", payment_type_id);
            let payment_mode_id = changes.payment_mode_id.unwrap_or(current.payment_mode_id);
            check_reference::<PaymentMode>(t, &mut errors, "payment_mode_id", payment_mode_id);
            errors.finish()?;

            let updated = Payment {
                reference,
                notes,
                payment_type_id,
                payment_mode_id,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Remove a payment, taking its amount back off the invoice it settled.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let payment = tx.delete::<Payment>(&id)?;
            if let Some(invoice_id) = payment.invoice_id {
                if let Some(invoice) = tx.get::<Invoice>(&invoice_id).cloned() {
                    let mut invoice = Invoice {
                        amount_paid: (invoice.amount_paid - payment.amount).max(Decimal::ZERO),
                        updated_at: Utc::now(),
                        ..invoice
                    };
                    invoice.refresh_status();
                    tx.put(invoice)?;
                }
            }
            Ok(())
        })?;
        tracing::info!(payment_id = %id, "payment deleted");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::models::{LookupInput, RentalUnitFilter};
    use crate::services::unit::tests::Fixture;
    use crate::services::{InvoiceService, PaymentModeService, PaymentTypeService, RentalUnitService};
    use rentdesk_types::BillingPeriod;
    use rust_decimal_macros::dec;

    /// One occupied unit with this month's rent invoice, plus a payment type and mode.
    pub(crate) struct Setup {
        pub fx: Fixture,
        pub tenant: Tenant,
        pub invoice: Invoice,
        pub payment_type_id: RecordId,
        pub payment_mode_id: RecordId,
    }

    /// A "Rent" payment type and an "M-Pesa" payment mode.
    pub(crate) fn lookups(fx: &Fixture) -> (RecordId, RecordId) {
        let payment_type_id = PaymentTypeService::new(fx.store.clone())
            .create(LookupInput {
                name: "Rent".into(),
                description: None,
            })
            .unwrap()
            .id;
        let payment_mode_id = PaymentModeService::new(fx.store.clone())
            .create(LookupInput {
                name: "M-Pesa".into(),
                description: None,
            })
            .unwrap()
            .id;
        (payment_type_id, payment_mode_id)
    }

    pub(crate) fn setup() -> Setup {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", Some(unit.id));

        let cfg = Arc::new(CoreConfig::with_data_dir(fx.store.data_dir().to_path_buf()));
        let period = BillingPeriod::containing(today());
        let report = InvoiceService::new(cfg, fx.store.clone())
            .generate_monthly_on(period, today())
            .unwrap();
        let invoice = report.generated[0].clone();
        let (payment_type_id, payment_mode_id) = lookups(&fx);

        Setup {
            fx,
            tenant,
            invoice,
            payment_type_id,
            payment_mode_id,
        }
    }

    pub(crate) fn pay(s: &Setup, amount: Decimal) -> RentalResult<Payment> {
        PaymentService::new(s.fx.store.clone()).create(PaymentInput {
            tenant_id: s.tenant.id,
            invoice_id: Some(s.invoice.id),
            amount,
            currency_id: s.fx.currency_id,
            payment_type_id: s.payment_type_id,
            payment_mode_id: s.payment_mode_id,
            paid_on: None,
            reference: Some("QX12AB".into()),
            notes: None,
        })
    }

    fn invoice(s: &Setup) -> Invoice {
        InvoiceService::new(
            Arc::new(CoreConfig::with_data_dir(s.fx.store.data_dir().to_path_buf())),
            s.fx.store.clone(),
        )
        .get(s.invoice.id)
        .unwrap()
    }

    #[test]
    fn payments_settle_invoice_in_steps() {
        let s = setup();
        assert_eq!(s.invoice.amount, dec!(25000));

        let first = pay(&s, dec!(10000)).unwrap();
        assert_eq!(first.rental_unit_id, Some(s.invoice.rental_unit_id));
        assert_eq!(first.paid_on, today());
        let inv = invoice(&s);
        assert_eq!(inv.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(inv.outstanding(), dec!(15000));

        pay(&s, dec!(15000)).unwrap();
        assert_eq!(invoice(&s).status, InvoiceStatus::Paid);
    }

    #[test]
    fn overpayment_is_rejected() {
        let s = setup();
        pay(&s, dec!(20000)).unwrap();

        match pay(&s, dec!(5000.01)).unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("amount")),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(invoice(&s).amount_paid, dec!(20000));
    }

    #[test]
    fn deleting_a_payment_reopens_the_invoice() {
        let s = setup();
        let payment = pay(&s, dec!(25000)).unwrap();
        assert_eq!(invoice(&s).status, InvoiceStatus::Paid);

        PaymentService::new(s.fx.store.clone())
            .delete(payment.id)
            .unwrap();
        let inv = invoice(&s);
        assert_eq!(inv.amount_paid, Decimal::ZERO);
        assert_eq!(inv.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn future_dated_payment_is_rejected() {
        let s = setup();
        let result = PaymentService::new(s.fx.store.clone()).create(PaymentInput {
            tenant_id: s.tenant.id,
            invoice_id: None,
            amount: dec!(100),
            currency_id: s.fx.currency_id,
            payment_type_id: s.payment_type_id,
            payment_mode_id: s.payment_mode_id,
            paid_on: today().succ_opt(),
            reference: None,
            notes: None,
        });
        match result.unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("paid_on")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unlinked_payment_takes_tenant_unit() {
        let s = setup();
        let payment = PaymentService::new(s.fx.store.clone())
            .create(PaymentInput {
                tenant_id: s.tenant.id,
                invoice_id: None,
                amount: dec!(5000),
                currency_id: s.fx.currency_id,
                payment_type_id: s.payment_type_id,
                payment_mode_id: s.payment_mode_id,
                paid_on: None,
                reference: None,
                notes: Some("Deposit top-up".into()),
            })
            .unwrap();
        let units = RentalUnitService::new(s.fx.store.clone())
            .list(&RentalUnitFilter::default(), &PageRequest::default())
            .unwrap();
        assert_eq!(payment.rental_unit_id, Some(units.data[0].id));
        assert_eq!(payment.invoice_id, None);
    }

    #[test]
    fn invoices_with_payments_cannot_be_cancelled_or_deleted() {
        let s = setup();
        let payment = pay(&s, dec!(1000)).unwrap();
        let invoices = InvoiceService::new(
            Arc::new(CoreConfig::with_data_dir(s.fx.store.data_dir().to_path_buf())),
            s.fx.store.clone(),
        );
        assert!(matches!(invoices.cancel(s.invoice.id), Err(RentalError::Conflict(_))));
        assert!(matches!(invoices.delete(s.invoice.id), Err(RentalError::Conflict(_))));

        let payments = PaymentService::new(s.fx.store.clone());
        let updated = payments
            .update(
                payment.id,
                PaymentChanges {
                    reference: Some("QX12AC".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.reference.as_deref(), Some("QX12AC"));
        assert_eq!(updated.amount, dec!(1000));
    }
}
