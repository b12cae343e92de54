use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_types::BillingPeriod;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    /// Monthly rent; at most one live rent invoice per unit and period.
    Rent,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    /// Settlement status implied by how much of `amount` has been paid.
    pub fn from_amounts(amount: Decimal, amount_paid: Decimal) -> Self {
        if amount_paid <= Decimal::ZERO {
            Self::Unpaid
        } else if amount_paid < amount {
            Self::PartiallyPaid
        } else {
            Self::Paid
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Invoice {
    pub id: RecordId,
    pub invoice_number: String,
    pub kind: InvoiceKind,
    pub tenant_id: RecordId,
    pub rental_unit_id: RecordId,
    pub period: Option<BillingPeriod>,
    pub description: Option<String>,
    pub amount: Decimal,
    pub amount_paid: Decimal,
    pub currency_id: RecordId,
    pub issued_on: NaiveDate,
    pub due_on: NaiveDate,
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn outstanding(&self) -> Decimal {
        if self.status == InvoiceStatus::Cancelled {
            return Decimal::ZERO;
        }
        (self.amount - self.amount_paid).max(Decimal::ZERO)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid
        ) && self.due_on < today
    }

    /// Recompute `status` from the amounts, leaving cancelled invoices alone.
    pub fn refresh_status(&mut self) {
        if self.status != InvoiceStatus::Cancelled {
            self.status = InvoiceStatus::from_amounts(self.amount, self.amount_paid);
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct InvoiceInput {
    pub tenant_id: RecordId,
    pub rental_unit_id: RecordId,
    pub amount: Decimal,
    pub currency_id: RecordId,
    #[serde(default)]
    pub kind: Option<InvoiceKind>,
    #[serde(default)]
    pub period: Option<BillingPeriod>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
    pub due_on: NaiveDate,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct InvoiceChanges {
    pub description: Option<String>,
    pub due_on: Option<NaiveDate>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InvoiceFilter {
    pub tenant_id: Option<RecordId>,
    pub rental_unit_id: Option<RecordId>,
    pub status: Option<InvoiceStatus>,
    pub period: Option<BillingPeriod>,
    /// Only unpaid or partially paid invoices past their due date.
    pub overdue: Option<bool>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice, today: NaiveDate) -> bool {
        self.tenant_id.map_or(true, |id| invoice.tenant_id == id)
            && self
                .rental_unit_id
                .map_or(true, |id| invoice.rental_unit_id == id)
            && self.status.map_or(true, |s| invoice.status == s)
            && self.period.map_or(true, |p| invoice.period == Some(p))
            && self
                .overdue
                .map_or(true, |overdue| invoice.is_overdue(today) == overdue)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GenerateInvoices {
    pub period: BillingPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotOccupied,
    AlreadyInvoiced,
    /// The period's rent invoice was cancelled; only the scheduled run honours this.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkippedUnit {
    pub rental_unit_id: RecordId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GenerationReport {
    pub period: BillingPeriod,
    pub generated: Vec<Invoice>,
    pub skipped: Vec<SkippedUnit>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn status_follows_amount_paid() {
        assert_eq!(InvoiceStatus::from_amounts(dec!(100), dec!(0)), InvoiceStatus::Unpaid);
        assert_eq!(
            InvoiceStatus::from_amounts(dec!(100), dec!(40)),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(InvoiceStatus::from_amounts(dec!(100), dec!(100)), InvoiceStatus::Paid);
    }
}
