use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: RecordId,
    pub tenant_id: RecordId,
    pub rental_unit_id: Option<RecordId>,
    pub invoice_id: Option<RecordId>,
    pub amount: Decimal,
    pub currency_id: RecordId,
    pub payment_type_id: RecordId,
    pub payment_mode_id: RecordId,
    pub paid_on: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentInput {
    pub tenant_id: RecordId,
    #[serde(default)]
    pub invoice_id: Option<RecordId>,
    pub amount: Decimal,
    pub currency_id: RecordId,
    pub payment_type_id: RecordId,
    pub payment_mode_id: RecordId,
    #[serde(default)]
    pub paid_on: Option<NaiveDate>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Only descriptive fields can change; a wrong amount is corrected by deleting the payment.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PaymentChanges {
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub payment_type_id: Option<RecordId>,
    pub payment_mode_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilter {
    pub tenant_id: Option<RecordId>,
    pub invoice_id: Option<RecordId>,
    /// Inclusive lower bound on `paid_on`.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `paid_on`.
    pub to: Option<NaiveDate>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        self.tenant_id.map_or(true, |id| payment.tenant_id == id)
            && self
                .invoice_id
                .map_or(true, |id| payment.invoice_id == Some(id))
            && self.from.map_or(true, |from| payment.paid_on >= from)
            && self.to.map_or(true, |to| payment.paid_on <= to)
    }
}
