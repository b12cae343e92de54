//! Reference data: currencies, payment types and payment modes.

use chrono::{DateTime, Utc};
use rentdesk_types::{CurrencyCode, NonEmptyText};
use rentdesk_uuid::RecordId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Currency {
    pub id: RecordId,
    pub code: CurrencyCode,
    pub name: NonEmptyText,
    pub symbol: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CurrencyInput {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CurrencyChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    pub symbol: Option<String>,
}

/// What a payment was for (rent, deposit, utilities, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentType {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a payment was made (cash, bank transfer, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentMode {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a payment type or payment mode.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LookupInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LookupChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}
