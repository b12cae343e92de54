use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_types::{EmailAddress, NonEmptyText};
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    Active,
    Former,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tenant {
    pub id: RecordId,
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub email: EmailAddress,
    pub phone: NonEmptyText,
    pub national_id: Option<String>,
    /// Mirrors `RentalUnit::tenant_id` on the unit the tenant occupies.
    pub rental_unit_id: Option<RecordId>,
    pub lease_start: Option<NaiveDate>,
    pub lease_end: Option<NaiveDate>,
    pub deposit: Option<Decimal>,
    pub status: TenantStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TenantInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub national_id: Option<String>,
    /// When given, the tenant moves into this (vacant) unit on creation.
    #[serde(default)]
    pub rental_unit_id: Option<RecordId>,
    #[serde(default)]
    pub lease_start: Option<NaiveDate>,
    #[serde(default)]
    pub lease_end: Option<NaiveDate>,
    #[serde(default)]
    pub deposit: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TenantChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    /// `null` clears the lease start.
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub lease_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub lease_end: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>)]
    pub deposit: Option<Option<Decimal>>,
    /// Setting `former` moves the tenant out of their unit.
    pub status: Option<TenantStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TenantFilter {
    pub rental_unit_id: Option<RecordId>,
    pub status: Option<TenantStatus>,
    /// Case-insensitive match on name or email.
    pub q: Option<String>,
}

impl TenantFilter {
    pub fn matches(&self, tenant: &Tenant) -> bool {
        if let Some(unit_id) = self.rental_unit_id {
            if tenant.rental_unit_id != Some(unit_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if tenant.status != status {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !super::contains_ignore_case(&tenant.full_name(), q)
                && !super::contains_ignore_case(tenant.email.as_str(), q)
            {
                return false;
            }
        }
        true
    }
}
