use chrono::{DateTime, Utc};
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Vacant,
    Occupied,
    UnderMaintenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct RentalUnit {
    pub id: RecordId,
    pub property_id: RecordId,
    pub unit_number: NonEmptyText,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub rent_amount: Decimal,
    pub currency_id: RecordId,
    pub status: UnitStatus,
    /// Set exactly when `status` is `occupied`.
    pub tenant_id: Option<RecordId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RentalUnit {
    pub fn is_occupied(&self) -> bool {
        self.status == UnitStatus::Occupied
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RentalUnitInput {
    pub property_id: RecordId,
    pub unit_number: String,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    pub rent_amount: Decimal,
    pub currency_id: RecordId,
    #[serde(default)]
    pub description: Option<String>,
    /// `vacant` (default) or `under_maintenance`; units become occupied only by tenant assignment.
    #[serde(default)]
    pub status: Option<UnitStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RentalUnitChanges {
    pub unit_number: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub rent_amount: Option<Decimal>,
    pub currency_id: Option<RecordId>,
    pub description: Option<String>,
    pub status: Option<UnitStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTenant {
    pub tenant_id: RecordId,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RentalUnitFilter {
    pub property_id: Option<RecordId>,
    pub status: Option<UnitStatus>,
    pub tenant_id: Option<RecordId>,
}

impl RentalUnitFilter {
    pub fn matches(&self, unit: &RentalUnit) -> bool {
        self.property_id.map_or(true, |id| unit.property_id == id)
            && self.status.map_or(true, |status| unit.status == status)
            && self
                .tenant_id
                .map_or(true, |id| unit.tenant_id == Some(id))
    }
}
