use chrono::{DateTime, NaiveDate, Utc};
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetCondition {
    Good,
    Fair,
    Damaged,
    /// Set and cleared by maintenance requests only.
    UnderMaintenance,
    Retired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Asset {
    pub id: RecordId,
    pub property_id: RecordId,
    /// `None` for property-wide assets (lifts, boilers, gates).
    pub rental_unit_id: Option<RecordId>,
    pub name: NonEmptyText,
    pub category: NonEmptyText,
    pub serial_number: Option<String>,
    pub purchase_date: Option<NaiveDate>,
    pub value: Option<Decimal>,
    pub condition: AssetCondition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssetInput {
    pub property_id: RecordId,
    #[serde(default)]
    pub rental_unit_id: Option<RecordId>,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub value: Option<Decimal>,
    #[serde(default)]
    pub condition: Option<AssetCondition>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AssetChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>, format = Date)]
    pub purchase_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<String>)]
    pub value: Option<Option<Decimal>>,
    pub condition: Option<AssetCondition>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AssetFilter {
    pub property_id: Option<RecordId>,
    pub rental_unit_id: Option<RecordId>,
    pub condition: Option<AssetCondition>,
}

impl AssetFilter {
    pub fn matches(&self, asset: &Asset) -> bool {
        self.property_id.map_or(true, |id| asset.property_id == id)
            && self
                .rental_unit_id
                .map_or(true, |id| asset.rental_unit_id == Some(id))
            && self.condition.map_or(true, |c| asset.condition == c)
    }
}
