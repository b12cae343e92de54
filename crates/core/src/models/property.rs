use chrono::{DateTime, Utc};
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Residential,
    Commercial,
    MixedUse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Property {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub address: NonEmptyText,
    pub city: NonEmptyText,
    pub property_type: PropertyType,
    pub description: Option<String>,
    pub manager_id: Option<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PropertyInput {
    pub name: String,
    pub address: String,
    pub city: String,
    pub property_type: PropertyType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub manager_id: Option<RecordId>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct PropertyChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    pub description: Option<String>,
    /// `null` removes the manager.
    #[serde(default, deserialize_with = "super::nullable")]
    #[schema(value_type = Option<RecordId>)]
    pub manager_id: Option<Option<RecordId>>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PropertyFilter {
    pub city: Option<String>,
    pub property_type: Option<PropertyType>,
    /// Case-insensitive match on name or address.
    pub q: Option<String>,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(city) = &self.city {
            if !property.city.eq_ignore_case(city) {
                return false;
            }
        }
        if let Some(kind) = self.property_type {
            if property.property_type != kind {
                return false;
            }
        }
        if let Some(q) = &self.q {
            if !super::contains_ignore_case(property.name.as_str(), q)
                && !super::contains_ignore_case(property.address.as_str(), q)
            {
                return false;
            }
        }
        true
    }
}
