use crate::models::{
    Asset, AssetChanges, AssetCondition, AssetFilter, AssetInput, Property, RentalUnit,
};
use crate::pagination::{Page, PageRequest};
use crate::services::{check_reference, merge_text};
use crate::store::{Store, Tables};
use crate::validation::{ValidationErrors, MAX_SHORT_TEXT};
use crate::{RentalError, RentalResult};
use chrono::{NaiveDate, Utc};
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct AssetService {
    store: Arc<Store>,
}

struct AssetFields {
    name: NonEmptyText,
    category: NonEmptyText,
    serial_number: Option<String>,
    purchase_date: Option<NaiveDate>,
    value: Option<Decimal>,
}

fn validate_asset(tables: &Tables, input: &AssetInput) -> RentalResult<AssetFields> {
    let mut errors = ValidationErrors::new();
    let name = errors.required_text("name", &input.name);
    let category = errors.required_text("category", &input.category);
    let serial_number =
        errors.optional_text("serial_number", input.serial_number.as_deref(), MAX_SHORT_TEXT);
    let value = match input.value {
        Some(value) => errors.non_negative_amount("value", value),
        None => None,
    };

    let property = check_reference::<Property>(tables, &mut errors, "property_id", input.property_id);
    if let (Some(property), Some(unit_id)) = (property, input.rental_unit_id) {
        if let Some(unit) = check_reference::<RentalUnit>(tables, &mut errors, "rental_unit_id", unit_id) {
            errors.check(
                unit.property_id == property.id,
                "rental_unit_id",
                "The selected rental_unit_id does not belong to the property.",
            );
        }
    }

    match (name, category) {
        (Some(name), Some(category)) if errors.is_empty() => Ok(AssetFields {
            name,
            category,
            serial_number,
            purchase_date: input.purchase_date,
            value,
        }),
        _ => Err(RentalError::Validation(errors)),
    }
}

fn has_open_request(tables: &Tables, asset_id: RecordId) -> bool {
    tables
        .maintenance_requests
        .iter()
        .any(|m| m.asset_id == Some(asset_id) && m.status.is_open())
}

fn maintenance_condition_error() -> RentalError {
    let mut errors = ValidationErrors::new();
    errors.add(
        "condition",
        "The under_maintenance condition is managed by maintenance requests.",
    );
    RentalError::Validation(errors)
}

impl AssetService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &AssetFilter, page: &PageRequest) -> RentalResult<Page<Asset>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.assets.ordered_where(|a| filter.matches(a)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Asset> {
        self.store.read(|t| t.require::<Asset>(&id).cloned())
    }

    pub fn create(&self, input: AssetInput) -> RentalResult<Asset> {
        let condition = input.condition.unwrap_or(AssetCondition::Good);
        if condition == AssetCondition::UnderMaintenance {
            return Err(maintenance_condition_error());
        }

        let asset = self.store.write(|tx| {
            let fields = validate_asset(tx.tables(), &input)?;
            let now = Utc::now();
            let asset = Asset {
                id: RecordId::new(),
                property_id: input.property_id,
                rental_unit_id: input.rental_unit_id,
                name: fields.name,
                category: fields.category,
                serial_number: fields.serial_number,
                purchase_date: fields.purchase_date,
                value: fields.value,
                condition,
                created_at: now,
                updated_at: now,
            };
            tx.put(asset.clone())?;
            Ok(asset)
        })?;
        tracing::info!(asset_id = %asset.id, property_id = %asset.property_id, "asset created");
        Ok(asset)
    }

    /// Update an asset. `under_maintenance` can be neither set nor cleared here while a
    /// maintenance request owns the asset.
    pub fn update(&self, id: RecordId, changes: AssetChanges) -> RentalResult<Asset> {
        self.store.write(|tx| {
            let current = tx.require::<Asset>(&id)?.clone();
            let merged = AssetInput {
                property_id: current.property_id,
                rental_unit_id: current.rental_unit_id,
                name: changes.name.unwrap_or_else(|| current.name.to_string()),
                category: changes
                    .category
                    .unwrap_or_else(|| current.category.to_string()),
                serial_number: merge_text(changes.serial_number, &current.serial_number),
                purchase_date: changes.purchase_date.unwrap_or(current.purchase_date),
                value: changes.value.unwrap_or(current.value),
                condition: None,
            };
            let fields = validate_asset(tx.tables(), &merged)?;

            let condition = match changes.condition {
                None => current.condition,
                Some(next) if next == current.condition => next,
                Some(AssetCondition::UnderMaintenance) => return Err(maintenance_condition_error()),
                Some(next) => {
                    if has_open_request(tx.tables(), id) {
                        return Err(RentalError::conflict(format!(
                            "asset '{}' is under maintenance; close the request first",
                            current.name
                        )));
                    }
                    next
                }
            };

            let updated = Asset {
                name: fields.name,
                category: fields.category,
                serial_number: fields.serial_number,
                purchase_date: fields.purchase_date,
                value: fields.value,
                condition,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Refused while an open maintenance request refers to the asset.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let asset = tx.require::<Asset>(&id)?;
            if has_open_request(tx.tables(), id) {
                return Err(RentalError::conflict(format!(
                    "asset '{}' has an open maintenance request",
                    asset.name
                )));
            }
            tx.delete::<Asset>(&id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PropertyInput, PropertyType};
    use crate::services::unit::tests::Fixture;
    use crate::services::PropertyService;
    use rust_decimal_macros::dec;

    fn input(property_id: RecordId, unit: Option<RecordId>) -> AssetInput {
        AssetInput {
            property_id,
            rental_unit_id: unit,
            name: "Water heater".into(),
            category: "Plumbing".into(),
            serial_number: Some("WH-2231".into()),
            purchase_date: NaiveDate::from_ymd_opt(2023, 1, 15),
            value: Some(dec!(18000)),
            condition: None,
        }
    }

    #[test]
    fn unit_must_belong_to_the_property() {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        let other = PropertyService::new(fx.store.clone())
            .create(PropertyInput {
                name: "Hilltop Villas".into(),
                address: "2 Ridge Lane".into(),
                city: "Nakuru".into(),
                property_type: PropertyType::Residential,
                description: None,
                manager_id: None,
            })
            .unwrap();
        let service = AssetService::new(fx.store.clone());

        match service.create(input(other.id, Some(unit.id))).unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("rental_unit_id")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let asset = service.create(input(fx.property_id, Some(unit.id))).unwrap();
        assert_eq!(asset.condition, AssetCondition::Good);
    }

    #[test]
    fn under_maintenance_cannot_be_set_by_hand() {
        let fx = Fixture::new();
        let service = AssetService::new(fx.store.clone());

        let mut held = input(fx.property_id, None);
        held.condition = Some(AssetCondition::UnderMaintenance);
        assert!(matches!(service.create(held), Err(RentalError::Validation(_))));

        let asset = service.create(input(fx.property_id, None)).unwrap();
        let err = service
            .update(
                asset.id,
                AssetChanges {
                    condition: Some(AssetCondition::UnderMaintenance),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));

        let damaged = service
            .update(
                asset.id,
                AssetChanges {
                    condition: Some(AssetCondition::Damaged),
                    serial_number: Some(" ".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(damaged.condition, AssetCondition::Damaged);
        assert_eq!(damaged.serial_number, None);
    }

    #[test]
    fn negative_value_is_rejected() {
        let fx = Fixture::new();
        let service = AssetService::new(fx.store.clone());
        let mut bad = input(fx.property_id, None);
        bad.value = Some(dec!(-1));
        match service.create(bad).unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("value")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
