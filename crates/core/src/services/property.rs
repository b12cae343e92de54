use crate::models::{Property, PropertyChanges, PropertyFilter, PropertyInput, PropertyType, User};
use crate::pagination::{Page, PageRequest};
use crate::services::{check_reference, merge_text};
use crate::store::{Store, Tables};
use crate::validation::{ValidationErrors, MAX_LONG_TEXT};
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use std::sync::Arc;

#[derive(Clone)]
pub struct PropertyService {
    store: Arc<Store>,
}

struct PropertyFields {
    name: NonEmptyText,
    address: NonEmptyText,
    city: NonEmptyText,
    property_type: PropertyType,
    description: Option<String>,
    manager_id: Option<RecordId>,
}

fn validate_property(tables: &Tables, input: &PropertyInput) -> RentalResult<PropertyFields> {
    let mut errors = ValidationErrors::new();
    let name = errors.required_text("name", &input.name);
    let address = errors.required_text("address", &input.address);
    let city = errors.required_text("city", &input.city);
    let description =
        errors.optional_text("description", input.description.as_deref(), MAX_LONG_TEXT);

    if let Some(manager_id) = input.manager_id {
        if let Some(manager) = check_reference::<User>(tables, &mut errors, "manager_id", manager_id) {
            errors.check(
                manager.active,
                "manager_id",
                "The selected manager_id is not an active user.",
            );
        }
    }

    match (name, address, city) {
        (Some(name), Some(address), Some(city)) if errors.is_empty() => Ok(PropertyFields {
            name,
            address,
            city,
            property_type: input.property_type,
            description,
            manager_id: input.manager_id,
        }),
        _ => Err(RentalError::Validation(errors)),
    }
}

impl PropertyService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &PropertyFilter, page: &PageRequest) -> RentalResult<Page<Property>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.properties.ordered_where(|p| filter.matches(p)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Property> {
        self.store.read(|t| t.require::<Property>(&id).cloned())
    }

    pub fn create(&self, input: PropertyInput) -> RentalResult<Property> {
        let property = self.store.write(|tx| {
            let fields = validate_property(tx.tables(), &input)?;
            let now = Utc::now();
            let property = Property {
                id: RecordId::new(),
                name: fields.name,
                address: fields.address,
                city: fields.city,
                property_type: fields.property_type,
                description: fields.description,
                manager_id: fields.manager_id,
                created_at: now,
                updated_at: now,
            };
            tx.put(property.clone())?;
            Ok(property)
        })?;
        tracing::info!(property_id = %property.id, "property created");
        Ok(property)
    }

    pub fn update(&self, id: RecordId, changes: PropertyChanges) -> RentalResult<Property> {
        self.store.write(|tx| {
            let current = tx.require::<Property>(&id)?.clone();
            let merged = PropertyInput {
                name: changes.name.unwrap_or_else(|| current.name.to_string()),
                address: changes.address.unwrap_or_else(|| current.address.to_string()),
                city: changes.city.unwrap_or_else(|| current.city.to_string()),
                property_type: changes.property_type.unwrap_or(current.property_type),
                description: merge_text(changes.description, &current.description),
                manager_id: changes.manager_id.unwrap_or(current.manager_id),
            };
            let fields = validate_property(tx.tables(), &merged)?;

            let updated = Property {
                name: fields.name,
                address: fields.address,
                city: fields.city,
                property_type: fields.property_type,
                description: fields.description,
                manager_id: fields.manager_id,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Refused while the property still has rental units or assets.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let t = tx.tables();
            let property = t.require::<Property>(&id)?;
            let units = t.rental_units.iter().filter(|u| u.property_id == id).count();
            let assets = t.assets.iter().filter(|a| a.property_id == id).count();
            if units > 0 || assets > 0 {
                return Err(RentalError::conflict(format!(
                    "property '{}' still has {units} rental unit(s) and {assets} asset(s)",
                    property.name
                )));
            }
            tx.delete::<Property>(&id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssetInput, RoleInput, UserChanges, UserInput};
    use crate::services::{AssetService, RentalUnitService, RoleService, UserService};
    use tempfile::TempDir;

    fn store() -> (TempDir, Arc<Store>) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(Store::open(temp_dir.path()).expect("open store"));
        (temp_dir, store)
    }

    fn input(name: &str, city: &str) -> PropertyInput {
        PropertyInput {
            name: name.into(),
            address: "14 Ngong Road".into(),
            city: city.into(),
            property_type: PropertyType::Residential,
            description: None,
            manager_id: None,
        }
    }

    #[test]
    fn create_requires_name_address_and_city() {
        let (_dir, store) = store();
        let service = PropertyService::new(store);

        let mut bad = input("", "");
        bad.address = " ".into();
        match service.create(bad).unwrap_err() {
            RentalError::Validation(errors) => {
                assert_eq!(
                    errors.fields().collect::<Vec<_>>(),
                    vec!["address", "city", "name"]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn list_filters_by_city_and_search_term() {
        let (_dir, store) = store();
        let service = PropertyService::new(store);
        service.create(input("Riverside Court", "Nairobi")).unwrap();
        service.create(input("Hilltop Villas", "Mombasa")).unwrap();
        service.create(input("Riverside Annex", "Mombasa")).unwrap();

        let filter = PropertyFilter {
            city: Some("mombasa".into()),
            q: Some("RIVER".into()),
            ..Default::default()
        };
        let page = service.list(&filter, &PageRequest::default()).unwrap();
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.data[0].name.as_str(), "Riverside Annex");
    }

    #[test]
    fn manager_must_be_an_active_user() {
        let (_dir, store) = store();
        let role = RoleService::new(store.clone())
            .create(RoleInput {
                name: "Manager".into(),
                permissions: vec![],
            })
            .unwrap();
        let users = UserService::new(store.clone());
        let manager = users
            .create(UserInput {
                name: "Peter Kamau".into(),
                email: "peter@example.com".into(),
                password: "long-enough".into(),
                role_id: role.id,
                active: false,
            })
            .unwrap();

        let service = PropertyService::new(store);
        let mut with_manager = input("Riverside Court", "Nairobi");
        with_manager.manager_id = Some(manager.id);
        assert!(matches!(
            service.create(with_manager.clone()),
            Err(RentalError::Validation(_))
        ));

        users
            .update(
                manager.id,
                UserChanges {
                    active: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        let property = service.create(with_manager).unwrap();
        assert_eq!(property.manager_id, Some(manager.id));
        assert!(matches!(users.delete(manager.id), Err(RentalError::Conflict(_))));

        let unassigned = service
            .update(
                property.id,
                PropertyChanges {
                    manager_id: Some(None),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(unassigned.manager_id, None);
        users.delete(manager.id).unwrap();
    }

    #[test]
    fn update_keeps_unchanged_fields() {
        let (_dir, store) = store();
        let service = PropertyService::new(store);
        let created = service.create(input("Riverside Court", "Nairobi")).unwrap();

        let updated = service
            .update(
                created.id,
                PropertyChanges {
                    property_type: Some(PropertyType::MixedUse),
                    description: Some("Ground floor shops".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.property_type, PropertyType::MixedUse);
        assert_eq!(updated.description.as_deref(), Some("Ground floor shops"));
        assert_eq!(service.get(created.id).unwrap(), updated);
    }

    #[test]
    fn property_with_units_or_assets_cannot_be_deleted() {
        let fx = crate::services::unit::tests::Fixture::new();
        let service = PropertyService::new(fx.store.clone());
        let unit = fx.unit("A1");

        match service.delete(fx.property_id).unwrap_err() {
            RentalError::Conflict(message) => assert!(message.contains("1 rental unit(s)")),
            other => panic!("expected conflict, got {other:?}"),
        }

        RentalUnitService::new(fx.store.clone())
            .delete(unit.id)
            .unwrap();
        let assets = AssetService::new(fx.store.clone());
        let boiler = assets
            .create(AssetInput {
                property_id: fx.property_id,
                rental_unit_id: None,
                name: "Boiler".into(),
                category: "Plumbing".into(),
                serial_number: None,
                purchase_date: None,
                value: None,
                condition: None,
            })
            .unwrap();
        match service.delete(fx.property_id).unwrap_err() {
            RentalError::Conflict(message) => assert!(message.contains("1 asset(s)")),
            other => panic!("expected conflict, got {other:?}"),
        }

        assets.delete(boiler.id).unwrap();
        service.delete(fx.property_id).unwrap();
        assert!(matches!(
            service.get(fx.property_id),
            Err(RentalError::NotFound { .. })
        ));
    }
}
