//! Rental units and their occupancy.
//!
//! A unit's `status` and `tenant_id` are kept consistent with the tenant side and with open
//! maintenance work:
//!
//! - a unit is `occupied` exactly when it has a tenant,
//! - a tenant occupies at most one unit, and the tenant's `rental_unit_id` points back at it,
//! - a unit with an open request that blocks occupancy is `under_maintenance` and cannot be let.
//!
//! The helpers at the bottom of this module apply those rules inside a store transaction and
//! are shared with the tenant and maintenance services.

use crate::models::{
    Currency, MaintenanceRequest, Property, RentalUnit, RentalUnitChanges, RentalUnitFilter,
    RentalUnitInput, Tenant, TenantStatus, UnitStatus,
};
use crate::pagination::{Page, PageRequest};
use crate::services::{check_reference, merge_text};
use crate::store::{Store, Tables, Transaction};
use crate::validation::{ValidationErrors, MAX_LONG_TEXT};
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use std::sync::Arc;

#[derive(Clone)]
pub struct RentalUnitService {
    store: Arc<Store>,
}

struct UnitFields {
    unit_number: NonEmptyText,
    rent_amount: Decimal,
    currency_id: RecordId,
    description: Option<String>,
}

fn validate_unit(tables: &Tables, input: &RentalUnitInput) -> RentalResult<UnitFields> {
    let mut errors = ValidationErrors::new();
    let unit_number = errors.required_text("unit_number", &input.unit_number);
    let rent_amount = errors.positive_amount("rent_amount", input.rent_amount);
    let currency = check_reference::<Currency>(tables, &mut errors, "currency_id", input.currency_id);
    let description =
        errors.optional_text("description", input.description.as_deref(), MAX_LONG_TEXT);

    match (unit_number, rent_amount, currency) {
        (Some(unit_number), Some(rent_amount), Some(currency)) if errors.is_empty() => {
            Ok(UnitFields {
                unit_number,
                rent_amount,
                currency_id: currency.id,
                description,
            })
        }
        _ => Err(RentalError::Validation(errors)),
    }
}

fn ensure_unit_number_free(
    tables: &Tables,
    property_id: RecordId,
    unit_number: &NonEmptyText,
    except: Option<RecordId>,
) -> RentalResult<()> {
    let taken = tables.rental_units.iter().any(|u| {
        u.property_id == property_id
            && u.unit_number.eq_ignore_case(unit_number.as_str())
            && Some(u.id) != except
    });
    if taken {
        return Err(RentalError::conflict(format!(
            "unit {unit_number} already exists in this property"
        )));
    }
    Ok(())
}

impl RentalUnitService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &RentalUnitFilter, page: &PageRequest) -> RentalResult<Page<RentalUnit>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.rental_units.ordered_where(|u| filter.matches(u)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<RentalUnit> {
        self.store.read(|t| t.require::<RentalUnit>(&id).cloned())
    }

    /// Create a unit. New units are `vacant` unless created `under_maintenance`.
    pub fn create(&self, input: RentalUnitInput) -> RentalResult<RentalUnit> {
        let unit = self.store.write(|tx| {
            let t = tx.tables();
            let mut errors = ValidationErrors::new();
            check_reference::<Property>(t, &mut errors, "property_id", input.property_id);
            let status = input.status.unwrap_or(UnitStatus::Vacant);
            errors.check(
                status != UnitStatus::Occupied,
                "status",
                "A unit becomes occupied only by assigning a tenant.",
            );
            let fields = match validate_unit(t, &input) {
                Ok(fields) if errors.is_empty() => fields,
                Ok(_) => return Err(RentalError::Validation(errors)),
                Err(RentalError::Validation(more)) => {
                    errors.merge(more);
                    return Err(RentalError::Validation(errors));
                }
                Err(e) => return Err(e),
            };
            ensure_unit_number_free(t, input.property_id, &fields.unit_number, None)?;

            let now = Utc::now();
            let unit = RentalUnit {
                id: RecordId::new(),
                property_id: input.property_id,
                unit_number: fields.unit_number,
                bedrooms: input.bedrooms,
                bathrooms: input.bathrooms,
                rent_amount: fields.rent_amount,
                currency_id: fields.currency_id,
                status,
                tenant_id: None,
                description: fields.description,
                created_at: now,
                updated_at: now,
            };
            tx.put(unit.clone())?;
            Ok(unit)
        })?;
        tracing::info!(rental_unit_id = %unit.id, property_id = %unit.property_id, "rental unit created");
        Ok(unit)
    }

    /// Update descriptive fields and rent. `status` may only move between `vacant` and
    /// `under_maintenance`; occupancy changes go through [`Self::assign_tenant`] and
    /// [`Self::vacate`].
    pub fn update(&self, id: RecordId, changes: RentalUnitChanges) -> RentalResult<RentalUnit> {
        self.store.write(|tx| {
            let current = tx.require::<RentalUnit>(&id)?.clone();
            let merged = RentalUnitInput {
                property_id: current.property_id,
                unit_number: changes
                    .unit_number
                    .unwrap_or_else(|| current.unit_number.to_string()),
                bedrooms: changes.bedrooms.unwrap_or(current.bedrooms),
                bathrooms: changes.bathrooms.unwrap_or(current.bathrooms),
                rent_amount: changes.rent_amount.unwrap_or(current.rent_amount),
                currency_id: changes.currency_id.unwrap_or(current.currency_id),
                description: merge_text(changes.description, &current.description),
                status: None,
            };
            let fields = validate_unit(tx.tables(), &merged)?;
            ensure_unit_number_free(tx.tables(), current.property_id, &fields.unit_number, Some(id))?;

            let status = match changes.status {
                None => current.status,
                Some(next) if next == current.status => next,
                Some(next) => {
                    check_manual_status_change(tx.tables(), &current, next)?;
                    next
                }
            };

            let updated = RentalUnit {
                unit_number: fields.unit_number,
                bedrooms: merged.bedrooms,
                bathrooms: merged.bathrooms,
                rent_amount: fields.rent_amount,
                currency_id: fields.currency_id,
                description: fields.description,
                status,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Move an active tenant into a vacant unit.
    pub fn assign_tenant(&self, unit_id: RecordId, tenant_id: RecordId) -> RentalResult<RentalUnit> {
        let unit = self
            .store
            .write(|tx| assign_in_tx(tx, unit_id, tenant_id))?;
        tracing::info!(rental_unit_id = %unit_id, tenant_id = %tenant_id, "tenant assigned");
        Ok(unit)
    }

    /// Move the current tenant out. The tenant record stays `active`.
    pub fn vacate(&self, unit_id: RecordId) -> RentalResult<RentalUnit> {
        let unit = self.store.write(|tx| {
            let unit = tx.require::<RentalUnit>(&unit_id)?;
            if !unit.is_occupied() {
                return Err(RentalError::conflict(format!(
                    "unit {} is not occupied",
                    unit.unit_number
                )));
            }
            vacate_in_tx(tx, unit_id)
        })?;
        tracing::info!(rental_unit_id = %unit_id, "rental unit vacated");
        Ok(unit)
    }

    /// Refused while the unit is occupied or still referenced by assets, open maintenance
    /// requests, invoices or payments. Closed maintenance requests are removed with the unit.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let t = tx.tables();
            let unit = t.require::<RentalUnit>(&id)?;
            if unit.is_occupied() {
                return Err(RentalError::conflict(format!(
                    "unit {} is occupied; vacate it first",
                    unit.unit_number
                )));
            }

            let mut blockers = Vec::new();
            let assets = t.assets.iter().filter(|a| a.rental_unit_id == Some(id)).count();
            if assets > 0 {
                blockers.push(format!("{assets} asset(s)"));
            }
            let open = t
                .maintenance_requests
                .iter()
                .filter(|m| m.rental_unit_id == id && m.status.is_open())
                .count();
            if open > 0 {
                blockers.push(format!("{open} open maintenance request(s)"));
            }
            let invoices = t.invoices.iter().filter(|i| i.rental_unit_id == id).count();
            if invoices > 0 {
                blockers.push(format!("{invoices} invoice(s)"));
            }
            let payments = t
                .payments
                .iter()
                .filter(|p| p.rental_unit_id == Some(id))
                .count();
            if payments > 0 {
                blockers.push(format!("{payments} payment(s)"));
            }
            if !blockers.is_empty() {
                return Err(RentalError::conflict(format!(
                    "unit {} is referenced by {}",
                    unit.unit_number,
                    blockers.join(", ")
                )));
            }

            let closed: Vec<RecordId> = t
                .maintenance_requests
                .iter()
                .filter(|m| m.rental_unit_id == id)
                .map(|m| m.id)
                .collect();
            for request_id in closed {
                tx.delete::<MaintenanceRequest>(&request_id)?;
            }
            tx.delete::<RentalUnit>(&id)?;
            Ok(())
        })
    }
}

fn check_manual_status_change(tables: &Tables, unit: &RentalUnit, next: UnitStatus) -> RentalResult<()> {
    if next == UnitStatus::Occupied {
        let mut errors = ValidationErrors::new();
        errors.add("status", "A unit becomes occupied only by assigning a tenant.");
        return Err(RentalError::Validation(errors));
    }
    if unit.is_occupied() {
        return Err(RentalError::conflict(format!(
            "unit {} is occupied; vacate it before changing its status",
            unit.unit_number
        )));
    }
    if unit.status == UnitStatus::UnderMaintenance && has_blocking_request(tables, unit.id, None) {
        return Err(RentalError::conflict(format!(
            "unit {} has open maintenance work that blocks occupancy",
            unit.unit_number
        )));
    }
    Ok(())
}

// ============================================================================
// OCCUPANCY RULES (shared with tenants and maintenance)
// ============================================================================

/// Whether an open request other than `except` blocks occupancy of `unit_id`.
pub(crate) fn has_blocking_request(tables: &Tables, unit_id: RecordId, except: Option<RecordId>) -> bool {
    tables.maintenance_requests.iter().any(|m| {
        m.rental_unit_id == unit_id
            && m.blocks_occupancy
            && m.status.is_open()
            && Some(m.id) != except
    })
}

/// Link `tenant_id` and `unit_id`, making the unit `occupied`.
pub(crate) fn assign_in_tx(
    tx: &mut Transaction<'_>,
    unit_id: RecordId,
    tenant_id: RecordId,
) -> RentalResult<RentalUnit> {
    let unit = tx.require::<RentalUnit>(&unit_id)?.clone();

    let mut errors = ValidationErrors::new();
    let tenant = check_reference::<Tenant>(tx.tables(), &mut errors, "tenant_id", tenant_id);
    errors.finish()?;
    let Some(tenant) = tenant else {
        return Err(RentalError::not_found("tenant", tenant_id));
    };

    match unit.status {
        UnitStatus::Vacant => {}
        UnitStatus::Occupied => {
            return Err(RentalError::conflict(format!(
                "unit {} is already occupied",
                unit.unit_number
            )))
        }
        UnitStatus::UnderMaintenance => {
            return Err(RentalError::conflict(format!(
                "unit {} is under maintenance and cannot be let",
                unit.unit_number
            )))
        }
    }
    if tenant.status != TenantStatus::Active {
        return Err(RentalError::conflict(format!(
            "{} is a former tenant",
            tenant.full_name()
        )));
    }
    if let Some(other) = tenant.rental_unit_id {
        return Err(RentalError::conflict(format!(
            "{} already occupies unit {other}",
            tenant.full_name()
        )));
    }

    let now = Utc::now();
    let unit = RentalUnit {
        status: UnitStatus::Occupied,
        tenant_id: Some(tenant_id),
        updated_at: now,
        ..unit
    };
    tx.put(unit.clone())?;
    tx.put(Tenant {
        rental_unit_id: Some(unit_id),
        updated_at: now,
        ..tenant
    })?;
    Ok(unit)
}

/// Unlink a unit from its tenant, if any, leaving it `vacant`.
pub(crate) fn vacate_in_tx(tx: &mut Transaction<'_>, unit_id: RecordId) -> RentalResult<RentalUnit> {
    let unit = tx.require::<RentalUnit>(&unit_id)?.clone();
    let now = Utc::now();

    if let Some(tenant_id) = unit.tenant_id {
        if let Some(tenant) = tx.get::<Tenant>(&tenant_id).cloned() {
            tx.put(Tenant {
                rental_unit_id: None,
                updated_at: now,
                ..tenant
            })?;
        }
    }

    let unit = RentalUnit {
        status: UnitStatus::Vacant,
        tenant_id: None,
        updated_at: now,
        ..unit
    };
    tx.put(unit.clone())?;
    Ok(unit)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{CurrencyInput, PaymentInput, PropertyInput, PropertyType, TenantInput};
    use crate::services::{CurrencyService, PaymentService, PropertyService, TenantService};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    /// A store with one currency and one property, shared by the occupancy tests.
    pub(crate) struct Fixture {
        pub _dir: TempDir,
        pub store: Arc<Store>,
        pub currency_id: RecordId,
        pub property_id: RecordId,
    }

    impl Fixture {
        pub fn new() -> Self {
            let dir = TempDir::new().expect("Failed to create temp dir");
            let store = Arc::new(Store::open(dir.path()).expect("open store"));
            let currency = CurrencyService::new(store.clone())
                .create(CurrencyInput {
                    code: "KES".into(),
                    name: "Kenyan Shilling".into(),
                    symbol: None,
                })
                .unwrap();
            let property = PropertyService::new(store.clone())
                .create(PropertyInput {
                    name: "Riverside Court".into(),
                    address: "14 Ngong Road".into(),
                    city: "Nairobi".into(),
                    property_type: PropertyType::Residential,
                    description: None,
                    manager_id: None,
                })
                .unwrap();
            Self {
                _dir: dir,
                store,
                currency_id: currency.id,
                property_id: property.id,
            }
        }

        pub fn unit(&self, number: &str) -> RentalUnit {
            RentalUnitService::new(self.store.clone())
                .create(RentalUnitInput {
                    property_id: self.property_id,
                    unit_number: number.into(),
                    bedrooms: 2,
                    bathrooms: 1,
                    rent_amount: dec!(25000),
                    currency_id: self.currency_id,
                    description: None,
                    status: None,
                })
                .unwrap()
        }

        pub fn tenant(&self, email: &str, unit: Option<RecordId>) -> Tenant {
            TenantService::new(self.store.clone())
                .create(TenantInput {
                    first_name: "Wanjiru".into(),
                    last_name: "Mwangi".into(),
                    email: email.into(),
                    phone: "+254700000001".into(),
                    national_id: None,
                    rental_unit_id: unit,
                    lease_start: None,
                    lease_end: None,
                    deposit: None,
                })
                .unwrap()
        }

        /// Every unit/tenant pair agrees about occupancy.
        pub fn assert_consistent(&self) {
            self.store
                .read(|t| {
                    for unit in t.rental_units.iter() {
                        assert_eq!(unit.is_occupied(), unit.tenant_id.is_some());
                        if let Some(tenant_id) = unit.tenant_id {
                            let tenant = t.require::<Tenant>(&tenant_id).unwrap();
                            assert_eq!(tenant.rental_unit_id, Some(unit.id));
                        }
                        if has_blocking_request(t, unit.id, None) {
                            assert_eq!(unit.status, UnitStatus::UnderMaintenance);
                        }
                    }
                    for tenant in t.tenants.iter() {
                        if let Some(unit_id) = tenant.rental_unit_id {
                            let unit = t.require::<RentalUnit>(&unit_id).unwrap();
                            assert_eq!(unit.tenant_id, Some(tenant.id));
                        }
                    }
                    Ok(())
                })
                .unwrap();
        }
    }

    #[test]
    fn assign_and_vacate_keep_both_sides_in_step() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", None);

        let occupied = service.assign_tenant(unit.id, tenant.id).unwrap();
        assert_eq!(occupied.status, UnitStatus::Occupied);
        assert_eq!(occupied.tenant_id, Some(tenant.id));
        fx.assert_consistent();

        let vacant = service.vacate(unit.id).unwrap();
        assert_eq!(vacant.status, UnitStatus::Vacant);
        assert_eq!(vacant.tenant_id, None);
        fx.assert_consistent();

        assert!(matches!(service.vacate(unit.id), Err(RentalError::Conflict(_))));
    }

    #[test]
    fn tenant_cannot_occupy_two_units() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let a1 = fx.unit("A1");
        let a2 = fx.unit("A2");
        let tenant = fx.tenant("wanjiru@example.com", Some(a1.id));

        assert!(matches!(
            service.assign_tenant(a2.id, tenant.id),
            Err(RentalError::Conflict(_))
        ));
        assert_eq!(service.get(a2.id).unwrap().status, UnitStatus::Vacant);
        fx.assert_consistent();
    }

    #[test]
    fn occupied_unit_cannot_take_another_tenant() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");
        fx.tenant("first@example.com", Some(unit.id));
        let second = fx.tenant("second@example.com", None);

        assert!(matches!(
            service.assign_tenant(unit.id, second.id),
            Err(RentalError::Conflict(_))
        ));
        fx.assert_consistent();
    }

    #[test]
    fn occupied_is_not_a_manual_status() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");

        let err = service
            .update(
                unit.id,
                RentalUnitChanges {
                    status: Some(UnitStatus::Occupied),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, RentalError::Validation(_)));

        let held = service
            .update(
                unit.id,
                RentalUnitChanges {
                    status: Some(UnitStatus::UnderMaintenance),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(held.status, UnitStatus::UnderMaintenance);

        let tenant = fx.tenant("wanjiru@example.com", None);
        assert!(matches!(
            service.assign_tenant(unit.id, tenant.id),
            Err(RentalError::Conflict(_))
        ));
    }

    #[test]
    fn unit_numbers_are_unique_per_property() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        fx.unit("A1");

        let err = service
            .create(RentalUnitInput {
                property_id: fx.property_id,
                unit_number: "a1".into(),
                bedrooms: 1,
                bathrooms: 1,
                rent_amount: dec!(1000),
                currency_id: fx.currency_id,
                description: None,
                status: None,
            })
            .unwrap_err();
        assert!(matches!(err, RentalError::Conflict(_)));
    }

    #[test]
    fn create_reports_unknown_references_and_bad_rent() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());

        let err = service
            .create(RentalUnitInput {
                property_id: RecordId::new(),
                unit_number: "B1".into(),
                bedrooms: 1,
                bathrooms: 1,
                rent_amount: dec!(0),
                currency_id: RecordId::new(),
                description: None,
                status: None,
            })
            .unwrap_err();
        match err {
            RentalError::Validation(errors) => {
                assert!(errors.has("property_id"));
                assert!(errors.has("rent_amount"));
                assert!(errors.has("currency_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn occupied_unit_cannot_be_deleted() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");
        fx.tenant("wanjiru@example.com", Some(unit.id));

        assert!(matches!(service.delete(unit.id), Err(RentalError::Conflict(_))));
        service.vacate(unit.id).unwrap();
        service.delete(unit.id).unwrap();
        assert!(matches!(service.get(unit.id), Err(RentalError::NotFound { .. })));
    }

    #[test]
    fn unit_with_payments_cannot_be_deleted() {
        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", Some(unit.id));
        let (payment_type_id, payment_mode_id) = crate::services::payment::tests::lookups(&fx);

        let payments = PaymentService::new(fx.store.clone());
        let deposit = payments
            .create(PaymentInput {
                tenant_id: tenant.id,
                invoice_id: None,
                amount: dec!(50000),
                currency_id: fx.currency_id,
                payment_type_id,
                payment_mode_id,
                paid_on: None,
                reference: None,
                notes: Some("Deposit".into()),
            })
            .unwrap();
        assert_eq!(deposit.rental_unit_id, Some(unit.id));
        service.vacate(unit.id).unwrap();

        match service.delete(unit.id).unwrap_err() {
            RentalError::Conflict(message) => {
                assert!(message.contains("1 payment(s)"));
                assert!(!message.contains("invoice"));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        payments.delete(deposit.id).unwrap();
        service.delete(unit.id).unwrap();
    }

    #[test]
    fn failed_flush_leaves_unit_and_tenant_unchanged_on_disk() {
        use crate::constants::RECORD_TMP_FILENAME;
        use crate::store::Record;

        let fx = Fixture::new();
        let service = RentalUnitService::new(fx.store.clone());
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", None);

        let tenant_dir = tenant
            .id
            .sharded_dir(&fx.store.data_dir().join(Tenant::COLLECTION));
        std::fs::create_dir_all(tenant_dir.join(RECORD_TMP_FILENAME)).unwrap();

        assert!(matches!(
            service.assign_tenant(unit.id, tenant.id),
            Err(RentalError::FileWrite(_))
        ));
        assert_eq!(service.get(unit.id).unwrap().status, UnitStatus::Vacant);
        fx.assert_consistent();

        let reopened = Store::open(fx.store.data_dir()).unwrap();
        reopened
            .read(|t| {
                let unit = t.require::<RentalUnit>(&unit.id)?;
                assert_eq!(unit.status, UnitStatus::Vacant);
                assert_eq!(unit.tenant_id, None);
                assert_eq!(t.require::<Tenant>(&tenant.id)?.rental_unit_id, None);
                Ok(())
            })
            .unwrap();
    }
}
