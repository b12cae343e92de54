//! Maintenance requests and their effect on assets and units.
//!
//! Opening a request against an asset puts the asset `under_maintenance` and remembers its
//! previous condition. A request that blocks occupancy holds its (vacant) unit
//! `under_maintenance`. Closing the request undoes both: completion marks the asset `good`,
//! cancellation restores the remembered condition, and the unit returns to `vacant` once no
//! other blocking request is open.

use crate::models::{
    Asset, AssetCondition, MaintenanceChanges, MaintenanceFilter, MaintenanceInput,
    MaintenanceRequest, MaintenanceStatus, Priority, RentalUnit, StatusChange, UnitStatus,
};
use crate::pagination::{Page, PageRequest};
use crate::services::unit::has_blocking_request;
use crate::services::{check_reference, today};
use crate::store::{Store, Transaction};
use crate::validation::{ValidationErrors, MAX_LONG_TEXT};
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_types::NonEmptyText;
use rentdesk_uuid::RecordId;
use std::sync::Arc;

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<Store>,
}

fn long_text(errors: &mut ValidationErrors, field: &str, value: &str) -> Option<NonEmptyText> {
    errors.max_len(field, value.trim(), MAX_LONG_TEXT);
    match NonEmptyText::new(value) {
        Ok(text) => Some(text),
        Err(_) => {
            errors.add(field, format!("The {field} field is required."));
            None
        }
    }
}

fn ensure_open(request: &MaintenanceRequest) -> RentalResult<()> {
    if request.status.is_open() {
        Ok(())
    } else {
        Err(RentalError::conflict(format!(
            "maintenance request '{}' is closed",
            request.title
        )))
    }
}

impl MaintenanceService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(
        &self,
        filter: &MaintenanceFilter,
        page: &PageRequest,
    ) -> RentalResult<Page<MaintenanceRequest>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.maintenance_requests.ordered_where(|m| filter.matches(m)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<MaintenanceRequest> {
        self.store
            .read(|t| t.require::<MaintenanceRequest>(&id).cloned())
    }

    /// Open a request, taking its asset and (if it blocks occupancy) its unit out of service.
    pub fn create(&self, input: MaintenanceInput) -> RentalResult<MaintenanceRequest> {
        let request = self.store.write(|tx| {
            let t = tx.tables();
            let mut errors = ValidationErrors::new();
            let title = errors.required_text("title", &input.title);
            let description = long_text(&mut errors, "description", &input.description);
            let reported_on = input.reported_on.unwrap_or_else(today);
            errors.check(
                reported_on <= today(),
                "reported_on",
                "The reported_on must be a date before or equal to today.",
            );

            let unit = check_reference::<RentalUnit>(t, &mut errors, "rental_unit_id", input.rental_unit_id);
            let asset = match input.asset_id {
                Some(asset_id) => check_reference::<Asset>(t, &mut errors, "asset_id", asset_id),
                None => None,
            };
            if let Some(unit) = &unit {
                if let Some(asset) = &asset {
                    let belongs = asset.property_id == unit.property_id
                        && asset.rental_unit_id.map_or(true, |id| id == unit.id);
                    errors.check(
                        belongs,
                        "asset_id",
                        "The selected asset_id does not belong to the rental unit.",
                    );
                    errors.check(
                        asset.condition != AssetCondition::Retired,
                        "asset_id",
                        "The selected asset_id is retired.",
                    );
                }
                if let Some(tenant_id) = input.tenant_id {
                    errors.check(
                        unit.tenant_id == Some(tenant_id),
                        "tenant_id",
                        "The selected tenant_id is not the unit's current tenant.",
                    );
                }
            }

            let (unit, title, description) = match (unit, title, description) {
                (Some(unit), Some(title), Some(description)) if errors.is_empty() => {
                    (unit, title, description)
                }
                _ => return Err(RentalError::Validation(errors)),
            };

            if let Some(asset) = &asset {
                let busy = t
                    .maintenance_requests
                    .iter()
                    .any(|m| m.asset_id == Some(asset.id) && m.status.is_open());
                if busy {
                    return Err(RentalError::conflict(format!(
                        "asset '{}' already has an open maintenance request",
                        asset.name
                    )));
                }
            }
            if input.blocks_occupancy && unit.is_occupied() {
                return Err(RentalError::conflict(format!(
                    "unit {} is occupied; vacate it before blocking occupancy",
                    unit.unit_number
                )));
            }

            let now = Utc::now();
            let request = MaintenanceRequest {
                id: RecordId::new(),
                rental_unit_id: unit.id,
                asset_id: input.asset_id,
                tenant_id: input.tenant_id,
                title,
                description,
                priority: input.priority.unwrap_or(Priority::Medium),
                status: MaintenanceStatus::Open,
                blocks_occupancy: input.blocks_occupancy,
                cost: None,
                asset_prior_condition: asset.as_ref().map(|a| a.condition),
                reported_on,
                resolved_at: None,
                created_at: now,
                updated_at: now,
            };

            if let Some(asset) = asset {
                tx.put(Asset {
                    condition: AssetCondition::UnderMaintenance,
                    updated_at: now,
                    ..asset
                })?;
            }
            if input.blocks_occupancy && unit.status != UnitStatus::UnderMaintenance {
                tx.put(RentalUnit {
                    status: UnitStatus::UnderMaintenance,
                    updated_at: now,
                    ..unit
                })?;
            }
            tx.put(request.clone())?;
            Ok(request)
        })?;
        tracing::info!(
            maintenance_request_id = %request.id,
            rental_unit_id = %request.rental_unit_id,
            priority = ?request.priority,
            "maintenance request opened"
        );
        Ok(request)
    }

    /// Edit an open request's description, priority or cost.
    pub fn update(&self, id: RecordId, changes: MaintenanceChanges) -> RentalResult<MaintenanceRequest> {
        self.store.write(|tx| {
            let current = tx.require::<MaintenanceRequest>(&id)?.clone();
            ensure_open(&current)?;

            let mut errors = ValidationErrors::new();
            let title = match &changes.title {
                Some(title) => errors.required_text("title", title),
                None => Some(current.title.clone()),
            };
            let description = match &changes.description {
                Some(description) => long_text(&mut errors, "description", description),
                None => Some(current.description.clone()),
            };
            let cost = match changes.cost {
                Some(cost) => errors.non_negative_amount("cost", cost),
                None => current.cost,
            };
            let (title, description) = match (title, description) {
                (Some(title), Some(description)) if errors.is_empty() => (title, description),
                _ => return Err(RentalError::Validation(errors)),
            };

            let updated = MaintenanceRequest {
                title,
                description,
                priority: changes.priority.unwrap_or(current.priority),
                cost,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Move a request through its workflow, releasing its asset and unit when it closes.
    pub fn change_status(&self, id: RecordId, change: StatusChange) -> RentalResult<MaintenanceRequest> {
        let request = self.store.write(|tx| {
            let current = tx.require::<MaintenanceRequest>(&id)?.clone();
            if !current.status.can_transition_to(change.status) {
                return Err(RentalError::conflict(format!(
                    "maintenance request cannot move from {:?} to {:?}",
                    current.status, change.status
                )));
            }

            let mut errors = ValidationErrors::new();
            let cost = match change.cost {
                Some(cost) => errors.non_negative_amount("cost", cost),
                None => current.cost,
            };
            errors.finish()?;

            let now = Utc::now();
            let updated = MaintenanceRequest {
                status: change.status,
                cost,
                resolved_at: match change.status {
                    MaintenanceStatus::Completed => Some(now),
                    _ => current.resolved_at,
                },
                updated_at: now,
                ..current
            };
            tx.put(updated.clone())?;

            if !updated.status.is_open() {
                release(tx, &updated)?;
            }
            Ok(updated)
        })?;
        tracing::info!(
            maintenance_request_id = %id,
            status = ?request.status,
            "maintenance request status changed"
        );
        Ok(request)
    }

    /// Only closed requests can be deleted.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let request = tx.require::<MaintenanceRequest>(&id)?;
            if request.status.is_open() {
                return Err(RentalError::conflict(format!(
                    "maintenance request '{}' is still open; complete or cancel it first",
                    request.title
                )));
            }
            tx.delete::<MaintenanceRequest>(&id)?;
            Ok(())
        })
    }
}

/// Return the asset and unit held by a request that has just closed.
fn release(tx: &mut Transaction<'_>, request: &MaintenanceRequest) -> RentalResult<()> {
    let now = Utc::now();

    if let Some(asset_id) = request.asset_id {
        if let Some(asset) = tx.get::<Asset>(&asset_id).cloned() {
            if asset.condition == AssetCondition::UnderMaintenance {
                let condition = match request.status {
                    MaintenanceStatus::Completed => AssetCondition::Good,
                    _ => request
                        .asset_prior_condition
                        .filter(|c| *c != AssetCondition::UnderMaintenance)
                        .unwrap_or(AssetCondition::Good),
                };
                tx.put(Asset {
                    condition,
                    updated_at: now,
                    ..asset
                })?;
            }
        }
    }

    if request.blocks_occupancy {
        if let Some(unit) = tx.get::<RentalUnit>(&request.rental_unit_id).cloned() {
            let still_blocked = has_blocking_request(tx.tables(), unit.id, Some(request.id));
            if unit.status == UnitStatus::UnderMaintenance && !still_blocked {
                tx.put(RentalUnit {
                    status: UnitStatus::Vacant,
                    updated_at: now,
                    ..unit
                })?;
            }
        }
    }
    Ok(())
}
