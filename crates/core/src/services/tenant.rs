use crate::models::{RentalUnit, Tenant, TenantChanges, TenantFilter, TenantInput, TenantStatus};
use crate::pagination::{Page, PageRequest};
use crate::services::unit::{assign_in_tx, vacate_in_tx};
use crate::services::{check_reference, merge_text};
use crate::store::{Store, Tables};
use crate::validation::{ValidationErrors, MAX_SHORT_TEXT};
use crate::{RentalError, RentalResult};
use chrono::{NaiveDate, Utc};
use rentdesk_types::{EmailAddress, NonEmptyText};
use rentdesk_uuid::RecordId;
use rust_decimal::Decimal;
use std::sync::Arc;

const MAX_PHONE_LEN: usize = 32;

#[derive(Clone)]
pub struct TenantService {
    store: Arc<Store>,
}

struct TenantFields {
    first_name: NonEmptyText,
    last_name: NonEmptyText,
    email: EmailAddress,
    phone: NonEmptyText,
    national_id: Option<String>,
    lease_start: Option<NaiveDate>,
    lease_end: Option<NaiveDate>,
    deposit: Option<Decimal>,
}

fn validate_tenant(input: &TenantInput, errors: &mut ValidationErrors) -> Option<TenantFields> {
    let first_name = errors.required_text("first_name", &input.first_name);
    let last_name = errors.required_text("last_name", &input.last_name);
    let email = errors.email("email", &input.email);
    let phone = errors.required_text("phone", &input.phone);
    errors.max_len("phone", input.phone.trim(), MAX_PHONE_LEN);
    let national_id = errors.optional_text("national_id", input.national_id.as_deref(), MAX_SHORT_TEXT);
    errors.date_order("lease_start", input.lease_start, "lease_end", input.lease_end);
    let deposit = match input.deposit {
        Some(deposit) => errors.non_negative_amount("deposit", deposit),
        None => None,
    };

    match (first_name, last_name, email, phone) {
        (Some(first_name), Some(last_name), Some(email), Some(phone)) => Some(TenantFields {
            first_name,
            last_name,
            email,
            phone,
            national_id,
            lease_start: input.lease_start,
            lease_end: input.lease_end,
            deposit,
        }),
        _ => None,
    }
}

fn ensure_email_free(tables: &Tables, email: &EmailAddress, except: Option<RecordId>) -> RentalResult<()> {
    if tables
        .tenants
        .iter()
        .any(|t| &t.email == email && Some(t.id) != except)
    {
        return Err(RentalError::conflict(format!(
            "a tenant with email {email} already exists"
        )));
    }
    Ok(())
}

impl TenantService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &TenantFilter, page: &PageRequest) -> RentalResult<Page<Tenant>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.tenants.ordered_where(|tenant| filter.matches(tenant)),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Tenant> {
        self.store.read(|t| t.require::<Tenant>(&id).cloned())
    }

    /// Create a tenant, moving them into `rental_unit_id` when one is given.
    pub fn create(&self, input: TenantInput) -> RentalResult<Tenant> {
        let tenant = self.store.write(|tx| {
            let mut errors = ValidationErrors::new();
            let fields = validate_tenant(&input, &mut errors);
            if let Some(unit_id) = input.rental_unit_id {
                check_reference::<RentalUnit>(tx.tables(), &mut errors, "rental_unit_id", unit_id);
            }
            let fields = match fields {
                Some(fields) if errors.is_empty() => fields,
                _ => return Err(RentalError::Validation(errors)),
            };
            ensure_email_free(tx.tables(), &fields.email, None)?;

            let now = Utc::now();
            let tenant = Tenant {
                id: RecordId::new(),
                first_name: fields.first_name,
                last_name: fields.last_name,
                email: fields.email,
                phone: fields.phone,
                national_id: fields.national_id,
                rental_unit_id: None,
                lease_start: fields.lease_start,
                lease_end: fields.lease_end,
                deposit: fields.deposit,
                status: TenantStatus::Active,
                created_at: now,
                updated_at: now,
            };
            tx.put(tenant.clone())?;

            match input.rental_unit_id {
                Some(unit_id) => {
                    assign_in_tx(tx, unit_id, tenant.id)?;
                    tx.require::<Tenant>(&tenant.id).cloned()
                }
                None => Ok(tenant),
            }
        })?;
        tracing::info!(tenant_id = %tenant.id, "tenant created");
        Ok(tenant)
    }

    /// Update contact and lease details. Setting `status` to `former` moves the tenant out.
    pub fn update(&self, id: RecordId, changes: TenantChanges) -> RentalResult<Tenant> {
        self.store.write(|tx| {
            let current = tx.require::<Tenant>(&id)?.clone();
            let merged = TenantInput {
                first_name: changes
                    .first_name
                    .unwrap_or_else(|| current.first_name.to_string()),
                last_name: changes
                    .last_name
                    .unwrap_or_else(|| current.last_name.to_string()),
                email: changes.email.unwrap_or_else(|| current.email.to_string()),
                phone: changes.phone.unwrap_or_else(|| current.phone.to_string()),
                national_id: merge_text(changes.national_id, &current.national_id),
                rental_unit_id: None,
                lease_start: changes.lease_start.unwrap_or(current.lease_start),
                lease_end: changes.lease_end.unwrap_or(current.lease_end),
                deposit: changes.deposit.unwrap_or(current.deposit),
            };
            let mut errors = ValidationErrors::new();
            let fields = match validate_tenant(&merged, &mut errors) {
                Some(fields) if errors.is_empty() => fields,
                _ => return Err(RentalError::Validation(errors)),
            };
            ensure_email_free(tx.tables(), &fields.email, Some(id))?;

            let status = changes.status.unwrap_or(current.status);
            let mut rental_unit_id = current.rental_unit_id;
            if status == TenantStatus::Former {
                if let Some(unit_id) = rental_unit_id.take() {
                    vacate_in_tx(tx, unit_id)?;
                    tracing::info!(tenant_id = %id, rental_unit_id = %unit_id, "former tenant moved out");
                }
            }

            let updated = Tenant {
                first_name: fields.first_name,
                last_name: fields.last_name,
                email: fields.email,
                phone: fields.phone,
                national_id: fields.national_id,
                rental_unit_id,
                lease_start: fields.lease_start,
                lease_end: fields.lease_end,
                deposit: fields.deposit,
                status,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Refused while the tenant owes money on any invoice. Otherwise the tenant's unit is
    /// vacated and the tenant removed.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let tenant = tx.require::<Tenant>(&id)?.clone();
            let owing = tx
                .tables()
                .invoices
                .iter()
                .filter(|i| i.tenant_id == id && !i.outstanding().is_zero())
                .count();
            if owing > 0 {
                return Err(RentalError::conflict(format!(
                    "{} has {owing} invoice(s) with an outstanding balance",
                    tenant.full_name()
                )));
            }

            if let Some(unit_id) = tenant.rental_unit_id {
                vacate_in_tx(tx, unit_id)?;
            }
            tx.delete::<Tenant>(&id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitStatus;
    use crate::services::unit::tests::Fixture;
    use crate::services::RentalUnitService;

    fn input(email: &str) -> TenantInput {
        TenantInput {
            first_name: "Wanjiru".into(),
            last_name: "Mwangi".into(),
            email: email.into(),
            phone: "+254700000001".into(),
            national_id: None,
            rental_unit_id: None,
            lease_start: None,
            lease_end: None,
            deposit: None,
        }
    }

    #[test]
    fn create_with_unit_assigns_it() {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        let service = TenantService::new(fx.store.clone());

        let mut with_unit = input("wanjiru@example.com");
        with_unit.rental_unit_id = Some(unit.id);
        let tenant = service.create(with_unit).unwrap();

        assert_eq!(tenant.rental_unit_id, Some(unit.id));
        let unit = RentalUnitService::new(fx.store.clone()).get(unit.id).unwrap();
        assert_eq!(unit.status, UnitStatus::Occupied);
        fx.assert_consistent();
    }

    #[test]
    fn failed_assignment_does_not_create_tenant() {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        fx.tenant("first@example.com", Some(unit.id));
        let service = TenantService::new(fx.store.clone());

        let mut second = input("second@example.com");
        second.rental_unit_id = Some(unit.id);
        assert!(matches!(service.create(second), Err(RentalError::Conflict(_))));

        let all = service
            .list(&TenantFilter::default(), &PageRequest::default())
            .unwrap();
        assert_eq!(all.meta.total, 1);
        fx.assert_consistent();
    }

    #[test]
    fn lease_end_must_not_precede_start() {
        let fx = Fixture::new();
        let service = TenantService::new(fx.store.clone());

        let mut bad = input("wanjiru@example.com");
        bad.lease_start = NaiveDate::from_ymd_opt(2025, 6, 1);
        bad.lease_end = NaiveDate::from_ymd_opt(2025, 5, 31);
        match service.create(bad).unwrap_err() {
            RentalError::Validation(errors) => assert!(errors.has("lease_end")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn explicit_null_clears_lease_terms() {
        let fx = Fixture::new();
        let service = TenantService::new(fx.store.clone());

        let mut leased = input("wanjiru@example.com");
        leased.lease_start = NaiveDate::from_ymd_opt(2025, 1, 1);
        leased.lease_end = NaiveDate::from_ymd_opt(2025, 12, 31);
        leased.deposit = Some(rust_decimal_macros::dec!(50000));
        let tenant = service.create(leased).unwrap();

        let untouched: TenantChanges =
            serde_json::from_value(serde_json::json!({"phone": "+254700000002"})).unwrap();
        assert_eq!(untouched.lease_end, None);
        let kept = service.update(tenant.id, untouched).unwrap();
        assert_eq!(kept.lease_end, tenant.lease_end);
        assert_eq!(kept.deposit, tenant.deposit);

        let clearing: TenantChanges =
            serde_json::from_value(serde_json::json!({"lease_end": null, "deposit": null}))
                .unwrap();
        assert_eq!(clearing.lease_end, Some(None));
        let cleared = service.update(tenant.id, clearing).unwrap();
        assert_eq!(cleared.lease_end, None);
        assert_eq!(cleared.deposit, None);
        assert_eq!(cleared.lease_start, tenant.lease_start);
    }

    #[test]
    fn becoming_former_vacates_the_unit() {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", Some(unit.id));
        let service = TenantService::new(fx.store.clone());

        let former = service
            .update(
                tenant.id,
                TenantChanges {
                    status: Some(TenantStatus::Former),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(former.rental_unit_id, None);
        let unit = RentalUnitService::new(fx.store.clone()).get(unit.id).unwrap();
        assert_eq!(unit.status, UnitStatus::Vacant);
        fx.assert_consistent();

        assert!(matches!(
            RentalUnitService::new(fx.store.clone()).assign_tenant(unit.id, tenant.id),
            Err(RentalError::Conflict(_))
        ));
    }

    #[test]
    fn search_matches_name_or_email() {
        let fx = Fixture::new();
        let service = TenantService::new(fx.store.clone());
        service.create(input("wanjiru@example.com")).unwrap();
        let mut other = input("otieno@example.org");
        other.first_name = "Brian".into();
        other.last_name = "Otieno".into();
        service.create(other).unwrap();

        let by_name = TenantFilter {
            q: Some("brian ot".into()),
            ..Default::default()
        };
        assert_eq!(service.list(&by_name, &PageRequest::default()).unwrap().meta.total, 1);

        let by_email = TenantFilter {
            q: Some("example.com".into()),
            ..Default::default()
        };
        let page = service.list(&by_email, &PageRequest::default()).unwrap();
        assert_eq!(page.data[0].email.as_str(), "wanjiru@example.com");
    }

    #[test]
    fn delete_vacates_unit() {
        let fx = Fixture::new();
        let unit = fx.unit("A1");
        let tenant = fx.tenant("wanjiru@example.com", Some(unit.id));
        let service = TenantService::new(fx.store.clone());

        service.delete(tenant.id).unwrap();
        let unit = RentalUnitService::new(fx.store.clone()).get(unit.id).unwrap();
        assert_eq!(unit.status, UnitStatus::Vacant);
        assert_eq!(unit.tenant_id, None);
    }

    #[test]
    fn tenant_owing_rent_cannot_be_deleted() {
        let s = crate::services::payment::tests::setup();
        let service = TenantService::new(s.fx.store.clone());

        match service.delete(s.tenant.id).unwrap_err() {
            RentalError::Conflict(message) => assert!(message.contains("outstanding balance")),
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(service.get(s.tenant.id).is_ok());

        crate::services::payment::tests::pay(&s, s.invoice.amount).unwrap();
        service.delete(s.tenant.id).unwrap();
        let unit = RentalUnitService::new(s.fx.store.clone())
            .get(s.invoice.rental_unit_id)
            .unwrap();
        assert_eq!(unit.status, UnitStatus::Vacant);
        assert_eq!(unit.tenant_id, None);
    }
}
