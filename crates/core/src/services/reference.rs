//! Currencies, payment types and payment modes.

use crate::models::{
    Currency, CurrencyChanges, CurrencyInput, LookupChanges, LookupInput, PaymentMode,
    PaymentType,
};
use crate::pagination::{Page, PageRequest};
use crate::services::merge_text;
use crate::store::{Store, Tables};
use crate::validation::{ValidationErrors, MAX_LONG_TEXT};
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_types::{CurrencyCode, NonEmptyText};
use rentdesk_uuid::RecordId;
use std::sync::Arc;

// ============================================================================
// CURRENCIES
// ============================================================================

#[derive(Clone)]
pub struct CurrencyService {
    store: Arc<Store>,
}

struct CurrencyFields {
    code: CurrencyCode,
    name: NonEmptyText,
    symbol: Option<String>,
}

fn validate_currency(input: &CurrencyInput) -> RentalResult<CurrencyFields> {
    let mut errors = ValidationErrors::new();
    let code = errors.currency_code("code", &input.code);
    let name = errors.required_text("name", &input.name);
    let symbol = errors.optional_text("symbol", input.symbol.as_deref(), 8);

    match (code, name) {
        (Some(code), Some(name)) if errors.is_empty() => Ok(CurrencyFields { code, name, symbol }),
        _ => Err(RentalError::Validation(errors)),
    }
}

fn ensure_code_free(tables: &Tables, code: &CurrencyCode, except: Option<RecordId>) -> RentalResult<()> {
    let taken = tables
        .currencies
        .iter()
        .any(|c| &c.code == code && Some(c.id) != except);
    if taken {
        return Err(RentalError::conflict(format!(
            "a currency with code {code} already exists"
        )));
    }
    Ok(())
}

impl CurrencyService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, page: &PageRequest) -> RentalResult<Page<Currency>> {
        self.store.read(|t| {
            Ok(Page::from_ordered(
                t.currencies.ordered_where(|_| true),
                page,
            ))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Currency> {
        self.store.read(|t| t.require::<Currency>(&id).cloned())
    }

    pub fn find_by_code(&self, code: &CurrencyCode) -> RentalResult<Option<Currency>> {
        self.store
            .read(|t| Ok(t.currencies.iter().find(|c| &c.code == code).cloned()))
    }

    pub fn create(&self, input: CurrencyInput) -> RentalResult<Currency> {
        let fields = validate_currency(&input)?;
        let currency = self.store.write(|tx| {
            ensure_code_free(tx.tables(), &fields.code, None)?;
            let now = Utc::now();
            let currency = Currency {
                id: RecordId::new(),
                code: fields.code,
                name: fields.name,
                symbol: fields.symbol,
                created_at: now,
                updated_at: now,
            };
            tx.put(currency.clone())?;
            Ok(currency)
        })?;
        tracing::info!(currency = %currency.code, "currency created");
        Ok(currency)
    }

    pub fn update(&self, id: RecordId, changes: CurrencyChanges) -> RentalResult<Currency> {
        self.store.write(|tx| {
            let current = tx.require::<Currency>(&id)?.clone();
            let merged = CurrencyInput {
                code: changes.code.unwrap_or_else(|| current.code.to_string()),
                name: changes.name.unwrap_or_else(|| current.name.to_string()),
                symbol: merge_text(changes.symbol, &current.symbol),
            };
            let fields = validate_currency(&merged)?;
            ensure_code_free(tx.tables(), &fields.code, Some(id))?;

            let updated = Currency {
                code: fields.code,
                name: fields.name,
                symbol: fields.symbol,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Refused while any unit, invoice or payment is priced in this currency.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let t = tx.tables();
            let currency = t.require::<Currency>(&id)?;
            let in_use = t.rental_units.iter().any(|u| u.currency_id == id)
                || t.invoices.iter().any(|i| i.currency_id == id)
                || t.payments.iter().any(|p| p.currency_id == id);
            if in_use {
                return Err(RentalError::conflict(format!(
                    "currency {} is in use and cannot be deleted",
                    currency.code
                )));
            }
            tx.delete::<Currency>(&id)?;
            Ok(())
        })
    }
}

// ============================================================================
// PAYMENT TYPES AND MODES
// ============================================================================

struct LookupFields {
    name: NonEmptyText,
    description: Option<String>,
}

fn validate_lookup(input: &LookupInput) -> RentalResult<LookupFields> {
    let mut errors = ValidationErrors::new();
    let name = errors.required_text("name", &input.name);
    let description = errors.optional_text("description", input.description.as_deref(), MAX_LONG_TEXT);

    match name {
        Some(name) if errors.is_empty() => Ok(LookupFields { name, description }),
        _ => Err(RentalError::Validation(errors)),
    }
}

/// Payment types and payment modes share one shape: a unique name and a description.
macro_rules! lookup_service {
    ($service:ident, $record:ident, $table:ident, $label:literal, $payment_field:ident) => {
        #[derive(Clone)]
        pub struct $service {
            store: Arc<Store>,
        }

        impl $service {
            pub fn new(store: Arc<Store>) -> Self {
                Self { store }
            }

            pub fn list(&self, page: &PageRequest) -> RentalResult<Page<$record>> {
                self.store
                    .read(|t| Ok(Page::from_ordered(t.$table.ordered_where(|_| true), page)))
            }

            pub fn get(&self, id: RecordId) -> RentalResult<$record> {
                self.store.read(|t| t.require::<$record>(&id).cloned())
            }

            pub fn find_by_name(&self, name: &str) -> RentalResult<Option<$record>> {
                self.store.read(|t| {
                    Ok(t.$table.iter().find(|r| r.name.eq_ignore_case(name)).cloned())
                })
            }

            pub fn create(&self, input: LookupInput) -> RentalResult<$record> {
                let fields = validate_lookup(&input)?;
                self.store.write(|tx| {
                    Self::ensure_name_free(tx.tables(), &fields.name, None)?;
                    let now = Utc::now();
                    let record = $record {
                        id: RecordId::new(),
                        name: fields.name,
                        description: fields.description,
                        created_at: now,
                        updated_at: now,
                    };
                    tx.put(record.clone())?;
                    Ok(record)
                })
            }

            pub fn update(&self, id: RecordId, changes: LookupChanges) -> RentalResult<$record> {
                self.store.write(|tx| {
                    let current = tx.require::<$record>(&id)?.clone();
                    let merged = LookupInput {
                        name: changes.name.unwrap_or_else(|| current.name.to_string()),
                        description: merge_text(changes.description, &current.description),
                    };
                    let fields = validate_lookup(&merged)?;
                    Self::ensure_name_free(tx.tables(), &fields.name, Some(id))?;

                    let updated = $record {
                        name: fields.name,
                        description: fields.description,
                        updated_at: Utc::now(),
                        ..current
                    };
                    tx.put(updated.clone())?;
                    Ok(updated)
                })
            }

            /// Refused while any payment refers to it.
            pub fn delete(&self, id: RecordId) -> RentalResult<()> {
                self.store.write(|tx| {
                    let record = tx.require::<$record>(&id)?;
                    if tx.tables().payments.iter().any(|p| p.$payment_field == id) {
                        return Err(RentalError::conflict(format!(
                            "{} '{}' is used by recorded payments and cannot be deleted",
                            $label, record.name
                        )));
                    }
                    tx.delete::<$record>(&id)?;
                    Ok(())
                })
            }

            fn ensure_name_free(
                tables: &Tables,
                name: &NonEmptyText,
                except: Option<RecordId>,
            ) -> RentalResult<()> {
                let taken = tables
                    .$table
                    .iter()
                    .any(|r| r.name.eq_ignore_case(name.as_str()) && Some(r.id) != except);
                if taken {
                    return Err(RentalError::conflict(format!(
                        "a {} named '{}' already exists",
                        $label, name
                    )));
                }
                Ok(())
            }
        }
    };
}

lookup_service!(PaymentTypeService, PaymentType, payment_types, "payment type", payment_type_id);
lookup_service!(PaymentModeService, PaymentMode, payment_modes, "payment mode", payment_mode_id);

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, Arc<Store>) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(Store::open(temp_dir.path()).expect("open store"));
        (temp_dir, store)
    }

    fn kes() -> CurrencyInput {
        CurrencyInput {
            code: "kes".into(),
            name: "Kenyan Shilling".into(),
            symbol: Some("KSh".into()),
        }
    }

    #[test]
    fn currency_code_is_normalised_and_unique() {
        let (_dir, store) = store();
        let service = CurrencyService::new(store);

        let created = service.create(kes()).unwrap();
        assert_eq!(created.code.as_str(), "KES");

        let err = service.create(kes()).unwrap_err();
        assert!(matches!(err, RentalError::Conflict(_)));
    }

    #[test]
    fn invalid_currency_reports_every_field() {
        let (_dir, store) = store();
        let service = CurrencyService::new(store);

        let err = service
            .create(CurrencyInput {
                code: "KSHS".into(),
                name: " ".into(),
                symbol: None,
            })
            .unwrap_err();
        match err {
            RentalError::Validation(errors) => {
                assert!(errors.has("code"));
                assert!(errors.has("name"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_symbol_clears_it_on_update() {
        let (_dir, store) = store();
        let service = CurrencyService::new(store);
        let created = service.create(kes()).unwrap();

        let updated = service
            .update(
                created.id,
                CurrencyChanges {
                    symbol: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.symbol, None);
        assert_eq!(updated.name, created.name);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[test]
    fn lookup_names_are_unique_ignoring_case() {
        let (_dir, store) = store();
        let service = PaymentModeService::new(store);
        service
            .create(LookupInput {
                name: "Bank transfer".into(),
                description: None,
            })
            .unwrap();

        let err = service
            .create(LookupInput {
                name: "BANK TRANSFER".into(),
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, RentalError::Conflict(_)));
        assert!(service.find_by_name("bank transfer").unwrap().is_some());
    }

    #[test]
    fn missing_records_are_not_found() {
        let (_dir, store) = store();
        let service = PaymentTypeService::new(store);
        assert!(matches!(
            service.get(RecordId::new()),
            Err(RentalError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete(RecordId::new()),
            Err(RentalError::NotFound { .. })
        ));
    }

    #[test]
    fn referenced_currency_and_lookups_cannot_be_deleted() {
        let s = crate::services::payment::tests::setup();
        let payment = crate::services::payment::tests::pay(&s, rust_decimal_macros::dec!(1000))
            .unwrap();
        let currencies = CurrencyService::new(s.fx.store.clone());
        let types = PaymentTypeService::new(s.fx.store.clone());
        let modes = PaymentModeService::new(s.fx.store.clone());

        assert!(matches!(
            currencies.delete(s.fx.currency_id),
            Err(RentalError::Conflict(_))
        ));
        assert!(matches!(
            types.delete(s.payment_type_id),
            Err(RentalError::Conflict(_))
        ));
        assert!(matches!(
            modes.delete(s.payment_mode_id),
            Err(RentalError::Conflict(_))
        ));

        crate::services::PaymentService::new(s.fx.store.clone())
            .delete(payment.id)
            .unwrap();
        types.delete(s.payment_type_id).unwrap();
        modes.delete(s.payment_mode_id).unwrap();
        // Still pricing the unit and its invoice.
        assert!(matches!(
            currencies.delete(s.fx.currency_id),
            Err(RentalError::Conflict(_))
        ));

        let unused = currencies
            .create(CurrencyInput {
                code: "USD".into(),
                name: "US Dollar".into(),
                symbol: None,
            })
            .unwrap();
        currencies.delete(unused.id).unwrap();
    }
}
