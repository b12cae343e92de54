//! Roles and back-office users.

use crate::constants::MIN_PASSWORD_LEN;
use crate::models::{
    PasswordChange, Role, RoleChanges, RoleInput, User, UserChanges, UserFilter, UserInput,
    UserView,
};
use crate::pagination::{Page, PageRequest};
use crate::password::{hash_password, verify_password};
use crate::services::check_reference;
use crate::store::{Store, Tables};
use crate::validation::ValidationErrors;
use crate::{RentalError, RentalResult};
use chrono::Utc;
use rentdesk_types::{EmailAddress, NonEmptyText};
use rentdesk_uuid::RecordId;
use std::sync::Arc;

// ============================================================================
// ROLES
// ============================================================================

#[derive(Clone)]
pub struct RoleService {
    store: Arc<Store>,
}

fn valid_permission(permission: &str) -> bool {
    if permission == "*" {
        return true;
    }
    let is_word = |s: &str| {
        !s.is_empty()
            && s
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
    };
    match permission.split_once('.') {
        Some((resource, action)) => is_word(resource) && (action == "*" || is_word(action)),
        None => false,
    }
}

fn validate_role(input: &RoleInput) -> RentalResult<(NonEmptyText, Vec<String>)> {
    let mut errors = ValidationErrors::new();
    let name = errors.required_text("name", &input.name);

    let mut permissions: Vec<String> = Vec::new();
    for permission in &input.permissions {
        let permission = permission.trim();
        if !valid_permission(permission) {
            errors.add(
                "permissions",
                format!("'{permission}' is not of the form resource.action or *."),
            );
        } else if !permissions.iter().any(|p| p == permission) {
            permissions.push(permission.to_owned());
        }
    }

    match name {
        Some(name) if errors.is_empty() => Ok((name, permissions)),
        _ => Err(RentalError::Validation(errors)),
    }
}

fn ensure_role_name_free(tables: &Tables, name: &NonEmptyText, except: Option<RecordId>) -> RentalResult<()> {
    if tables
        .roles
        .iter()
        .any(|r| r.name.eq_ignore_case(name.as_str()) && Some(r.id) != except)
    {
        return Err(RentalError::conflict(format!(
            "a role named '{name}' already exists"
        )));
    }
    Ok(())
}

impl RoleService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, page: &PageRequest) -> RentalResult<Page<Role>> {
        self.store
            .read(|t| Ok(Page::from_ordered(t.roles.ordered_where(|_| true), page)))
    }

    pub fn get(&self, id: RecordId) -> RentalResult<Role> {
        self.store.read(|t| t.require::<Role>(&id).cloned())
    }

    pub fn find_by_name(&self, name: &str) -> RentalResult<Option<Role>> {
        self.store
            .read(|t| Ok(t.roles.iter().find(|r| r.name.eq_ignore_case(name)).cloned()))
    }

    pub fn create(&self, input: RoleInput) -> RentalResult<Role> {
        let (name, permissions) = validate_role(&input)?;
        self.store.write(|tx| {
            ensure_role_name_free(tx.tables(), &name, None)?;
            let now = Utc::now();
            let role = Role {
                id: RecordId::new(),
                name,
                permissions,
                created_at: now,
                updated_at: now,
            };
            tx.put(role.clone())?;
            Ok(role)
        })
    }

    pub fn update(&self, id: RecordId, changes: RoleChanges) -> RentalResult<Role> {
        self.store.write(|tx| {
            let current = tx.require::<Role>(&id)?.clone();
            let merged = RoleInput {
                name: changes.name.unwrap_or_else(|| current.name.to_string()),
                permissions: changes
                    .permissions
                    .unwrap_or_else(|| current.permissions.clone()),
            };
            let (name, permissions) = validate_role(&merged)?;
            ensure_role_name_free(tx.tables(), &name, Some(id))?;

            let updated = Role {
                name,
                permissions,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(updated)
        })
    }

    /// Refused while any user holds the role.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let role = tx.require::<Role>(&id)?;
            let holders = tx.tables().users.iter().filter(|u| u.role_id == id).count();
            if holders > 0 {
                return Err(RentalError::conflict(format!(
                    "role '{}' is assigned to {holders} user(s) and cannot be deleted",
                    role.name
                )));
            }
            tx.delete::<Role>(&id)?;
            Ok(())
        })
    }
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Clone)]
pub struct UserService {
    store: Arc<Store>,
}

struct UserFields {
    name: NonEmptyText,
    email: EmailAddress,
    role_id: RecordId,
}

fn validate_password(errors: &mut ValidationErrors, field: &str, password: &str) {
    errors.check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        field,
        format!("The {field} must be at least {MIN_PASSWORD_LEN} characters."),
    );
}

fn validate_user(
    tables: &Tables,
    errors: &mut ValidationErrors,
    name: &str,
    email: &str,
    role_id: RecordId,
) -> Option<UserFields> {
    let name = errors.required_text("name", name);
    let email = errors.email("email", email);
    let role = check_reference::<Role>(tables, errors, "role_id", role_id);

    match (name, email, role) {
        (Some(name), Some(email), Some(role)) => Some(UserFields {
            name,
            email,
            role_id: role.id,
        }),
        _ => None,
    }
}

fn ensure_email_free(tables: &Tables, email: &EmailAddress, except: Option<RecordId>) -> RentalResult<()> {
    if tables
        .users
        .iter()
        .any(|u| &u.email == email && Some(u.id) != except)
    {
        return Err(RentalError::conflict(format!(
            "a user with email {email} already exists"
        )));
    }
    Ok(())
}

impl UserService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn list(&self, filter: &UserFilter, page: &PageRequest) -> RentalResult<Page<UserView>> {
        self.store.read(|t| {
            let users = t.users.ordered_where(|u| {
                filter.role_id.map_or(true, |id| u.role_id == id)
                    && filter.active.map_or(true, |active| u.active == active)
            });
            Ok(Page::from_ordered(users, page).map(|u| UserView::from(&u)))
        })
    }

    pub fn get(&self, id: RecordId) -> RentalResult<UserView> {
        self.store
            .read(|t| t.require::<User>(&id).map(UserView::from))
    }

    pub fn create(&self, input: UserInput) -> RentalResult<UserView> {
        let mut errors = ValidationErrors::new();
        validate_password(&mut errors, "password", &input.password);

        // Hash outside the store lock.
        let password_hash = if errors.is_empty() {
            Some(hash_password(&input.password)?)
        } else {
            None
        };

        let user = self.store.write(|tx| {
            let fields = validate_user(
                tx.tables(),
                &mut errors,
                &input.name,
                &input.email,
                input.role_id,
            );
            let (fields, password_hash) = match (fields, password_hash) {
                (Some(fields), Some(hash)) if errors.is_empty() => (fields, hash),
                _ => return Err(RentalError::Validation(errors)),
            };
            ensure_email_free(tx.tables(), &fields.email, None)?;

            let now = Utc::now();
            let user = User {
                id: RecordId::new(),
                name: fields.name,
                email: fields.email,
                password_hash,
                role_id: fields.role_id,
                active: input.active,
                created_at: now,
                updated_at: now,
            };
            tx.put(user.clone())?;
            Ok(user)
        })?;

        tracing::info!(user_id = %user.id, "user created");
        Ok(UserView::from(&user))
    }

    pub fn update(&self, id: RecordId, changes: UserChanges) -> RentalResult<UserView> {
        self.store.write(|tx| {
            let current = tx.require::<User>(&id)?.clone();
            let name = changes.name.unwrap_or_else(|| current.name.to_string());
            let email = changes.email.unwrap_or_else(|| current.email.to_string());
            let role_id = changes.role_id.unwrap_or(current.role_id);
            let active = changes.active.unwrap_or(current.active);

            let mut errors = ValidationErrors::new();
            let fields = validate_user(tx.tables(), &mut errors, &name, &email, role_id);
            if !active && current.active {
                let manages = tx
                    .tables()
                    .properties
                    .iter()
                    .any(|p| p.manager_id == Some(id));
                errors.check(
                    !manages,
                    "active",
                    "A user who manages a property cannot be deactivated.",
                );
            }
            let fields = match fields {
                Some(fields) if errors.is_empty() => fields,
                _ => return Err(RentalError::Validation(errors)),
            };
            ensure_email_free(tx.tables(), &fields.email, Some(id))?;

            let updated = User {
                name: fields.name,
                email: fields.email,
                role_id: fields.role_id,
                active,
                updated_at: Utc::now(),
                ..current
            };
            tx.put(updated.clone())?;
            Ok(UserView::from(&updated))
        })
    }

    /// Replace a user's password after checking the current one.
    pub fn change_password(&self, id: RecordId, change: PasswordChange) -> RentalResult<()> {
        let current_hash = self
            .store
            .read(|t| Ok(t.require::<User>(&id)?.password_hash.clone()))?;

        let mut errors = ValidationErrors::new();
        errors.check(
            verify_password(&change.current_password, &current_hash),
            "current_password",
            "The current password is incorrect.",
        );
        validate_password(&mut errors, "new_password", &change.new_password);
        errors.finish()?;

        let new_hash = hash_password(&change.new_password)?;
        self.store.write(|tx| {
            let user = tx.require::<User>(&id)?;
            if user.password_hash != current_hash {
                return Err(RentalError::conflict(
                    "the password was changed concurrently; try again",
                ));
            }
            let updated = User {
                password_hash: new_hash,
                updated_at: Utc::now(),
                ..user.clone()
            };
            tx.put(updated)
        })?;

        tracing::info!(user_id = %id, "password changed");
        Ok(())
    }

    /// Check credentials for an active user identified by email.
    pub fn verify_credentials(&self, email: &str, password: &str) -> RentalResult<Option<UserView>> {
        let Ok(email) = EmailAddress::parse(email) else {
            return Ok(None);
        };
        let user = self
            .store
            .read(|t| Ok(t.users.iter().find(|u| u.email == email).cloned()))?;
        Ok(user
            .filter(|u| u.active && verify_password(password, &u.password_hash))
            .map(|u| UserView::from(&u)))
    }

    /// Refused while the user manages a property.
    pub fn delete(&self, id: RecordId) -> RentalResult<()> {
        self.store.write(|tx| {
            let user = tx.require::<User>(&id)?;
            if let Some(property) = tx
                .tables()
                .properties
                .iter()
                .find(|p| p.manager_id == Some(id))
            {
                return Err(RentalError::conflict(format!(
                    "user {} manages property '{}' and cannot be deleted",
                    user.email, property.name
                )));
            }
            tx.delete::<User>(&id)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Arc<Store>, Role) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(Store::open(temp_dir.path()).expect("open store"));
        let role = RoleService::new(store.clone())
            .create(RoleInput {
                name: "Manager".into(),
                permissions: vec!["properties.*".into(), "invoices.view".into()],
            })
            .unwrap();
        (temp_dir, store, role)
    }

    fn user_input(role_id: RecordId) -> UserInput {
        UserInput {
            name: "Amina Otieno".into(),
            email: "Amina@Example.com".into(),
            password: "s3cret-pass".into(),
            role_id,
            active: true,
        }
    }

    #[test]
    fn permissions_must_be_resource_actions() {
        assert!(valid_permission("*"));
        assert!(valid_permission("rental_units.update"));
        assert!(valid_permission("invoices.*"));
        assert!(!valid_permission("invoices"));
        assert!(!valid_permission("Invoices.View"));
        assert!(!valid_permission(".view"));
    }

    #[test]
    fn user_password_is_hashed_and_never_exposed() {
        let (_dir, store, role) = setup();
        let users = UserService::new(store.clone());

        let view = users.create(user_input(role.id)).unwrap();
        assert_eq!(view.email.as_str(), "amina@example.com");

        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("password_hash").is_none());

        let stored = store
            .read(|t| Ok(t.require::<User>(&view.id)?.password_hash.clone()))
            .unwrap();
        assert_ne!(stored, "s3cret-pass");
        assert!(users
            .verify_credentials("amina@example.com", "s3cret-pass")
            .unwrap()
            .is_some());
    }

    #[test]
    fn short_password_and_unknown_role_are_reported_together() {
        let (_dir, store, _role) = setup();
        let users = UserService::new(store);

        let mut input = user_input(RecordId::new());
        input.password = "short".into();
        match users.create(input).unwrap_err() {
            RentalError::Validation(errors) => {
                assert!(errors.has("password"));
                assert!(errors.has("role_id"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_email_conflicts() {
        let (_dir, store, role) = setup();
        let users = UserService::new(store);
        users.create(user_input(role.id)).unwrap();

        let mut again = user_input(role.id);
        again.email = "amina@EXAMPLE.com".into();
        assert!(matches!(users.create(again), Err(RentalError::Conflict(_))));
    }

    #[test]
    fn change_password_requires_current_password() {
        let (_dir, store, role) = setup();
        let users = UserService::new(store);
        let view = users.create(user_input(role.id)).unwrap();

        let wrong = users.change_password(
            view.id,
            PasswordChange {
                current_password: "not-it-at-all".into(),
                new_password: "another-pass".into(),
            },
        );
        assert!(matches!(wrong, Err(RentalError::Validation(_))));

        users
            .change_password(
                view.id,
                PasswordChange {
                    current_password: "s3cret-pass".into(),
                    new_password: "another-pass".into(),
                },
            )
            .unwrap();
        assert!(users
            .verify_credentials("amina@example.com", "another-pass")
            .unwrap()
            .is_some());
        assert!(users
            .verify_credentials("amina@example.com", "s3cret-pass")
            .unwrap()
            .is_none());
    }

    #[test]
    fn role_in_use_cannot_be_deleted() {
        let (_dir, store, role) = setup();
        let users = UserService::new(store.clone());
        let roles = RoleService::new(store);
        let view = users.create(user_input(role.id)).unwrap();

        assert!(matches!(roles.delete(role.id), Err(RentalError::Conflict(_))));
        users.delete(view.id).unwrap();
        roles.delete(role.id).unwrap();
    }

    #[test]
    fn list_filters_by_active_flag() {
        let (_dir, store, role) = setup();
        let users = UserService::new(store);
        let view = users.create(user_input(role.id)).unwrap();
        users
            .update(
                view.id,
                UserChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let active = users
            .list(
                &UserFilter {
                    active: Some(true),
                    ..Default::default()
                },
                &PageRequest::default(),
            )
            .unwrap();
        assert_eq!(active.meta.total, 0);
    }
}
