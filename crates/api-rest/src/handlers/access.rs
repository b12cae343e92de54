//! Roles and back-office users.

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;
use api_shared::ErrorBody;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use rentdesk_core::models::{
    PasswordChange, Role, RoleChanges, RoleInput, UserChanges, UserFilter, UserInput, UserView,
};
use rentdesk_core::pagination::{RolePage, UserPage};
use rentdesk_core::services::{RoleService, UserService};
use rentdesk_core::{Page, PageRequest, RecordId};

pub(crate) fn roles() -> Router<AppState> {
    Router::new()
        .route("/", get(list_roles).post(create_role))
        .route(
            "/:id",
            get(get_role)
                .put(update_role)
                .patch(update_role)
                .delete(delete_role),
        )
}

pub(crate) fn users() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/:id",
            get(get_user)
                .put(update_user)
                .patch(update_user)
                .delete(delete_user),
        )
        .route("/:id/password", post(change_password))
}

// ============================================================================
// ROLES
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/roles",
    tag = "access",
    params(PageRequest),
    responses((status = 200, description = "Roles", body = RolePage))
)]
#[axum::debug_handler]
pub(crate) async fn list_roles(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
) -> ApiResult<Json<Page<Role>>> {
    Ok(Json(RoleService::new(state.store).list(&page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/roles",
    tag = "access",
    request_body = RoleInput,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Name already in use", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn create_role(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RoleInput>,
) -> ApiResult<(StatusCode, Json<Role>)> {
    let role = RoleService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    get,
    path = "/api/v1/roles/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = Role),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<Role>> {
    Ok(Json(RoleService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/roles/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "Role id")),
    request_body = RoleChanges,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<RoleChanges>,
) -> ApiResult<Json<Role>> {
    Ok(Json(RoleService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/roles/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Role still assigned to users", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_role(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    RoleService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// USERS
// ============================================================================

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "access",
    params(PageRequest, UserFilter),
    responses((status = 200, description = "Users, without credentials", body = UserPage))
)]
#[axum::debug_handler]
pub(crate) async fn list_users(
    State(state): State<AppState>,
    ApiQuery(page): ApiQuery<PageRequest>,
    ApiQuery(filter): ApiQuery<UserFilter>,
) -> ApiResult<Json<Page<UserView>>> {
    Ok(Json(UserService::new(state.store).list(&filter, &page)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "access",
    request_body = UserInput,
    responses(
        (status = 201, description = "User created", body = UserView),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 409, description = "Email already in use", body = ErrorBody)
    )
)]
/// Create a user. The password is hashed with Argon2 and never returned.
#[axum::debug_handler]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserInput>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let user = UserService::new(state.store).create(input)?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserView),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn get_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(UserService::new(state.store).get(id)?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "User id")),
    request_body = UserChanges,
    responses(
        (status = 200, description = "User updated", body = UserView),
        (status = 400, description = "Invalid payload", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "Email in use, or user still manages a property", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(changes): ApiJson<UserChanges>,
) -> ApiResult<Json<UserView>> {
    Ok(Json(UserService::new(state.store).update(id, changes)?))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/password",
    tag = "access",
    params(("id" = RecordId, Path, description = "User id")),
    request_body = PasswordChange,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or weak new password", body = ErrorBody),
        (status = 404, description = "Not found", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn change_password(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
    ApiJson(change): ApiJson<PasswordChange>,
) -> ApiResult<StatusCode> {
    UserService::new(state.store).change_password(id, change)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "access",
    params(("id" = RecordId, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = ErrorBody),
        (status = 409, description = "User still manages a property", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub(crate) async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<RecordId>,
) -> ApiResult<StatusCode> {
    UserService::new(state.store).delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
