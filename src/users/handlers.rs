// HTTP handlers for user management

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, info};
use validator::Validate;

use crate::auth::{
    models::{MessageResponse, UserResponse},
    AdminUser, AuthError, CurrentUser,
};
use crate::error::{ApiError, AppJson, AppQuery};
use crate::object_id::ObjectId;
use crate::query::{PageParams, QueryValidator};
use crate::users::models::UpdateUserRequest;
use crate::AppState;

const MAX_USER_PAGE: i64 = 100;

/// Shared update path for `/users/me` and `/users/{id}`
async fn apply_update(
    state: &AppState,
    current: &CurrentUser,
    target: &ObjectId,
    request: UpdateUserRequest,
) -> Result<(), ApiError> {
    current.require_self_or_admin(target)?;
    if !current.is_admin() && request.touches_privileged_fields() {
        return Err(AuthError::RestrictedFields.into());
    }
    request.validate()?;
    if request.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let changes = request.into_changes(current.id(), state.clock.utc());
    if !state.users.update(target, &changes).await? {
        return Err(ApiError::not_found("User", target));
    }

    info!("User {} updated by {}", target, current.id());
    Ok(())
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Profile of the caller", body = UserResponse),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Inactive user")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_me(current: CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(current.user))
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/users/me",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Profile updated", body = MessageResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 403, description = "Restricted field"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let target = current.id().clone();
    apply_update(&state, &current, &target, request).await?;
    Ok(Json(MessageResponse::new("Profile updated successfully")))
}

/// List users (admin only)
#[utoipa::path(
    get,
    path = "/users",
    params(PageParams),
    responses(
        (status = 200, description = "Users", body = Vec<UserResponse>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let page = QueryValidator::pagination(&params, MAX_USER_PAGE)?;
    let users = state.users.list(page).await?;

    debug!("Retrieved {} users", users.len());
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get a user by id (self or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Malformed id"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    current.require_self_or_admin(&id)?;

    let user = state
        .users
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &id))?;
    Ok(Json(UserResponse::from(user)))
}

/// Update a user (admin: all fields, self: name and email)
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 403, description = "Access denied or restricted field"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    apply_update(&state, &current, &id, request).await?;
    Ok(Json(MessageResponse::new("User updated successfully")))
}

/// Delete a user (admin only, never the caller)
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 400, description = "Malformed id or own account"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    if admin.id() == &id {
        return Err(ApiError::BadRequest("Cannot delete your own account".to_string()));
    }

    if !state.users.delete(&id).await? {
        return Err(ApiError::not_found("User", &id));
    }

    info!("User {} deleted by {}", id, admin.id());
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
