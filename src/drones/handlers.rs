// HTTP handlers for the drone fleet

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use validator::Validate;

use crate::auth::{models::MessageResponse, AdminUser, CurrentUser};
use crate::drones::models::{CreateDroneRequest, Drone, UpdateDroneRequest};
use crate::error::{ApiError, AppJson, AppQuery};
use crate::object_id::ObjectId;
use crate::query::{PageParams, QueryValidator};
use crate::AppState;

const MAX_DRONE_PAGE: i64 = 100;

/// Handler for POST /drones (admin only)
#[utoipa::path(
    post,
    path = "/drones",
    request_body = CreateDroneRequest,
    responses(
        (status = 201, description = "Drone created", body = Drone),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Admin access required"),
        (status = 409, description = "Serial number already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "drones"
)]
pub async fn create_drone(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(payload): AppJson<CreateDroneRequest>,
) -> Result<(StatusCode, Json<Drone>), ApiError> {
    payload.validate()?;

    let id = state
        .drones
        .create(payload.into_new(admin.id(), state.clock.utc()))
        .await?;
    let drone = state
        .drones
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("drone {} missing after insert", id)))?;

    info!("Drone {} created by {}", id, admin.id());
    Ok((StatusCode::CREATED, Json(drone)))
}

/// Handler for GET /drones
#[utoipa::path(
    get,
    path = "/drones",
    params(PageParams),
    responses((status = 200, description = "Drones", body = Vec<Drone>)),
    security(("bearer_auth" = [])),
    tag = "drones"
)]
pub async fn list_drones(
    State(state): State<AppState>,
    _current: CurrentUser,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<Vec<Drone>>, ApiError> {
    let page = QueryValidator::pagination(&params, MAX_DRONE_PAGE)?;
    let drones = state.drones.list(page).await?;

    debug!("Retrieved {} drones", drones.len());
    Ok(Json(drones))
}

/// Handler for GET /drones/{id}
#[utoipa::path(
    get,
    path = "/drones/{id}",
    params(("id" = String, Path, description = "Drone id")),
    responses(
        (status = 200, description = "Drone", body = Drone),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Drone not found")
    ),
    security(("bearer_auth" = [])),
    tag = "drones"
)]
pub async fn get_drone(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Drone>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let drone = state
        .drones
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Drone", &id))?;
    Ok(Json(drone))
}

/// Handler for PUT /drones/{id} (admin only)
#[utoipa::path(
    put,
    path = "/drones/{id}",
    params(("id" = String, Path, description = "Drone id")),
    request_body = UpdateDroneRequest,
    responses(
        (status = 200, description = "Drone updated", body = MessageResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Drone not found"),
        (status = 409, description = "Serial number already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "drones"
)]
pub async fn update_drone(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateDroneRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    payload.validate()?;

    let changes = payload.into_changes(admin.id(), state.clock.utc());
    if !changes.has_field_changes() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if !state.drones.update(&id, &changes).await? {
        return Err(ApiError::not_found("Drone", &id));
    }

    info!("Drone {} updated by {}", id, admin.id());
    Ok(Json(MessageResponse::new("Drone updated successfully")))
}

/// Handler for DELETE /drones/{id} (admin only)
#[utoipa::path(
    delete,
    path = "/drones/{id}",
    params(("id" = String, Path, description = "Drone id")),
    responses(
        (status = 200, description = "Drone deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Drone not found")
    ),
    security(("bearer_auth" = [])),
    tag = "drones"
)]
pub async fn delete_drone(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    if !state.drones.delete(&id).await? {
        return Err(ApiError::not_found("Drone", &id));
    }

    info!("Drone {} deleted by {}", id, admin.id());
    Ok(Json(MessageResponse::new("Drone deleted successfully")))
}
