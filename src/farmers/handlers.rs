// HTTP handlers for farmer records

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use validator::Validate;

use crate::auth::{models::MessageResponse, AdminUser, CurrentUser};
use crate::error::{ApiError, AppJson, AppQuery};
use crate::farmers::models::{CreateFarmerRequest, Farmer, UpdateFarmerRequest};
use crate::object_id::ObjectId;
use crate::query::{PageParams, QueryValidator};
use crate::AppState;

const MAX_FARMER_PAGE: i64 = 100;

/// Handler for POST /farmers
#[utoipa::path(
    post,
    path = "/farmers",
    request_body = CreateFarmerRequest,
    responses(
        (status = 201, description = "Farmer created", body = Farmer),
        (status = 400, description = "Invalid input data")
    ),
    security(("bearer_auth" = [])),
    tag = "farmers"
)]
pub async fn create_farmer(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(payload): AppJson<CreateFarmerRequest>,
) -> Result<(StatusCode, Json<Farmer>), ApiError> {
    payload.validate()?;

    let id = state
        .farmers
        .create(payload.into_new(current.id(), state.clock.utc()))
        .await?;
    let farmer = state
        .farmers
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("farmer {} missing after insert", id)))?;

    info!("Farmer {} created by {}", id, current.id());
    Ok((StatusCode::CREATED, Json(farmer)))
}

/// Handler for GET /farmers
#[utoipa::path(
    get,
    path = "/farmers",
    params(PageParams),
    responses((status = 200, description = "Farmers", body = Vec<Farmer>)),
    security(("bearer_auth" = [])),
    tag = "farmers"
)]
pub async fn list_farmers(
    State(state): State<AppState>,
    _current: CurrentUser,
    AppQuery(params): AppQuery<PageParams>,
) -> Result<Json<Vec<Farmer>>, ApiError> {
    let page = QueryValidator::pagination(&params, MAX_FARMER_PAGE)?;
    let farmers = state.farmers.list(page).await?;

    debug!("Retrieved {} farmers", farmers.len());
    Ok(Json(farmers))
}

/// Handler for GET /farmers/{id}
#[utoipa::path(
    get,
    path = "/farmers/{id}",
    params(("id" = String, Path, description = "Farmer id")),
    responses(
        (status = 200, description = "Farmer", body = Farmer),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Farmer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "farmers"
)]
pub async fn get_farmer(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Farmer>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let farmer = state
        .farmers
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Farmer", &id))?;
    Ok(Json(farmer))
}

/// Handler for PUT /farmers/{id}
#[utoipa::path(
    put,
    path = "/farmers/{id}",
    params(("id" = String, Path, description = "Farmer id")),
    request_body = UpdateFarmerRequest,
    responses(
        (status = 200, description = "Farmer updated", body = MessageResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Farmer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "farmers"
)]
pub async fn update_farmer(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateFarmerRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    payload.validate()?;

    let changes = payload.into_changes(admin.id(), state.clock.utc());
    if !changes.has_field_changes() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }
    if !state.farmers.update(&id, &changes).await? {
        return Err(ApiError::not_found("Farmer", &id));
    }

    info!("Farmer {} updated by {}", id, admin.id());
    Ok(Json(MessageResponse::new("Farmer updated successfully")))
}

/// Handler for DELETE /farmers/{id}
#[utoipa::path(
    delete,
    path = "/farmers/{id}",
    params(("id" = String, Path, description = "Farmer id")),
    responses(
        (status = 200, description = "Farmer deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Farmer not found")
    ),
    security(("bearer_auth" = [])),
    tag = "farmers"
)]
pub async fn delete_farmer(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    if !state.farmers.delete(&id).await? {
        return Err(ApiError::not_found("Farmer", &id));
    }

    info!("Farmer {} deleted by {}", id, admin.id());
    Ok(Json(MessageResponse::new("Farmer deleted successfully")))
}
