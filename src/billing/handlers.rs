// HTTP handlers for billing records

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::auth::{models::MessageResponse, AdminUser, AuthError, CurrentUser};
use crate::billing::models::{Billing, BillingFilter, BillingQuery, CreateBillingRequest, UpdateBillingRequest};
use crate::error::{ApiError, AppJson, AppQuery};
use crate::object_id::ObjectId;
use crate::query::QueryValidator;
use crate::AppState;

const MAX_BILLING_PAGE: i64 = 200;

async fn load(state: &AppState, id: &ObjectId) -> Result<Billing, ApiError> {
    state
        .billing
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Billing record", id))
}

/// Handler for POST /billing
#[utoipa::path(
    post,
    path = "/billing",
    request_body = CreateBillingRequest,
    responses(
        (status = 201, description = "Billing record created", body = Billing),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Operator mismatch")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn create_billing(
    State(state): State<AppState>,
    current: CurrentUser,
    AppJson(payload): AppJson<CreateBillingRequest>,
) -> Result<(StatusCode, Json<Billing>), ApiError> {
    payload.validate()?;

    let operator_id = payload.operator_id.clone().unwrap_or_else(|| current.id().clone());
    if !current.is_admin() && &operator_id != current.id() {
        warn!("User {} tried to bill on behalf of {}", current.id(), operator_id);
        return Err(AuthError::AccessDenied.into());
    }

    let id = state
        .billing
        .create(payload.into_new(operator_id, current.id(), state.clock.utc()))
        .await?;
    let billing = state
        .billing
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::InternalError(format!("billing {} missing after insert", id)))?;

    info!("Billing record {} created by {}", id, current.id());
    Ok((StatusCode::CREATED, Json(billing)))
}

/// Handler for GET /billing
///
/// Admins see everything and may filter by operator; everyone else only
/// ever sees their own records.
#[utoipa::path(
    get,
    path = "/billing",
    params(BillingQuery),
    responses(
        (status = 200, description = "Billing records, newest first", body = Vec<Billing>),
        (status = 400, description = "Invalid pagination or filter")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn list_billing(
    State(state): State<AppState>,
    current: CurrentUser,
    AppQuery(query): AppQuery<BillingQuery>,
) -> Result<Json<Vec<Billing>>, ApiError> {
    let page = QueryValidator::pagination(&query.page_params(), MAX_BILLING_PAGE)?;
    let filter = BillingFilter::for_caller(&query, &current)?;

    let records = state.billing.list(&filter, page).await?;
    debug!("Retrieved {} billing records for {}", records.len(), current.id());
    Ok(Json(records))
}

/// Handler for GET /billing/{id}
#[utoipa::path(
    get,
    path = "/billing/{id}",
    params(("id" = String, Path, description = "Billing record id")),
    responses(
        (status = 200, description = "Billing record", body = Billing),
        (status = 400, description = "Malformed id"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Billing record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn get_billing(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Billing>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let billing = load(&state, &id).await?;
    current.require_self_or_admin(&billing.operator_id)?;
    Ok(Json(billing))
}

/// Handler for PUT /billing/{id}
#[utoipa::path(
    put,
    path = "/billing/{id}",
    params(("id" = String, Path, description = "Billing record id")),
    request_body = UpdateBillingRequest,
    responses(
        (status = 200, description = "Billing record updated", body = MessageResponse),
        (status = 400, description = "Invalid or empty update"),
        (status = 403, description = "Access denied"),
        (status = 404, description = "Billing record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn update_billing(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateBillingRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    let existing = load(&state, &id).await?;
    current.require_self_or_admin(&existing.operator_id)?;

    payload.validate()?;
    let changes = payload.into_changes(current.id(), state.clock.utc());
    if !changes.has_field_changes() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if !state.billing.update(&id, &changes).await? {
        return Err(ApiError::not_found("Billing record", &id));
    }

    info!("Billing record {} updated by {}", id, current.id());
    Ok(Json(MessageResponse::new("Billing record updated successfully")))
}

/// Handler for DELETE /billing/{id} (admin only)
#[utoipa::path(
    delete,
    path = "/billing/{id}",
    params(("id" = String, Path, description = "Billing record id")),
    responses(
        (status = 200, description = "Billing record deleted", body = MessageResponse),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Billing record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "billing"
)]
pub async fn delete_billing(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = ObjectId::parse(&id)?;
    if !state.billing.delete(&id).await? {
        return Err(ApiError::not_found("Billing record", &id));
    }

    info!("Billing record {} deleted by {}", id, admin.id());
    Ok(Json(MessageResponse::new("Billing record deleted successfully")))
}
