// Role reference data

use async_trait::async_trait;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::error::{ApiError, RepositoryError};
use crate::AppState;

/// Row of the `roles` table
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RoleRecord {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "admin")]
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<RoleRecord>, RepositoryError>;
}

pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn list(&self) -> Result<Vec<RoleRecord>, RepositoryError> {
        let roles = sqlx::query_as::<_, RoleRecord>("SELECT id, name, created_at FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }
}

/// Handler for GET /roles
#[utoipa::path(
    get,
    path = "/roles",
    responses(
        (status = 200, description = "All roles", body = Vec<RoleRecord>),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> Result<Json<Vec<RoleRecord>>, ApiError> {
    let roles = state.roles.list().await?;
    Ok(Json(roles))
}
