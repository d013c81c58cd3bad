// Authentication extractors for protected routes

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::{error::AuthError, models::User};
use crate::object_id::ObjectId;
use crate::AppState;

/// Pull the raw token out of an `Authorization: Bearer <token>` header
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    auth_header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidToken)
}

/// Authenticated, active caller
///
/// Extraction walks the access-control states in order: a missing or bad
/// token is 401, a token whose subject no longer exists is 401, and an
/// inactive account is 403. Role checks are left to the handler.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> &ObjectId {
        &self.user.id
    }

    pub fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), AuthError> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!("Admin access denied: user_id={}, role={}", self.user.id, self.user.role);
            Err(AuthError::AdminRequired)
        }
    }

    /// Allow admins, or the caller acting on something it owns
    pub fn require_self_or_admin(&self, owner: &ObjectId) -> Result<(), AuthError> {
        if self.is_admin() || &self.user.id == owner {
            Ok(())
        } else {
            warn!("Ownership check failed: user_id={}, owner={}", self.user.id, owner);
            Err(AuthError::AccessDenied)
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let endpoint = parts.uri.path().to_string();
        let token = bearer_token(parts).map_err(|err| {
            warn!("Unauthenticated request to protected endpoint: {}", endpoint);
            err
        })?;

        let user = state.auth_service.resolve_bearer(token).await?;
        debug!("Authenticated user_id={}, role={}, endpoint={}", user.id, user.role, endpoint);

        Ok(CurrentUser { user })
    }
}

/// Caller that passed `admin_required`
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        current.require_admin()?;
        Ok(AdminUser(current))
    }
}
