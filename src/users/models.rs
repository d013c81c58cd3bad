use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::models::{Role, UserChanges};
use crate::object_id::ObjectId;

/// Partial user update; absent fields are left untouched
///
/// `role_id` and `is_active` are admin-only.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    #[schema(value_type = Option<i32>, example = 2)]
    pub role_id: Option<Role>,
    pub is_active: Option<bool>,
}

impl UpdateUserRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role_id.is_none() && self.is_active.is_none()
    }

    pub fn touches_privileged_fields(&self) -> bool {
        self.role_id.is_some() || self.is_active.is_some()
    }

    /// Convert into a change set stamped with the acting user
    pub fn into_changes(self, actor: &ObjectId, now: DateTime<Utc>) -> UserChanges {
        UserChanges {
            name: self.name,
            email: self.email,
            role: self.role_id,
            is_active: self.is_active,
            updated_at: Some(now),
            updated_by: Some(actor.clone()),
        }
    }
}
