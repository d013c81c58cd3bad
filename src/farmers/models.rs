use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::object_id::ObjectId;

/// Farmer as stored and returned
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Farmer {
    #[schema(value_type = String, example = "65f1c0ffee00000000000002")]
    pub id: ObjectId,
    #[schema(example = "Ramesh Patil")]
    pub name: String,
    #[schema(example = "+919876543210")]
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub created_by: Option<ObjectId>,
    pub updated_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub updated_by: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewFarmer {
    pub name: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: ObjectId,
}

#[derive(Debug, Clone, Default)]
pub struct FarmerChanges {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<ObjectId>,
}

impl FarmerChanges {
    pub fn has_field_changes(&self) -> bool {
        self.name.is_some() || self.phone_number.is_some()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFarmerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[validate(custom = "crate::validation::validate_phone")]
    pub phone_number: Option<String>,
}

impl CreateFarmerRequest {
    pub fn into_new(self, actor: &ObjectId, now: DateTime<Utc>) -> NewFarmer {
        NewFarmer {
            name: self.name,
            phone_number: self.phone_number,
            created_at: now,
            created_by: actor.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateFarmerRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    #[validate(custom = "crate::validation::validate_phone")]
    pub phone_number: Option<String>,
}

impl UpdateFarmerRequest {
    pub fn into_changes(self, actor: &ObjectId, now: DateTime<Utc>) -> FarmerChanges {
        FarmerChanges {
            name: self.name,
            phone_number: self.phone_number,
            updated_at: Some(now),
            updated_by: Some(actor.clone()),
        }
    }
}
