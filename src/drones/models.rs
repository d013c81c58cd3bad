use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::object_id::ObjectId;

/// Drone as stored in `drone_details`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Drone {
    #[schema(value_type = String, example = "65f1c0ffee00000000000003")]
    pub id: ObjectId,
    #[schema(example = "Sprayer 1")]
    pub name: String,
    #[schema(example = "Agras T40")]
    pub model: Option<String>,
    #[schema(example = "DJI-T40-0001")]
    pub serial_number: Option<String>,
    /// Billing rate per hour of spraying
    #[schema(example = 1000.0)]
    pub per_hour_rate: f64,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub created_by: Option<ObjectId>,
    pub updated_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub updated_by: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewDrone {
    pub name: String,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub per_hour_rate: f64,
    pub created_at: DateTime<Utc>,
    pub created_by: ObjectId,
}

#[derive(Debug, Clone, Default)]
pub struct DroneChanges {
    pub name: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub per_hour_rate: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<ObjectId>,
}

impl DroneChanges {
    pub fn has_field_changes(&self) -> bool {
        self.name.is_some() || self.model.is_some() || self.serial_number.is_some() || self.per_hour_rate.is_some()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDroneRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: Option<String>,
    #[schema(example = 1000.0)]
    #[validate(custom = "crate::validation::validate_positive")]
    pub per_hour_rate: f64,
}

impl CreateDroneRequest {
    pub fn into_new(self, actor: &ObjectId, now: DateTime<Utc>) -> NewDrone {
        NewDrone {
            name: self.name,
            model: self.model,
            serial_number: self.serial_number,
            per_hour_rate: self.per_hour_rate,
            created_at: now,
            created_by: actor.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateDroneRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub serial_number: Option<String>,
    #[validate(custom = "crate::validation::validate_positive")]
    pub per_hour_rate: Option<f64>,
}

impl UpdateDroneRequest {
    pub fn into_changes(self, actor: &ObjectId, now: DateTime<Utc>) -> DroneChanges {
        DroneChanges {
            name: self.name,
            model: self.model,
            serial_number: self.serial_number,
            per_hour_rate: self.per_hour_rate,
            updated_at: Some(now),
            updated_by: Some(actor.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_must_be_positive() {
        let request = CreateDroneRequest {
            name: "Sprayer 1".into(),
            model: None,
            serial_number: Some("SN-1".into()),
            per_hour_rate: 0.0,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("per_hour_rate"));
    }

    #[test]
    fn test_valid_create() {
        let request: CreateDroneRequest = serde_json::from_str(
            r#"{"name": "Sprayer 1", "model": "Agras T40", "serial_number": "SN-1", "per_hour_rate": 1200.5}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_update_validation_only_checks_present_fields() {
        assert!(UpdateDroneRequest::default().validate().is_ok());

        let request = UpdateDroneRequest {
            name: Some(String::new()),
            per_hour_rate: Some(-5.0),
            ..Default::default()
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
        assert!(errors.field_errors().contains_key("per_hour_rate"));
    }

    #[test]
    fn test_text_fields_are_capped_at_100_characters() {
        let request = CreateDroneRequest {
            name: "x".repeat(100),
            model: Some("m".repeat(101)),
            serial_number: Some(String::new()),
            per_hour_rate: 10.0,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(!fields.contains_key("name"));
        assert_eq!(fields["model"][0].code, "length");
        assert_eq!(fields["serial_number"][0].code, "length");
    }
}
