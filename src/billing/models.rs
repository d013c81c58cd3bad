use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::object_id::{InvalidObjectId, ObjectId};
use crate::query::{PageParams, QueryValidator};

/// How a billing record was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
}

/// One spraying job billed to a farmer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Billing {
    #[schema(value_type = String, example = "65f1c0ffee00000000000004")]
    pub id: ObjectId,
    #[schema(value_type = String)]
    pub farmer_id: ObjectId,
    #[schema(value_type = String)]
    pub operator_id: ObjectId,
    #[schema(value_type = String)]
    pub drone_id: ObjectId,
    #[schema(example = 10.0)]
    pub acres: f64,
    /// Hours spent spraying
    #[serde(rename = "time")]
    #[schema(example = 2.0)]
    pub time_spent: f64,
    #[schema(example = 2000.0)]
    pub amount: f64,
    pub mode_type: PaymentMode,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub created_by: Option<ObjectId>,
    pub updated_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>)]
    pub updated_by: Option<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct NewBilling {
    pub farmer_id: ObjectId,
    pub operator_id: ObjectId,
    pub drone_id: ObjectId,
    pub acres: f64,
    pub time_spent: f64,
    pub amount: f64,
    pub mode_type: PaymentMode,
    pub created_at: DateTime<Utc>,
    pub created_by: ObjectId,
}

#[derive(Debug, Clone, Default)]
pub struct BillingChanges {
    pub acres: Option<f64>,
    pub time_spent: Option<f64>,
    pub amount: Option<f64>,
    pub mode_type: Option<PaymentMode>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<ObjectId>,
}

impl BillingChanges {
    pub fn has_field_changes(&self) -> bool {
        self.acres.is_some() || self.time_spent.is_some() || self.amount.is_some() || self.mode_type.is_some()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBillingRequest {
    #[schema(value_type = String)]
    pub farmer_id: ObjectId,
    /// Defaults to the caller
    #[schema(value_type = Option<String>)]
    pub operator_id: Option<ObjectId>,
    #[schema(value_type = String)]
    pub drone_id: ObjectId,
    #[validate(custom = "crate::validation::validate_positive")]
    pub acres: f64,
    /// Hours spent spraying
    #[validate(custom = "crate::validation::validate_positive")]
    pub time: f64,
    #[validate(custom = "crate::validation::validate_positive")]
    pub amount: f64,
    pub mode_type: PaymentMode,
}

impl CreateBillingRequest {
    pub fn into_new(self, operator_id: ObjectId, actor: &ObjectId, now: DateTime<Utc>) -> NewBilling {
        NewBilling {
            farmer_id: self.farmer_id,
            operator_id,
            drone_id: self.drone_id,
            acres: self.acres,
            time_spent: self.time,
            amount: self.amount,
            mode_type: self.mode_type,
            created_at: now,
            created_by: actor.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBillingRequest {
    #[validate(custom = "crate::validation::validate_positive")]
    pub acres: Option<f64>,
    #[validate(custom = "crate::validation::validate_positive")]
    pub time: Option<f64>,
    #[validate(custom = "crate::validation::validate_positive")]
    pub amount: Option<f64>,
    pub mode_type: Option<PaymentMode>,
}

impl UpdateBillingRequest {
    pub fn into_changes(self, actor: &ObjectId, now: DateTime<Utc>) -> BillingChanges {
        BillingChanges {
            acres: self.acres,
            time_spent: self.time,
            amount: self.amount,
            mode_type: self.mode_type,
            updated_at: Some(now),
            updated_by: Some(actor.clone()),
        }
    }
}

/// Query string for GET /billing
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BillingQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub farmer_id: Option<String>,
    /// Honoured for admins only
    pub operator_id: Option<String>,
    pub drone_id: Option<String>,
}

impl BillingQuery {
    pub fn page_params(&self) -> PageParams {
        PageParams {
            skip: self.skip,
            limit: self.limit,
        }
    }
}

/// Equality filters applied to a billing listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillingFilter {
    pub farmer_id: Option<ObjectId>,
    pub operator_id: Option<ObjectId>,
    pub drone_id: Option<ObjectId>,
}

fn parse_filter_id(value: Option<String>) -> Result<Option<ObjectId>, InvalidObjectId> {
    QueryValidator::normalize_string(value)
        .map(|id| ObjectId::parse(&id))
        .transpose()
}

impl BillingFilter {
    /// Build the effective filter for `caller`
    ///
    /// Non-admins are always pinned to their own operator id whatever they
    /// asked for.
    pub fn for_caller(query: &BillingQuery, caller: &CurrentUser) -> Result<Self, InvalidObjectId> {
        let requested_operator = parse_filter_id(query.operator_id.clone())?;
        let operator_id = if caller.is_admin() {
            requested_operator
        } else {
            Some(caller.id().clone())
        };

        Ok(Self {
            farmer_id: parse_filter_id(query.farmer_id.clone())?,
            operator_id,
            drone_id: parse_filter_id(query.drone_id.clone())?,
        })
    }
}
