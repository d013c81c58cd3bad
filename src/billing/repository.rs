use async_trait::async_trait;
use sqlx::PgPool;

use crate::billing::models::{Billing, BillingChanges, BillingFilter, NewBilling};
use crate::error::RepositoryError;
use crate::object_id::ObjectId;
use crate::query::{Pagination, SQLQueryBuilder};

const BILLING_COLUMNS: &str = "id, farmer_id, operator_id, drone_id, acres, time_spent, amount, mode_type, \
     created_at, created_by, updated_at, updated_by";

#[async_trait]
pub trait BillingRepository: Send + Sync {
    async fn create(&self, billing: NewBilling) -> Result<ObjectId, RepositoryError>;
    async fn get(&self, id: &ObjectId) -> Result<Option<Billing>, RepositoryError>;
    /// Matching records, newest first
    async fn list(&self, filter: &BillingFilter, page: Pagination) -> Result<Vec<Billing>, RepositoryError>;
    async fn update(&self, id: &ObjectId, changes: &BillingChanges) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError>;
}

pub struct PgBillingRepository {
    pool: PgPool,
}

impl PgBillingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a filter into a parameterized listing query
fn list_query(filter: &BillingFilter, page: Pagination) -> (String, Vec<String>) {
    let mut builder = SQLQueryBuilder::new(format!("SELECT {} FROM billing", BILLING_COLUMNS));
    if let Some(id) = &filter.farmer_id {
        builder.add_eq_filter("farmer_id", id.as_str());
    }
    if let Some(id) = &filter.operator_id {
        builder.add_eq_filter("operator_id", id.as_str());
    }
    if let Some(id) = &filter.drone_id {
        builder.add_eq_filter("drone_id", id.as_str());
    }
    builder.set_order("created_at DESC, id DESC");
    builder.set_pagination(page);
    builder.build()
}

#[async_trait]
impl BillingRepository for PgBillingRepository {
    async fn create(&self, billing: NewBilling) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        sqlx::query(
            "INSERT INTO billing (id, farmer_id, operator_id, drone_id, acres, time_spent, amount, mode_type, created_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&id)
        .bind(&billing.farmer_id)
        .bind(&billing.operator_id)
        .bind(&billing.drone_id)
        .bind(billing.acres)
        .bind(billing.time_spent)
        .bind(billing.amount)
        .bind(billing.mode_type)
        .bind(billing.created_at)
        .bind(&billing.created_by)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Billing>, RepositoryError> {
        let billing = sqlx::query_as::<_, Billing>(&format!("SELECT {} FROM billing WHERE id = $1", BILLING_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(billing)
    }

    async fn list(&self, filter: &BillingFilter, page: Pagination) -> Result<Vec<Billing>, RepositoryError> {
        let (sql, params) = list_query(filter, page);

        let mut query = sqlx::query_as::<_, Billing>(&sql);
        for param in params {
            query = query.bind(param);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn update(&self, id: &ObjectId, changes: &BillingChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE billing SET
                acres = COALESCE($2, acres),
                time_spent = COALESCE($3, time_spent),
                amount = COALESCE($4, amount),
                mode_type = COALESCE($5, mode_type),
                updated_at = COALESCE($6, updated_at),
                updated_by = COALESCE($7, updated_by)
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.acres)
        .bind(changes.time_spent)
        .bind(changes.amount)
        .bind(changes.mode_type)
        .bind(changes.updated_at)
        .bind(&changes.updated_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM billing WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_scopes_operator_and_orders_newest_first() {
        let operator = ObjectId::new();
        let filter = BillingFilter {
            operator_id: Some(operator.clone()),
            ..Default::default()
        };

        let (sql, params) = list_query(&filter, Pagination { skip: 0, limit: 50 });
        assert!(sql.contains("WHERE operator_id = $1"));
        assert!(sql.contains("ORDER BY created_at DESC, id DESC LIMIT 50 OFFSET 0"));
        assert_eq!(params, vec![operator.to_string()]);
    }

    #[test]
    fn test_list_query_combines_filters() {
        let filter = BillingFilter {
            farmer_id: Some(ObjectId::new()),
            operator_id: None,
            drone_id: Some(ObjectId::new()),
        };
        let (sql, params) = list_query(&filter, Pagination::default());
        assert!(sql.contains("WHERE farmer_id = $1 AND drone_id = $2"));
        assert_eq!(params.len(), 2);
    }
}
