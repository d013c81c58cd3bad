use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::RepositoryError;
use crate::farmers::models::{Farmer, FarmerChanges, NewFarmer};
use crate::object_id::ObjectId;
use crate::query::Pagination;

const FARMER_COLUMNS: &str = "id, name, phone_number, created_at, created_by, updated_at, updated_by";

#[async_trait]
pub trait FarmerRepository: Send + Sync {
    async fn create(&self, farmer: NewFarmer) -> Result<ObjectId, RepositoryError>;
    async fn get(&self, id: &ObjectId) -> Result<Option<Farmer>, RepositoryError>;
    async fn list(&self, page: Pagination) -> Result<Vec<Farmer>, RepositoryError>;
    /// False when the farmer is missing or `changes` sets no field
    async fn update(&self, id: &ObjectId, changes: &FarmerChanges) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError>;
}

pub struct PgFarmerRepository {
    pool: PgPool,
}

impl PgFarmerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FarmerRepository for PgFarmerRepository {
    async fn create(&self, farmer: NewFarmer) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        sqlx::query(
            "INSERT INTO farmers (id, name, phone_number, created_at, created_by) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&id)
        .bind(&farmer.name)
        .bind(&farmer.phone_number)
        .bind(farmer.created_at)
        .bind(&farmer.created_by)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Farmer>, RepositoryError> {
        let farmer = sqlx::query_as::<_, Farmer>(&format!("SELECT {} FROM farmers WHERE id = $1", FARMER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(farmer)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Farmer>, RepositoryError> {
        let farmers = sqlx::query_as::<_, Farmer>(&format!(
            "SELECT {} FROM farmers ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            FARMER_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(farmers)
    }

    async fn update(&self, id: &ObjectId, changes: &FarmerChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE farmers SET
                name = COALESCE($2, name),
                phone_number = COALESCE($3, phone_number),
                updated_at = COALESCE($4, updated_at),
                updated_by = COALESCE($5, updated_by)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.phone_number)
        .bind(changes.updated_at)
        .bind(&changes.updated_by)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM farmers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
