use async_trait::async_trait;
use sqlx::PgPool;

use crate::drones::models::{Drone, DroneChanges, NewDrone};
use crate::error::RepositoryError;
use crate::object_id::ObjectId;
use crate::query::Pagination;

const DRONE_COLUMNS: &str =
    "id, name, model, serial_number, per_hour_rate, created_at, created_by, updated_at, updated_by";

#[async_trait]
pub trait DroneRepository: Send + Sync {
    /// A serial number already in use yields `Duplicate("serial_number")`
    async fn create(&self, drone: NewDrone) -> Result<ObjectId, RepositoryError>;
    async fn get(&self, id: &ObjectId) -> Result<Option<Drone>, RepositoryError>;
    async fn list(&self, page: Pagination) -> Result<Vec<Drone>, RepositoryError>;
    async fn update(&self, id: &ObjectId, changes: &DroneChanges) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError>;
}

pub struct PgDroneRepository {
    pool: PgPool,
}

impl PgDroneRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DroneRepository for PgDroneRepository {
    async fn create(&self, drone: NewDrone) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();
        sqlx::query(
            "INSERT INTO drone_details (id, name, model, serial_number, per_hour_rate, created_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(&id)
        .bind(&drone.name)
        .bind(&drone.model)
        .bind(&drone.serial_number)
        .bind(drone.per_hour_rate)
        .bind(drone.created_at)
        .bind(&drone.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "serial_number"))?;

        Ok(id)
    }

    async fn get(&self, id: &ObjectId) -> Result<Option<Drone>, RepositoryError> {
        let drone = sqlx::query_as::<_, Drone>(&format!("SELECT {} FROM drone_details WHERE id = $1", DRONE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(drone)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<Drone>, RepositoryError> {
        let drones = sqlx::query_as::<_, Drone>(&format!(
            "SELECT {} FROM drone_details ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            DRONE_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;
        Ok(drones)
    }

    async fn update(&self, id: &ObjectId, changes: &DroneChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE drone_details SET
                name = COALESCE($2, name),
                model = COALESCE($3, model),
                serial_number = COALESCE($4, serial_number),
                per_hour_rate = COALESCE($5, per_hour_rate),
                updated_at = COALESCE($6, updated_at),
                updated_by = COALESCE($7, updated_by)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.model)
        .bind(&changes.serial_number)
        .bind(changes.per_hour_rate)
        .bind(changes.updated_at)
        .bind(&changes.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "serial_number"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM drone_details WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
