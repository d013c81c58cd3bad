// Database repositories for users and password reset tokens

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::auth::models::{NewUser, PasswordReset, User, UserChanges};
use crate::error::RepositoryError;
use crate::object_id::ObjectId;
use crate::query::Pagination;

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role_id, is_active, created_at, updated_at, created_by, updated_by";

/// Hash a reset token using SHA-256; only the digest is ever persisted
pub fn hash_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persistence port for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; a case-insensitive email clash yields `Duplicate("email")`
    async fn create(&self, user: NewUser) -> Result<ObjectId, RepositoryError>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, RepositoryError>;

    /// Case-insensitive lookup
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn list(&self, page: Pagination) -> Result<Vec<User>, RepositoryError>;

    /// Apply set fields only. Returns false when the user does not exist or
    /// the change set carries no field changes (nothing is written then).
    async fn update(&self, id: &ObjectId, changes: &UserChanges) -> Result<bool, RepositoryError>;

    /// Replace the stored hash for the account owning `email`
    async fn set_password_by_email(
        &self,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn set_password(
        &self,
        id: &ObjectId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError>;
}

/// Persistence port for single-use password reset tokens
#[async_trait]
pub trait ResetTokenRepository: Send + Sync {
    async fn store(&self, reset: PasswordReset) -> Result<(), RepositoryError>;

    /// Atomically mark an unused, unexpired token as used and return its email.
    /// Of any number of concurrent callers with the same hash at most one
    /// receives `Some`.
    async fn consume(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<String>, RepositoryError>;

    /// Remove records whose expiry has passed; returns how many were removed
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// Postgres-backed user repository
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<ObjectId, RepositoryError> {
        let id = ObjectId::new();

        sqlx::query(
            "INSERT INTO users (id, name, email, password_hash, role_id, is_active, created_at, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(&id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(&user.created_by)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email"))?;

        Ok(id)
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list(&self, page: Pagination) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at ASC, id ASC LIMIT $1 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update(&self, id: &ObjectId, changes: &UserChanges) -> Result<bool, RepositoryError> {
        if !changes.has_field_changes() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                role_id = COALESCE($4, role_id),
                is_active = COALESCE($5, is_active),
                updated_at = COALESCE($6, updated_at),
                updated_by = COALESCE($7, updated_by)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.email)
        .bind(changes.role)
        .bind(changes.is_active)
        .bind(changes.updated_at)
        .bind(&changes.updated_by)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "email"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password_by_email(
        &self,
        email: &str,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = $3 WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password(
        &self,
        id: &ObjectId,
        password_hash: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: &ObjectId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres-backed reset token repository
pub struct PgResetTokenRepository {
    pool: PgPool,
}

impl PgResetTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResetTokenRepository for PgResetTokenRepository {
    async fn store(&self, reset: PasswordReset) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_resets (email, token_hash, expires_at, used) VALUES ($1, $2, $3, $4)",
        )
        .bind(&reset.email)
        .bind(&reset.token_hash)
        .bind(reset.expires_at)
        .bind(reset.used)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "token_hash"))?;

        Ok(())
    }

    async fn consume(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<String>, RepositoryError> {
        // Single conditional UPDATE; the row lock serializes concurrent redeemers
        let email = sqlx::query_scalar::<_, String>(
            "UPDATE password_resets SET used = TRUE, used_at = $2
             WHERE token_hash = $1 AND used = FALSE AND expires_at >= $2
             RETURNING email",
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(email)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM password_resets WHERE expires_at < $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
