use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use super::database_error;
use crate::domain::session::models::EmailAddress;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;
use crate::domain::session::models::Username;
use crate::domain::session::ports::UserStore;
use crate::session::errors::StoreError;

const USER_COLUMNS: &str = "id, username, email, password_hash, is_active, roles, \
     failed_login_attempts, lockout_end, last_failed_login_attempt, created_at";

pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<User, StoreError> {
        let username: String = row.try_get("username").map_err(database_error)?;
        let email: String = row.try_get("email").map_err(database_error)?;

        Ok(User {
            id: UserId(row.try_get::<Uuid, _>("id").map_err(database_error)?),
            username: Username::new(username)
                .map_err(|e| StoreError::Database(format!("Stored username invalid: {}", e)))?,
            email: EmailAddress::new(email)
                .map_err(|e| StoreError::Database(format!("Stored email invalid: {}", e)))?,
            password_hash: row.try_get("password_hash").map_err(database_error)?,
            is_active: row.try_get("is_active").map_err(database_error)?,
            roles: row.try_get::<Vec<String>, _>("roles").map_err(database_error)?,
            failed_login_attempts: row
                .try_get("failed_login_attempts")
                .map_err(database_error)?,
            lockout_end: row
                .try_get::<Option<DateTime<Utc>>, _>("lockout_end")
                .map_err(database_error)?,
            last_failed_login_attempt: row
                .try_get::<Option<DateTime<Utc>>, _>("last_failed_login_attempt")
                .map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
        })
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        match row {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn increment_failed_attempts(&self, id: &UserId) -> Result<User, StoreError> {
        // Store-side increment; concurrent failures accumulate correctly
        let row = sqlx::query(&format!(
            "UPDATE users \
             SET failed_login_attempts = failed_login_attempts + 1, \
                 last_failed_login_attempt = $2 \
             WHERE id = $1 \
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id.0)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Self::map_row(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn reset_failed_attempts(&self, id: &UserId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE users \
             SET failed_login_attempts = 0, last_failed_login_attempt = NULL \
             WHERE id = $1",
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn set_lockout(&self, id: &UserId, until: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET lockout_end = $2 WHERE id = $1")
            .bind(id.0)
            .bind(until)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }

    async fn clear_lockout(&self, id: &UserId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET lockout_end = NULL WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        Ok(())
    }
}
