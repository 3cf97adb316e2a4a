use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use sqlx::Row;
use uuid::Uuid;

use super::database_error;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::models::UserId;
use crate::domain::session::ports::RefreshTokenStore;
use crate::session::errors::StoreError;

const TOKEN_COLUMNS: &str = "id, token, user_id, expires_at, is_used, is_revoked, created_at, \
     used_at, revoked_at, created_by_ip, used_by_ip, revoked_by_ip";

pub struct PostgresRefreshTokenStore {
    pool: PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: &PgRow) -> Result<RefreshToken, StoreError> {
        Ok(RefreshToken {
            id: RefreshTokenId(row.try_get::<Uuid, _>("id").map_err(database_error)?),
            token: row.try_get("token").map_err(database_error)?,
            user_id: UserId(row.try_get::<Uuid, _>("user_id").map_err(database_error)?),
            expires_at: row.try_get("expires_at").map_err(database_error)?,
            is_used: row.try_get("is_used").map_err(database_error)?,
            is_revoked: row.try_get("is_revoked").map_err(database_error)?,
            created_at: row.try_get("created_at").map_err(database_error)?,
            used_at: row
                .try_get::<Option<DateTime<Utc>>, _>("used_at")
                .map_err(database_error)?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(database_error)?,
            created_by_ip: row.try_get("created_by_ip").map_err(database_error)?,
            used_by_ip: row.try_get("used_by_ip").map_err(database_error)?,
            revoked_by_ip: row.try_get("revoked_by_ip").map_err(database_error)?,
        })
    }
}

#[async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, StoreError> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
             (id, token, user_id, expires_at, is_used, is_revoked, created_at, created_by_ip) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(token.id.0)
        .bind(&token.token)
        .bind(token.user_id.0)
        .bind(token.expires_at)
        .bind(token.is_used)
        .bind(token.is_revoked)
        .bind(token.created_at)
        .bind(&token.created_by_ip)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return StoreError::Duplicate("refresh token value".to_string());
                }
            }
            database_error(e)
        })?;

        Ok(token)
    }

    async fn find_by_value(&self, value: &str) -> Result<Option<RefreshToken>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM refresh_tokens WHERE token = $1",
            TOKEN_COLUMNS
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(database_error)?;

        match row {
            Some(row) => Ok(Some(Self::map_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn mark_used(
        &self,
        id: &RefreshTokenId,
        by_ip: Option<String>,
    ) -> Result<bool, StoreError> {
        // Conditional claim: under concurrent redemption exactly one caller
        // sees rows_affected == 1
        let result = sqlx::query(
            "UPDATE refresh_tokens \
             SET is_used = TRUE, used_at = $2, used_by_ip = $3 \
             WHERE id = $1 AND is_used = FALSE AND is_revoked = FALSE",
        )
        .bind(id.0)
        .bind(Utc::now())
        .bind(by_ip)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke(&self, id: &RefreshTokenId, by_ip: Option<String>) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE refresh_tokens \
             SET is_revoked = TRUE, revoked_at = $2, revoked_by_ip = $3 \
             WHERE id = $1 AND is_revoked = FALSE",
        )
        .bind(id.0)
        .bind(Utc::now())
        .bind(by_ip)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        by_ip: Option<String>,
    ) -> Result<u64, StoreError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE refresh_tokens \
             SET is_revoked = TRUE, revoked_at = $2, revoked_by_ip = $3 \
             WHERE user_id = $1 AND is_used = FALSE AND is_revoked = FALSE AND expires_at > $2",
        )
        .bind(user_id.0)
        .bind(now)
        .bind(by_ip)
        .execute(&self.pool)
        .await
        .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < $1")
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected())
    }

    async fn list_active_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<RefreshToken>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM refresh_tokens \
             WHERE user_id = $1 AND is_used = FALSE AND is_revoked = FALSE AND expires_at > $2 \
             ORDER BY created_at DESC",
            TOKEN_COLUMNS
        ))
        .bind(user_id.0)
        .bind(Utc::now())
        .fetch_all(&self.pool)
        .await
        .map_err(database_error)?;

        rows.iter().map(Self::map_row).collect()
    }
}
