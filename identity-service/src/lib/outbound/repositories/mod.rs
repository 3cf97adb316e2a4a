pub mod refresh_token;
pub mod user;

pub use refresh_token::PostgresRefreshTokenStore;
pub use user::PostgresUserStore;

use crate::session::errors::StoreError;

pub(crate) fn database_error(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}
