use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::session::models::LoginCommand;
use crate::domain::session::models::RefreshCommand;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::RefreshTokenId;
use crate::domain::session::models::TokenPair;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;
use crate::domain::session::models::Username;
use crate::session::errors::SessionError;
use crate::session::errors::StoreError;

/// Port for session domain operations.
#[async_trait]
pub trait SessionServicePort: Send + Sync + 'static {
    /// Authenticate a user and issue a token pair.
    ///
    /// # Arguments
    /// * `command` - Username, password, and client address
    ///
    /// # Returns
    /// Access token, its expiry, and a refresh token
    ///
    /// # Errors
    /// * `InvalidRequest` - Missing username or password
    /// * `AuthenticationFailed` - Any other failure; reasons are not
    ///   distinguished in the response
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, SessionError>;

    /// Redeem a refresh token for a new token pair.
    ///
    /// The presented token is single-use: a successful redemption marks it
    /// used before the new pair exists, and any replay fails.
    ///
    /// # Arguments
    /// * `command` - Opaque refresh-token value and client address
    ///
    /// # Returns
    /// A brand-new token pair for the owning user
    ///
    /// # Errors
    /// * `InvalidRequest` - Missing token value
    /// * `RefreshFailed` - Any other failure; reasons are not distinguished
    ///   in the response
    async fn refresh_token(&self, command: RefreshCommand) -> Result<TokenPair, SessionError>;

    /// Clear a user's failed-attempt counter and lockout.
    ///
    /// Administrative operation, independent of the lockout timer and
    /// idempotent: unlocking an already-unlocked account succeeds.
    ///
    /// # Errors
    /// * `UserNotFound` - No such user
    /// * `Infrastructure` - Store operation failed
    async fn unlock_account(&self, user_id: &UserId) -> Result<(), SessionError>;
}

/// Persistence operations for the user aggregate.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Retrieve user by username.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_by_username(&self, username: &Username) -> Result<Option<User>, StoreError>;

    /// Retrieve user by identifier.
    ///
    /// # Returns
    /// Optional user entity (None if not found)
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, StoreError>;

    /// Atomically increment the failed-attempt counter.
    ///
    /// Must be a store-side increment, not read-modify-write, so concurrent
    /// failures from different callers accumulate correctly. Also stamps
    /// the last-failed-attempt time.
    ///
    /// # Returns
    /// The updated user entity
    ///
    /// # Errors
    /// * `NotFound` - User does not exist
    /// * `Database` - Store operation failed
    async fn increment_failed_attempts(&self, id: &UserId) -> Result<User, StoreError>;

    /// Reset the failed-attempt counter to zero.
    async fn reset_failed_attempts(&self, id: &UserId) -> Result<(), StoreError>;

    /// Set the lockout horizon.
    async fn set_lockout(&self, id: &UserId, until: DateTime<Utc>) -> Result<(), StoreError>;

    /// Clear any lockout horizon.
    async fn clear_lockout(&self, id: &UserId) -> Result<(), StoreError>;
}

/// Persistence operations for refresh-token records.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync + 'static {
    /// Persist a new refresh-token record.
    ///
    /// # Errors
    /// * `Duplicate` - Token value already exists
    /// * `Database` - Store operation failed
    async fn create(&self, token: RefreshToken) -> Result<RefreshToken, StoreError>;

    /// Retrieve a record by its opaque token value.
    async fn find_by_value(&self, value: &str) -> Result<Option<RefreshToken>, StoreError>;

    /// Claim a record as used.
    ///
    /// Must be conditional at the store: the record transitions to used only
    /// if it is neither used nor revoked, in a single atomic step. Under
    /// concurrent redemption of one value exactly one caller wins.
    ///
    /// # Arguments
    /// * `id` - Record to claim
    /// * `by_ip` - Client address redeeming the token
    ///
    /// # Returns
    /// True if this caller won the claim
    ///
    /// # Errors
    /// * `Database` - Store operation failed
    async fn mark_used(&self, id: &RefreshTokenId, by_ip: Option<String>)
        -> Result<bool, StoreError>;

    /// Revoke a single record. Revoking an already-revoked record is a no-op.
    async fn revoke(&self, id: &RefreshTokenId, by_ip: Option<String>) -> Result<(), StoreError>;

    /// Revoke every still-redeemable record for a user.
    ///
    /// # Returns
    /// Number of records revoked
    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        by_ip: Option<String>,
    ) -> Result<u64, StoreError>;

    /// Delete records past their expiry horizon.
    ///
    /// Idempotent sweep intended for an external scheduler.
    ///
    /// # Returns
    /// Number of records deleted
    async fn delete_expired(&self) -> Result<u64, StoreError>;

    /// List the still-redeemable records for a user.
    async fn list_active_for_user(&self, user_id: &UserId) -> Result<Vec<RefreshToken>, StoreError>;
}
