use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use chrono::Utc;

use crate::domain::session::models::LockoutPolicy;
use crate::domain::session::models::LoginCommand;
use crate::domain::session::models::RefreshCommand;
use crate::domain::session::models::RefreshToken;
use crate::domain::session::models::TokenPair;
use crate::domain::session::models::User;
use crate::domain::session::models::UserId;
use crate::domain::session::models::Username;
use crate::session::errors::SessionError;
use crate::session::ports::RefreshTokenStore;
use crate::session::ports::SessionServicePort;
use crate::session::ports::UserStore;

/// Domain service composing credential verification, token issuance, and
/// the lockout policy into the login and refresh state machines.
///
/// Holds no per-request mutable state; safe to invoke concurrently.
pub struct SessionService<US, RS>
where
    US: UserStore,
    RS: RefreshTokenStore,
{
    users: Arc<US>,
    refresh_tokens: Arc<RS>,
    token_issuer: auth::TokenIssuer,
    password_hasher: auth::PasswordHasher,
    lockout_policy: LockoutPolicy,
    refresh_token_ttl: Duration,
}

impl<US, RS> SessionService<US, RS>
where
    US: UserStore,
    RS: RefreshTokenStore,
{
    /// Create a new session service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `refresh_tokens` - Refresh-token persistence implementation
    /// * `token_issuer` - Configured token issuer
    /// * `lockout_policy` - Failed-attempt threshold and lockout duration
    /// * `refresh_token_ttl` - Lifetime of issued refresh-token records
    pub fn new(
        users: Arc<US>,
        refresh_tokens: Arc<RS>,
        token_issuer: auth::TokenIssuer,
        lockout_policy: LockoutPolicy,
        refresh_token_ttl: Duration,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            token_issuer,
            password_hasher: auth::PasswordHasher::new(),
            lockout_policy,
            refresh_token_ttl,
        }
    }

    /// Count a failed attempt and trigger lockout at the threshold.
    ///
    /// The increment happens at the store so concurrent failures cannot
    /// under-count. Store errors are logged and swallowed; the caller
    /// returns the generic failure either way.
    async fn register_failed_attempt(&self, user: &User) {
        let updated = match self.users.increment_failed_attempts(&user.id).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::error!("Failed to record failed attempt for user {}: {}", user.id, e);
                return;
            }
        };

        tracing::warn!(
            "Login failed for user {}: wrong password (attempt {})",
            user.id,
            updated.failed_login_attempts
        );

        if updated.failed_login_attempts >= self.lockout_policy.max_failed_attempts {
            let until = Utc::now() + self.lockout_policy.lockout_duration;
            match self.users.set_lockout(&user.id, until).await {
                Ok(()) => tracing::warn!("User {} locked out until {}", user.id, until),
                Err(e) => tracing::error!("Failed to set lockout for user {}: {}", user.id, e),
            }
        }
    }

    /// Issue an access token and a persisted refresh-token record.
    ///
    /// Failure reasons are logged here; callers collapse `None` into the
    /// generic error of their flow.
    async fn issue_token_pair(&self, user: &User, client_ip: Option<String>) -> Option<TokenPair> {
        let subject = user.token_subject();

        let access_token = match self.token_issuer.generate_access_token(&subject) {
            Ok(token) => token,
            Err(e) => {
                tracing::error!("Failed to sign access token for user {}: {}", user.id, e);
                return None;
            }
        };
        let expires_at = self.token_issuer.token_expiration();

        let value = self.token_issuer.generate_refresh_token_value();
        let record = RefreshToken::issue(
            user.id,
            value,
            Utc::now(),
            self.refresh_token_ttl,
            client_ip,
        );

        let stored = match self.refresh_tokens.create(record).await {
            Ok(stored) => stored,
            Err(e) => {
                tracing::error!("Failed to persist refresh token for user {}: {}", user.id, e);
                return None;
            }
        };

        Some(TokenPair {
            access_token,
            expires_at,
            refresh_token: stored.token,
        })
    }
}

#[async_trait]
impl<US, RS> SessionServicePort for SessionService<US, RS>
where
    US: UserStore,
    RS: RefreshTokenStore,
{
    async fn login(&self, command: LoginCommand) -> Result<TokenPair, SessionError> {
        if command.username.trim().is_empty() || command.password.is_empty() {
            return Err(SessionError::InvalidRequest(
                "Username and password are required".to_string(),
            ));
        }

        // A name that cannot exist is indistinguishable from one that does not
        let username = match Username::new(command.username.clone()) {
            Ok(username) => username,
            Err(e) => {
                tracing::warn!("Login failed: malformed username: {}", e);
                return Err(SessionError::AuthenticationFailed);
            }
        };

        let user = match self.users.find_by_username(&username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Login failed for {}: unknown username", username);
                return Err(SessionError::AuthenticationFailed);
            }
            Err(e) => {
                tracing::error!("Login failed for {}: user lookup error: {}", username, e);
                return Err(SessionError::AuthenticationFailed);
            }
        };

        let now = Utc::now();

        if !user.is_active {
            tracing::warn!("Login failed for user {}: account inactive", user.id);
            return Err(SessionError::AuthenticationFailed);
        }

        if user.is_locked_out(now) {
            tracing::warn!(
                "Login failed for user {}: locked out until {:?}",
                user.id,
                user.lockout_end
            );
            return Err(SessionError::AuthenticationFailed);
        }

        if !self
            .password_hasher
            .verify(&command.password, &user.password_hash)
        {
            self.register_failed_attempt(&user).await;
            return Err(SessionError::AuthenticationFailed);
        }

        if let Err(e) = self.users.reset_failed_attempts(&user.id).await {
            tracing::error!("Failed to reset attempt counter for user {}: {}", user.id, e);
            return Err(SessionError::AuthenticationFailed);
        }

        if user.lockout_end.is_some() {
            if let Err(e) = self.users.clear_lockout(&user.id).await {
                tracing::error!("Failed to clear stale lockout for user {}: {}", user.id, e);
                return Err(SessionError::AuthenticationFailed);
            }
        }

        self.issue_token_pair(&user, command.client_ip)
            .await
            .ok_or(SessionError::AuthenticationFailed)
    }

    async fn refresh_token(&self, command: RefreshCommand) -> Result<TokenPair, SessionError> {
        if command.token.trim().is_empty() {
            return Err(SessionError::InvalidRequest(
                "Refresh token is required".to_string(),
            ));
        }

        let record = match self.refresh_tokens.find_by_value(&command.token).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!("Refresh failed: token value not found");
                return Err(SessionError::RefreshFailed);
            }
            Err(e) => {
                tracing::error!("Refresh failed: token lookup error: {}", e);
                return Err(SessionError::RefreshFailed);
            }
        };

        let now = Utc::now();

        if !record.is_valid(now) {
            // Reasons are distinguished here only; the response stays generic
            if record.is_used {
                tracing::warn!(
                    "Refresh failed for token {}: already used at {:?}",
                    record.id,
                    record.used_at
                );
            } else if record.is_revoked {
                tracing::warn!(
                    "Refresh failed for token {}: revoked at {:?}",
                    record.id,
                    record.revoked_at
                );
            } else {
                tracing::warn!(
                    "Refresh failed for token {}: expired at {}",
                    record.id,
                    record.expires_at
                );
            }
            return Err(SessionError::RefreshFailed);
        }

        let user = match self.users.find_by_id(&record.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(
                    "Refresh failed for token {}: owning user {} not found",
                    record.id,
                    record.user_id
                );
                return Err(SessionError::RefreshFailed);
            }
            Err(e) => {
                tracing::error!(
                    "Refresh failed for token {}: user lookup error: {}",
                    record.id,
                    e
                );
                return Err(SessionError::RefreshFailed);
            }
        };

        if !user.can_login(now) {
            tracing::warn!(
                "Refresh failed for token {}: user {} cannot log in",
                record.id,
                user.id
            );
            return Err(SessionError::RefreshFailed);
        }

        // The presented token must be claimed before the new pair exists;
        // losing the conditional claim means another redemption won
        match self
            .refresh_tokens
            .mark_used(&record.id, command.client_ip.clone())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Refresh failed for token {}: claimed concurrently", record.id);
                return Err(SessionError::RefreshFailed);
            }
            Err(e) => {
                tracing::error!("Refresh failed for token {}: claim error: {}", record.id, e);
                return Err(SessionError::RefreshFailed);
            }
        }

        self.issue_token_pair(&user, command.client_ip)
            .await
            .ok_or(SessionError::RefreshFailed)
    }

    async fn unlock_account(&self, user_id: &UserId) -> Result<(), SessionError> {
        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(SessionError::UserNotFound(user_id.to_string())),
            Err(e) => {
                tracing::error!("Unlock failed for user {}: lookup error: {}", user_id, e);
                return Err(SessionError::Infrastructure);
            }
        };

        if let Err(e) = self.users.reset_failed_attempts(&user.id).await {
            tracing::error!("Unlock failed for user {}: counter reset error: {}", user.id, e);
            return Err(SessionError::Infrastructure);
        }

        if let Err(e) = self.users.clear_lockout(&user.id).await {
            tracing::error!("Unlock failed for user {}: lockout clear error: {}", user.id, e);
            return Err(SessionError::Infrastructure);
        }

        tracing::info!("User {} unlocked", user.id);
        Ok(())
    }
}
