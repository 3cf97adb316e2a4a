use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::session::errors::EmailError;
use crate::session::errors::UserIdError;
use crate::session::errors::UsernameError;

/// User aggregate entity.
///
/// Account provisioning creates users elsewhere; this core mutates them only
/// through failed-attempt increments, counter resets, and lockout set/clear.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: EmailAddress,
    pub password_hash: String,
    pub is_active: bool,
    pub roles: Vec<String>,
    pub failed_login_attempts: i32,
    pub lockout_end: Option<DateTime<Utc>>,
    pub last_failed_login_attempt: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether the account is currently locked out.
    pub fn is_locked_out(&self, now: DateTime<Utc>) -> bool {
        self.lockout_end.map_or(false, |end| end > now)
    }

    /// Whether the account may authenticate right now.
    pub fn can_login(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_locked_out(now)
    }

    /// Identity facts for an access token; a pure view over the entity.
    pub fn token_subject(&self) -> auth::TokenSubject {
        auth::TokenSubject {
            user_id: self.id.to_string(),
            username: self.username.as_str().to_string(),
            email: self.email.as_str().to_string(),
            roles: self.roles.clone(),
        }
    }
}

/// User unique identifier type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a user ID from string.
    ///
    /// # Arguments
    /// * `s` - UUID string to parse
    ///
    /// # Errors
    /// * `InvalidFormat` - String is not a valid UUID
    pub fn from_string(s: &str) -> Result<Self, UserIdError> {
        Uuid::parse_str(s)
            .map(UserId)
            .map_err(|e| UserIdError::InvalidFormat(e.to_string()))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Refresh-token record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshTokenId(pub Uuid);

impl RefreshTokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RefreshTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RefreshTokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Persisted refresh-token record.
///
/// The `token` value is opaque and globally unique. A record transitions at
/// most once over its lifetime, to used or to revoked; only the expiry sweep
/// removes rows.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: RefreshTokenId,
    pub token: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_by_ip: Option<String>,
    pub used_by_ip: Option<String>,
    pub revoked_by_ip: Option<String>,
}

impl RefreshToken {
    /// Build a fresh record for a newly issued token value.
    ///
    /// # Arguments
    /// * `user_id` - Owning user
    /// * `token` - Opaque token value
    /// * `now` - Issue instant; expiry is `now + ttl`
    /// * `ttl` - Record lifetime
    /// * `created_by_ip` - Client address that triggered issuance
    pub fn issue(
        user_id: UserId,
        token: String,
        now: DateTime<Utc>,
        ttl: Duration,
        created_by_ip: Option<String>,
    ) -> Self {
        Self {
            id: RefreshTokenId::new(),
            token,
            user_id,
            expires_at: now + ttl,
            is_used: false,
            is_revoked: false,
            created_at: now,
            used_at: None,
            revoked_at: None,
            created_by_ip,
            used_by_ip: None,
            revoked_by_ip: None,
        }
    }

    /// Whether the record can still be redeemed.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_used && !self.is_revoked && now < self.expires_at
    }
}

/// Username value type
///
/// Ensures username is 3-32 characters and contains only alphanumeric, underscore, and hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Username(String);

impl Username {
    const MIN_LENGTH: usize = 3;
    const MAX_LENGTH: usize = 32;

    /// Create a new valid username.
    ///
    /// Validates length and character constraints.
    ///
    /// # Arguments
    /// * `username` - Raw username string
    ///
    /// # Errors
    /// * `TooShort` - Username shorter than 3 characters
    /// * `TooLong` - Username longer than 32 characters
    /// * `InvalidCharacters` - Contains non-alphanumeric characters (except _ and -)
    pub fn new(username: String) -> Result<Self, UsernameError> {
        let username = Self::with_valid_length(username)?;
        let username = Self::with_valid_chars(username)?;
        Ok(Self(username))
    }

    fn with_valid_length(username: String) -> Result<String, UsernameError> {
        let length = username.len();
        if length < Self::MIN_LENGTH {
            Err(UsernameError::TooShort {
                min: Self::MIN_LENGTH,
                actual: length,
            })
        } else if length > Self::MAX_LENGTH {
            Err(UsernameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: length,
            })
        } else {
            Ok(username)
        }
    }

    fn with_valid_chars(username: String) -> Result<String, UsernameError> {
        if username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            Ok(username)
        } else {
            Err(UsernameError::InvalidCharacters)
        }
    }

    /// Get username as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Email address type
///
/// Validates email format using RFC 5322 compliant parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Create a new validated email address.
    ///
    /// # Arguments
    /// * `email` - Raw email string
    ///
    /// # Errors
    /// * `InvalidFormat` - Email does not conform to RFC 5322
    pub fn new(email: String) -> Result<Self, EmailError> {
        email_address::EmailAddress::from_str(&email)
            .map(|_| EmailAddress(email))
            .map_err(|e| EmailError::InvalidFormat(e.to_string()))
    }

    /// Get email as string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Brute-force lockout policy, immutable after startup.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_failed_attempts: i32,
    pub lockout_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failed_attempts: 5,
            lockout_duration: Duration::minutes(30),
        }
    }
}

/// Successful login or refresh result.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
}

/// Command to authenticate with username and password.
#[derive(Debug)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
    pub client_ip: Option<String>,
}

/// Command to redeem a refresh token for a new token pair.
#[derive(Debug)]
pub struct RefreshCommand {
    pub token: String,
    pub client_ip: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(),
            username: Username::new("alice".to_string()).unwrap(),
            email: EmailAddress::new("alice@example.com".to_string()).unwrap(),
            password_hash: "$argon2id$test_hash".to_string(),
            is_active: true,
            roles: vec!["member".to_string()],
            failed_login_attempts: 0,
            lockout_end: None,
            last_failed_login_attempt: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_lockout_window() {
        let now = Utc::now();
        let mut user = user();

        assert!(!user.is_locked_out(now));

        user.lockout_end = Some(now + Duration::minutes(30));
        assert!(user.is_locked_out(now));

        // A lockout ending exactly now is over
        user.lockout_end = Some(now);
        assert!(!user.is_locked_out(now));

        user.lockout_end = Some(now - Duration::seconds(1));
        assert!(!user.is_locked_out(now));
    }

    #[test]
    fn test_can_login() {
        let now = Utc::now();
        let mut user = user();

        assert!(user.can_login(now));

        user.is_active = false;
        assert!(!user.can_login(now));

        user.is_active = true;
        user.lockout_end = Some(now + Duration::minutes(5));
        assert!(!user.can_login(now));
    }

    #[test]
    fn test_refresh_token_validity() {
        let now = Utc::now();
        let token = RefreshToken::issue(
            UserId::new(),
            "opaque_value".to_string(),
            now,
            Duration::days(7),
            Some("203.0.113.7".to_string()),
        );

        assert!(token.is_valid(now));
        assert!(!token.is_used);
        assert!(!token.is_revoked);
        assert_eq!(token.expires_at, now + Duration::days(7));

        let mut used = token.clone();
        used.is_used = true;
        assert!(!used.is_valid(now));

        let mut revoked = token.clone();
        revoked.is_revoked = true;
        assert!(!revoked.is_valid(now));

        // Expiry boundary is exclusive
        assert!(!token.is_valid(token.expires_at));
        assert!(!token.is_valid(token.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn test_token_subject_mirrors_user() {
        let user = user();
        let subject = user.token_subject();

        assert_eq!(subject.user_id, user.id.to_string());
        assert_eq!(subject.username, "alice");
        assert_eq!(subject.email, "alice@example.com");
        assert_eq!(subject.roles, vec!["member".to_string()]);
    }
}
