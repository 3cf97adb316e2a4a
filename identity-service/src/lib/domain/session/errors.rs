use thiserror::Error;

/// Error for UserId parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),
}

/// Error for Username validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Username too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Username too long: maximum {max} characters, got {actual}")]
    TooLong { max: usize, actual: usize },

    #[error(
        "Username contains invalid characters (only alphanumeric, underscore, and hyphen allowed)"
    )]
    InvalidCharacters,
}

/// Error for EmailAddress validation failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid email format: {0}")]
    InvalidFormat(String),
}

/// Error crossing the storage boundary.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    #[error("Duplicate value: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Outward error for session operations.
///
/// Every login failure shares one message, and every refresh failure shares
/// another, regardless of the underlying reason. The specific reason is
/// logged internally; collapsing it here prevents user enumeration and must
/// not be refined into more specific responses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Invalid refresh token")]
    RefreshFailed,

    // Admin-facing, not part of the guessing surface
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Storage unavailable")]
    Infrastructure,
}
