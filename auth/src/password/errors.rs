use thiserror::Error;

/// Error type for password complexity violations.
///
/// These are caller-correctable and safe to surface: they can only occur on
/// the hashing path (account provisioning, password change), never during
/// login verification.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password too short: minimum {min} characters, got {actual}")]
    TooShort { min: usize, actual: usize },

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingDigit,
}

/// Error type for password hashing operations.
#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password rejected: {0}")]
    Policy(#[from] PasswordPolicyError),

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}
