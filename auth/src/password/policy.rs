use super::errors::PasswordPolicyError;

/// Complexity rules applied before a password is hashed.
///
/// Checked on the hashing path only; verification accepts whatever hash is
/// stored so that policy changes never lock out existing accounts.
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
}

impl PasswordPolicy {
    /// Validate a plaintext password against this policy.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to check
    ///
    /// # Returns
    /// Unit if the password satisfies every rule
    ///
    /// # Errors
    /// The first violated rule, as a `PasswordPolicyError`
    pub fn validate(&self, password: &str) -> Result<(), PasswordPolicyError> {
        let length = password.chars().count();
        if length < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min: self.min_length,
                actual: length,
            });
        }

        if self.require_uppercase && !password.chars().any(|c| c.is_uppercase()) {
            return Err(PasswordPolicyError::MissingUppercase);
        }

        if self.require_lowercase && !password.chars().any(|c| c.is_lowercase()) {
            return Err(PasswordPolicyError::MissingLowercase);
        }

        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordPolicyError::MissingDigit);
        }

        Ok(())
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
        }
    }
}
