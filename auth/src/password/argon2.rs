use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;
use super::policy::PasswordPolicy;

/// Password hashing implementation.
///
/// Applies a complexity policy before hashing, then hashes with Argon2id
/// and a per-call random salt.
pub struct PasswordHasher {
    policy: PasswordPolicy,
}

impl PasswordHasher {
    /// Create a new password hasher with the default complexity policy.
    pub fn new() -> Self {
        Self {
            policy: PasswordPolicy::default(),
        }
    }

    /// Create a password hasher with a custom complexity policy.
    ///
    /// # Arguments
    /// * `policy` - Complexity rules to enforce before hashing
    pub fn with_policy(policy: PasswordPolicy) -> Self {
        Self { policy }
    }

    /// Hash a plaintext password securely.
    ///
    /// Rejects passwords that fail the complexity policy, then hashes with
    /// Argon2id and random salt generation. Two hashes of the same password
    /// never match bit-for-bit.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to hash
    ///
    /// # Returns
    /// PHC string format hash (includes algorithm, parameters, salt, and hash)
    ///
    /// # Errors
    /// * `Policy` - Password fails the complexity policy
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.policy.validate(password)?;

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Verify a password against a stored hash.
    ///
    /// Never fails: a malformed hash, empty input, or mismatch all yield
    /// `false`. This path sits on the guessing surface, so no detail about
    /// the failure is reported.
    ///
    /// # Arguments
    /// * `password` - Plaintext password to verify
    /// * `hash` - Stored password hash in PHC string format
    ///
    /// # Returns
    /// True if the password matches the hash
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        if password.is_empty() || hash.is_empty() {
            return false;
        }

        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}
