//! Credential and token utilities library
//!
//! Provides reusable authentication infrastructure for services:
//! - Password hashing with a complexity policy (Argon2id)
//! - Signed access-token generation and validation
//! - Opaque refresh-token value generation
//!
//! Services define their own storage traits and adapt these implementations.
//! This keeps the library unaware of user storage shapes while reducing code
//! duplication.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("GoodPassword123").unwrap();
//! assert!(hasher.verify("GoodPassword123", &hash));
//! assert!(!hasher.verify("WrongPassword123", &hash));
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::{TokenIssuer, TokenIssuerConfig, TokenSubject};
//! use chrono::Duration;
//!
//! let issuer = TokenIssuer::new(
//!     b"secret_key_at_least_32_bytes_long!",
//!     TokenIssuerConfig {
//!         issuer: "content-api".to_string(),
//!         audience: "content-api-clients".to_string(),
//!         access_token_ttl: Duration::minutes(15),
//!     },
//! );
//!
//! let subject = TokenSubject {
//!     user_id: "user123".to_string(),
//!     username: "alice".to_string(),
//!     email: "alice@example.com".to_string(),
//!     roles: vec!["editor".to_string()],
//! };
//!
//! let token = issuer.generate_access_token(&subject).unwrap();
//! let claims = issuer.validate_access_token(&token).unwrap();
//! assert_eq!(claims.sub, "user123");
//! ```
//!
//! ## Refresh Token Values
//! ```
//! # use auth::{TokenIssuer, TokenIssuerConfig};
//! # use chrono::Duration;
//! # let issuer = TokenIssuer::new(
//! #     b"secret_key_at_least_32_bytes_long!",
//! #     TokenIssuerConfig {
//! #         issuer: "content-api".to_string(),
//! #         audience: "content-api-clients".to_string(),
//! #         access_token_ttl: Duration::minutes(15),
//! #     },
//! # );
//! // Opaque, claim-free value; revocation is enforced by server-side state.
//! let value = issuer.generate_refresh_token_value();
//! assert_ne!(value, issuer.generate_refresh_token_value());
//! ```

pub mod issuer;
pub mod jwt;
pub mod password;

// Re-export commonly used items
pub use issuer::TokenIssuer;
pub use issuer::TokenIssuerConfig;
pub use jwt::AccessTokenClaims;
pub use jwt::JwtError;
pub use jwt::JwtHandler;
pub use jwt::TokenSubject;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use password::PasswordPolicy;
pub use password::PasswordPolicyError;
