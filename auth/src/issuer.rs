use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::jwt::AccessTokenClaims;
use crate::jwt::JwtError;
use crate::jwt::JwtHandler;
use crate::jwt::TokenSubject;

/// Refresh-token values carry 256 bits of entropy.
const REFRESH_TOKEN_BYTES: usize = 32;

/// Immutable issuer configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct TokenIssuerConfig {
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl: Duration,
}

/// Token issuing coordinator.
///
/// Signs and validates access tokens and generates opaque refresh-token
/// values. Holds no mutable state; safe to share across requests.
pub struct TokenIssuer {
    jwt_handler: JwtHandler,
    issuer: String,
    audience: String,
    access_token_ttl: Duration,
}

impl TokenIssuer {
    /// Create a new token issuer.
    ///
    /// # Arguments
    /// * `secret` - Symmetric signing key
    /// * `config` - Issuer, audience, and access-token lifetime
    pub fn new(secret: &[u8], config: TokenIssuerConfig) -> Self {
        Self {
            jwt_handler: JwtHandler::new(secret, &config.issuer, &config.audience),
            issuer: config.issuer,
            audience: config.audience,
            access_token_ttl: config.access_token_ttl,
        }
    }

    /// Sign an access token for the given subject.
    ///
    /// The claim set is a pure function of the subject and the issue time;
    /// expiry is now plus the configured lifetime.
    ///
    /// # Arguments
    /// * `subject` - Identity facts to embed
    ///
    /// # Returns
    /// Signed three-segment compact token
    ///
    /// # Errors
    /// * `EncodingFailed` - Token signing failed
    pub fn generate_access_token(&self, subject: &TokenSubject) -> Result<String, JwtError> {
        let claims = AccessTokenClaims::for_subject(
            subject,
            Utc::now(),
            self.access_token_ttl,
            &self.issuer,
            &self.audience,
        );

        self.jwt_handler.encode(&claims)
    }

    /// Generate an opaque refresh-token value.
    ///
    /// 32 bytes from the operating system CSPRNG, base64-encoded. The value
    /// carries no claims: revocation is enforceable purely by server-side
    /// state.
    pub fn generate_refresh_token_value(&self) -> String {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Validate an access token and return its claims.
    ///
    /// Checks signature, issuer, audience, and expiry with zero clock-skew
    /// tolerance. Malformed input is an error value, never a panic.
    ///
    /// # Arguments
    /// * `token` - Compact token string
    ///
    /// # Errors
    /// * `TokenExpired` - Expiry claim is in the past
    /// * `InvalidToken` - Issuer or audience mismatch
    /// * `DecodingFailed` - Bad signature or malformed token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, JwtError> {
        self.jwt_handler.decode(token)
    }

    /// Extract the user identifier from an access token.
    ///
    /// Convenience wrapper over full validation; any invalid token yields
    /// `None`.
    pub fn extract_user_id(&self, token: &str) -> Option<String> {
        self.validate_access_token(token).ok().map(|claims| claims.sub)
    }

    /// Expiry instant an access token issued now would carry.
    pub fn token_expiration(&self) -> DateTime<Utc> {
        Utc::now() + self.access_token_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(
            b"test_secret_key_at_least_32_bytes!",
            TokenIssuerConfig {
                issuer: "content-api".to_string(),
                audience: "content-api-clients".to_string(),
                access_token_ttl: Duration::minutes(15),
            },
        )
    }

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: "user123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec!["editor".to_string()],
        }
    }

    #[test]
    fn test_access_token_round_trip() {
        let issuer = issuer();
        let subject = subject();

        let token = issuer
            .generate_access_token(&subject)
            .expect("Failed to generate token");

        let claims = issuer
            .validate_access_token(&token)
            .expect("Failed to validate token");

        assert_eq!(claims.sub, subject.user_id);
        assert_eq!(claims.username, subject.username);
        assert_eq!(claims.email, subject.email);
        assert_eq!(claims.roles, subject.roles);
        assert_eq!(claims.iss, "content-api");
        assert_eq!(claims.aud, "content-api-clients");
    }

    #[test]
    fn test_extract_user_id() {
        let issuer = issuer();

        let token = issuer
            .generate_access_token(&subject())
            .expect("Failed to generate token");

        assert_eq!(issuer.extract_user_id(&token), Some("user123".to_string()));
        assert_eq!(issuer.extract_user_id("not.a.token"), None);
        assert_eq!(issuer.extract_user_id(""), None);
    }

    #[test]
    fn test_refresh_token_values_are_unique_and_opaque() {
        let issuer = issuer();

        let first = issuer.generate_refresh_token_value();
        let second = issuer.generate_refresh_token_value();

        assert_ne!(first, second);
        // 32 bytes, base64 without padding
        assert_eq!(first.len(), 43);
        assert!(!first.contains('.'));
    }

    #[test]
    fn test_token_expiration_uses_configured_ttl() {
        let issuer = issuer();

        let expected = Utc::now() + Duration::minutes(15);
        let actual = issuer.token_expiration();

        assert!((actual - expected).num_seconds().abs() <= 1);
    }
}
