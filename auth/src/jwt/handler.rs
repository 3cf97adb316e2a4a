use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// Signed-token handler for encoding and decoding compact tokens.
///
/// Uses HS256 (HMAC with SHA-256). Validation pins issuer and audience and
/// allows zero clock skew on expiry.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHandler {
    /// Create a new handler with a symmetric secret.
    ///
    /// # Arguments
    /// * `secret` - Signing key (at least 256 bits for HS256)
    /// * `issuer` - Issuer every decoded token must carry
    /// * `audience` - Audience every decoded token must carry
    pub fn new(secret: &[u8], issuer: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[issuer]);
        validation.set_audience(&[audience]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Encode claims into a signed compact token.
    ///
    /// # Arguments
    /// * `claims` - Claims to encode
    ///
    /// # Returns
    /// Three-segment compact token string
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(Algorithm::HS256);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a compact token.
    ///
    /// Checks signature, issuer, audience, and expiry (zero leeway). Any
    /// malformed input is an error value, never a panic.
    ///
    /// # Arguments
    /// * `token` - Compact token string to decode
    ///
    /// # Returns
    /// Decoded claims
    ///
    /// # Errors
    /// * `TokenExpired` - Expiry claim is in the past
    /// * `InvalidToken` - Issuer or audience does not match
    /// * `DecodingFailed` - Signature is invalid or token is malformed
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let token_data =
            decode::<T>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    ErrorKind::InvalidIssuer => JwtError::InvalidToken("issuer mismatch".to_string()),
                    ErrorKind::InvalidAudience => {
                        JwtError::InvalidToken("audience mismatch".to_string())
                    }
                    _ => JwtError::DecodingFailed(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use chrono::Utc;

    use super::*;
    use crate::jwt::claims::AccessTokenClaims;
    use crate::jwt::claims::TokenSubject;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn claims_with_ttl(ttl: Duration) -> AccessTokenClaims {
        let subject = TokenSubject {
            user_id: "user123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec!["editor".to_string()],
        };
        AccessTokenClaims::for_subject(&subject, Utc::now(), ttl, "content-api", "clients")
    }

    #[test]
    fn test_encode_and_decode() {
        let handler = JwtHandler::new(SECRET, "content-api", "clients");
        let claims = claims_with_ttl(Duration::minutes(15));

        let token = handler.encode(&claims).expect("Failed to encode token");
        assert_eq!(token.split('.').count(), 3);

        let decoded: AccessTokenClaims = handler.decode(&token).expect("Failed to decode token");
        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_decode_expired_token() {
        let handler = JwtHandler::new(SECRET, "content-api", "clients");
        let claims = claims_with_ttl(Duration::seconds(-5));

        let token = handler.encode(&claims).expect("Failed to encode token");

        let result = handler.decode::<AccessTokenClaims>(&token);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_decode_with_wrong_secret() {
        let handler1 = JwtHandler::new(SECRET, "content-api", "clients");
        let handler2 = JwtHandler::new(b"another_secret_at_least_32_bytes!", "content-api", "clients");

        let token = handler1
            .encode(&claims_with_ttl(Duration::minutes(15)))
            .expect("Failed to encode token");

        assert!(handler2.decode::<AccessTokenClaims>(&token).is_err());
    }

    #[test]
    fn test_decode_rejects_issuer_mismatch() {
        let signer = JwtHandler::new(SECRET, "other-issuer", "clients");
        let verifier = JwtHandler::new(SECRET, "content-api", "clients");

        let subject = TokenSubject {
            user_id: "user123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec![],
        };
        let claims = AccessTokenClaims::for_subject(
            &subject,
            Utc::now(),
            Duration::minutes(15),
            "other-issuer",
            "clients",
        );
        let token = signer.encode(&claims).expect("Failed to encode token");

        let result = verifier.decode::<AccessTokenClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_rejects_audience_mismatch() {
        let signer = JwtHandler::new(SECRET, "content-api", "other-audience");
        let verifier = JwtHandler::new(SECRET, "content-api", "clients");

        let subject = TokenSubject {
            user_id: "user123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec![],
        };
        let claims = AccessTokenClaims::for_subject(
            &subject,
            Utc::now(),
            Duration::minutes(15),
            "content-api",
            "other-audience",
        );
        let token = signer.encode(&claims).expect("Failed to encode token");

        let result = verifier.decode::<AccessTokenClaims>(&token);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_decode_malformed_token() {
        let handler = JwtHandler::new(SECRET, "content-api", "clients");

        assert!(handler.decode::<AccessTokenClaims>("invalid.token.here").is_err());
        assert!(handler.decode::<AccessTokenClaims>("").is_err());
    }
}
