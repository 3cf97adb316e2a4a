use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Identity facts a service embeds into an access token.
///
/// Services build this from their own user entity; the library never sees
/// storage shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
}

/// Access-token claim set.
///
/// Standard RFC 7519 claims (sub, exp, iat, iss, aud) plus the identity
/// fields this system embeds. The claim set is a pure function of the
/// subject, the issue time, and the issuer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessTokenClaims {
    /// Subject (user identifier)
    pub sub: String,

    pub username: String,

    pub email: String,

    /// Role names; omitted from the wire form when empty
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,
}

impl AccessTokenClaims {
    /// Build the claim set for a subject.
    ///
    /// # Arguments
    /// * `subject` - Identity facts to embed
    /// * `issued_at` - Issue instant; expiry is `issued_at + ttl`
    /// * `ttl` - Token lifetime
    /// * `issuer` - Issuer claim value
    /// * `audience` - Audience claim value
    pub fn for_subject(
        subject: &TokenSubject,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        issuer: &str,
        audience: &str,
    ) -> Self {
        let expiration = issued_at + ttl;

        Self {
            sub: subject.user_id.clone(),
            username: subject.username.clone(),
            email: subject.email.clone(),
            roles: subject.roles.clone(),
            exp: expiration.timestamp(),
            iat: issued_at.timestamp(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
        }
    }

    /// Check if the claim set is expired at the given instant.
    pub fn is_expired(&self, current_timestamp: i64) -> bool {
        self.exp < current_timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject {
        TokenSubject {
            user_id: "user123".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            roles: vec!["editor".to_string(), "admin".to_string()],
        }
    }

    #[test]
    fn test_for_subject() {
        let issued_at = Utc::now();
        let claims = AccessTokenClaims::for_subject(
            &subject(),
            issued_at,
            Duration::minutes(15),
            "content-api",
            "content-api-clients",
        );

        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.roles, vec!["editor", "admin"]);
        assert_eq!(claims.iss, "content-api");
        assert_eq!(claims.aud, "content-api-clients");
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_empty_roles_are_omitted_from_wire_form() {
        let mut subject = subject();
        subject.roles.clear();

        let claims = AccessTokenClaims::for_subject(
            &subject,
            Utc::now(),
            Duration::minutes(15),
            "content-api",
            "content-api-clients",
        );

        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("roles").is_none());

        let restored: AccessTokenClaims = serde_json::from_value(json).unwrap();
        assert!(restored.roles.is_empty());
    }

    #[test]
    fn test_is_expired() {
        let claims = AccessTokenClaims::for_subject(
            &subject(),
            Utc::now(),
            Duration::minutes(15),
            "content-api",
            "content-api-clients",
        );

        assert!(!claims.is_expired(claims.exp));
        assert!(claims.is_expired(claims.exp + 1));
    }
}
