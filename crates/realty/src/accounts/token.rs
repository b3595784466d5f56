use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::domain::{Role, User, UserId};
use crate::config::AuthConfig;

/// JWT payload carried by every session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign session token")]
    Sign(#[source] jsonwebtoken::errors::Error),
    #[error("session token rejected")]
    Rejected(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies HS256 session tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenAuthority {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl)
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            id: UserId(12),
            name: "Riley".to_string(),
            email: "riley@example.com".to_string(),
            phone: None,
            role,
            avatar: None,
            bio: None,
            location: None,
            created_at: Utc::now(),
            updated_at: None,
            last_login: None,
        }
    }

    #[test]
    fn issued_tokens_verify_with_the_same_secret() {
        let authority = TokenAuthority::new("test-secret", Duration::hours(1));
        let token = authority.issue(&user(Role::Agent)).expect("token issued");
        let claims = authority.verify(&token).expect("token verifies");
        assert_eq!(claims.user_id, UserId(12));
        assert_eq!(claims.role, Role::Agent);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let issuer = TokenAuthority::new("one-secret", Duration::hours(1));
        let other = TokenAuthority::new("another-secret", Duration::hours(1));
        let token = issuer.issue(&user(Role::Buyer)).expect("token issued");
        assert!(other.verify(&token).is_err());

        let stale = TokenAuthority::new("one-secret", Duration::hours(-2));
        let expired = stale.issue(&user(Role::Buyer)).expect("token issued");
        assert!(issuer.verify(&expired).is_err());
        assert!(issuer.verify("not-a-token").is_err());
    }
}
