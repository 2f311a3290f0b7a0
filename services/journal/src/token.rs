//! Session tokens for authenticated requests
//!
//! A session is a signed, expiring HS256 token carrying the authenticated
//! user's id and username. The token travels in an HTTP-only cookie and is
//! validated on every protected request, so no server-side session state
//! exists beyond the signing secret.

use anyhow::Result;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "wanderlog_session";

/// Session token configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret used to sign and verify session tokens
    pub secret: String,
    /// Session lifetime in seconds (default: 24 hours)
    pub session_ttl: u64,
}

impl SessionConfig {
    /// Create a new SessionConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SESSION_SECRET`: signing secret for session tokens (required)
    /// - `SESSION_TTL_SECS`: session lifetime in seconds (default: 86400)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("SESSION_SECRET")
            .map_err(|_| anyhow::anyhow!("SESSION_SECRET environment variable not set"))?;

        let session_ttl = std::env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        Ok(SessionConfig {
            secret,
            session_ttl,
        })
    }
}

/// Claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    /// Username, kept in the token so handlers never refetch it
    pub username: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_ttl: u64,
}

impl SessionService {
    /// Initialize a new session service
    pub fn new(config: &SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.validate_exp = true;

        SessionService {
            encoding_key,
            decoding_key,
            validation,
            session_ttl: config.session_ttl,
        }
    }

    /// Issue a session token for an authenticated user
    pub fn issue(&self, user_id: Uuid, username: &str) -> Result<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs();

        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            iat: now,
            exp: now + self.session_ttl,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Verify a session token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Session lifetime in seconds
    pub fn session_ttl(&self) -> u64 {
        self.session_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> SessionService {
        SessionService::new(&SessionConfig {
            secret: "test-secret-for-session-tokens".to_string(),
            session_ttl: 3600,
        })
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let service = service();
        let user_id = Uuid::new_v4();

        let token = service.issue(user_id, "alice").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let service = service();
        let other = SessionService::new(&SessionConfig {
            secret: "a-different-secret".to_string(),
            session_ttl: 3600,
        });

        let token = other.issue(Uuid::new_v4(), "mallory").unwrap();
        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = service();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-for-session-tokens"),
        )
        .unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let service = service();
        assert!(service.verify("not-a-token").is_err());
    }
}
