use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub role: Role,
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// Identity encoded into a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIdentity {
    pub id: i64,
    pub role: Role,
    pub username: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret is not configured")]
    InvalidSecret,

    #[error("JWT expiry of {0} hours is out of range")]
    InvalidExpiry(u64),

    #[error("JWT generation error: {0}")]
    Generation(String),

    /// Signature mismatch, malformed token and expiry all land here.
    #[error("invalid or expired token")]
    Invalid,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::InvalidSecret);
        }

        let expiry = i64::try_from(expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .ok_or(TokenError::InvalidExpiry(expiry_hours))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry,
        })
    }

    pub fn issue(&self, identity: &TokenIdentity) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            id: identity.id,
            role: identity.role,
            username: identity.username.clone(),
            exp: (now + self.expiry).timestamp(),
            iat: now.timestamp(),
        };
        self.encode(&claims)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token rejected: {}", e);
                TokenError::Invalid
            })
    }

    fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }
}
