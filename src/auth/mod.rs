use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Token payload. `id` is the caller identity every resource is scoped to.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: Uuid, email: Option<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            id,
            email,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Token is not valid")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

/// Turns a bearer credential into a caller identity
pub trait IdentityProvider: Send + Sync {
    fn verify(&self, token: &str) -> Result<Uuid, AuthError>;
}

/// HS256 JWT verification against a shared secret
pub struct JwtIdentityProvider {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityProvider {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        })
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(AuthError::InvalidToken)?;
        Ok(token_data.claims.id)
    }
}

/// Sign a token for `claims`. Issuance normally lives with the identity
/// service; this exists for tooling and tests.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

/// Sign a session token for `id` that expires after `jwt_expiry_hours`
pub fn issue_session_token(security: &SecurityConfig, id: Uuid, email: Option<String>) -> Result<String, AuthError> {
    let claims = Claims::new(id, email, security.jwt_expiry_hours);
    issue_token(&security.jwt_secret, &claims)
}
