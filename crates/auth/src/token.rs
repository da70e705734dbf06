//! HS256 credential issuing and verification.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use firmhub_core::UserId;

use crate::claims::{Claims, TokenValidationError, validate_claims};
use crate::config::AuthConfig;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token is malformed")]
    Malformed,

    #[error("token has expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenValidationError> for TokenError {
    fn from(value: TokenValidationError) -> Self {
        match value {
            TokenValidationError::Expired => TokenError::Expired,
            TokenValidationError::InvalidTimeWindow => TokenError::Malformed,
        }
    }
}

/// Verifies a bearer credential and yields the user it was issued to.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str) -> Result<UserId, TokenError>;
}

/// Issues credentials for authenticated users.
pub trait JwtIssuer: Send + Sync {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError>;
}

/// Symmetric (HS256) credential service.
#[derive(Clone)]
pub struct Hs256JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256JwtService {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.as_bytes(), config.token_ttl)
    }

    /// Issue a credential as if the clock read `issued_at`.
    pub fn issue_at(
        &self,
        user_id: UserId,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".to_string()))?;
        let claims = Claims::new(user_id, issued_at, expires_at);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify a credential against the clock reading `now`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // Expiry is judged against `now` below.
        validation.validate_exp = false;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation).map_err(
            |e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            },
        )?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims.user_id)
    }
}

impl JwtIssuer for Hs256JwtService {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }
}

impl JwtValidator for Hs256JwtService {
    fn validate(&self, token: &str) -> Result<UserId, TokenError> {
        self.verify_at(token, Utc::now())
    }
}

impl core::fmt::Debug for Hs256JwtService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
