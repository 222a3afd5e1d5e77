//! Authentication primitives: bcrypt password hashing, JWT issuance and
//! verification, and password-reset tokens.
//!
//! Reset tokens are random UUIDs handed to the caller; only their sha256
//! digest is persisted, so a leaked database does not leak usable tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::UserId;

/// Authentication failures. The HTTP layer maps these onto 401/500.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("password hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Sign(String),
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for JWT signing.
    pub jwt_secret: String,
    /// Lifetime of issued bearer tokens, in hours.
    pub token_ttl_hours: i64,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Lifetime of password reset tokens, in minutes.
    pub reset_token_ttl_min: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "dayline-dev-secret".to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            reset_token_ttl_min: 30,
        }
    }
}

impl AuthConfig {
    /// Create configuration from environment variables.
    ///
    /// - `JWT_SECRET`: signing secret (falls back to an insecure dev value)
    /// - `JWT_TTL_HOURS`: bearer token lifetime (default: 24)
    /// - `BCRYPT_COST`: bcrypt work factor (default: library default)
    /// - `RESET_TOKEN_TTL_MIN`: reset token lifetime (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                log::warn!("JWT_SECRET not set; using insecure development secret");
                defaults.jwt_secret
            }
        };

        Self {
            jwt_secret,
            token_ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.token_ttl_hours),
            bcrypt_cost: std::env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bcrypt_cost),
            reset_token_ttl_min: std::env::var("RESET_TOKEN_TTL_MIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reset_token_ttl_min),
        }
    }
}

/// JWT claims carried in bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Issued at, seconds since epoch.
    pub iat: i64,
}

/// Prepared signing/verification keys plus token lifetime.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, token_ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(token_ttl_hours),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_hours)
    }

    /// Issue a signed bearer token for a user.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.value(),
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AuthError::Sign(e.to_string()))
    }

    /// Verify a bearer token and return its subject.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| AuthError::InvalidToken)?;
        Ok(UserId::new(data.claims.sub))
    }
}

/// Hash a password with bcrypt.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Verify a password against its bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Hash(e.to_string()))
}

/// Generate a fresh reset token and the digest to persist for it.
pub fn generate_reset_token() -> (String, String) {
    let token = Uuid::new_v4().to_string();
    let digest = digest_reset_token(&token);
    (token, digest)
}

/// sha256 hex digest of a reset token.
pub fn digest_reset_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
