//! Account business logic: registration, login and password reset.

use chrono::{DateTime, Duration, Utc};

use crate::api::{NewUser, ResetToken, User};
use crate::auth::{self, AuthConfig, AuthError, JwtKeys};
use crate::db::repository::{FullRepository, RepositoryError};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// Errors from account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

pub type AccountResult<T> = Result<T, AccountError>;

fn validate_password(password: &str) -> AccountResult<()> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Register a new user and issue their first bearer token.
pub async fn register(
    repo: &dyn FullRepository,
    config: &AuthConfig,
    keys: &JwtKeys,
    name: &str,
    email: &str,
    password: &str,
) -> AccountResult<(String, User)> {
    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(AccountError::Validation("name is required".to_string()));
    }
    if email.is_empty() || !email.contains('@') {
        return Err(AccountError::Validation(
            "a valid email is required".to_string(),
        ));
    }
    validate_password(password)?;

    let password_hash = auth::hash_password(password, config.bcrypt_cost)?;
    let user = repo
        .create_user(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    let token = keys.issue(user.id)?;
    Ok((token, user))
}

/// Verify credentials and issue a bearer token.
pub async fn login(
    repo: &dyn FullRepository,
    keys: &JwtKeys,
    email: &str,
    password: &str,
) -> AccountResult<(String, User)> {
    let credentials = repo
        .find_credentials_by_email(email.trim())
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    if !auth::verify_password(password, &credentials.password_hash)? {
        return Err(AccountError::InvalidCredentials);
    }

    let token = keys.issue(credentials.user.id)?;
    Ok((token, credentials.user))
}

/// Issue a password reset token for an email address.
///
/// Returns `None` for unknown emails so callers can answer uniformly and
/// avoid account probing. Token delivery is the caller's concern.
pub async fn request_password_reset(
    repo: &dyn FullRepository,
    config: &AuthConfig,
    email: &str,
) -> AccountResult<Option<(String, DateTime<Utc>)>> {
    let Some(credentials) = repo.find_credentials_by_email(email.trim()).await? else {
        return Ok(None);
    };

    let (token, digest) = auth::generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(config.reset_token_ttl_min);
    repo.store_reset_token(ResetToken {
        token_digest: digest,
        user_id: credentials.user.id,
        expires_at,
        used: false,
    })
    .await?;

    Ok(Some((token, expires_at)))
}

/// Consume a reset token and set a new password.
pub async fn confirm_password_reset(
    repo: &dyn FullRepository,
    config: &AuthConfig,
    token: &str,
    new_password: &str,
) -> AccountResult<()> {
    validate_password(new_password)?;

    let digest = auth::digest_reset_token(token);
    let user_id = repo
        .consume_reset_token(&digest, Utc::now())
        .await?
        .ok_or_else(|| {
            AccountError::Validation("invalid or expired reset token".to_string())
        })?;

    let password_hash = auth::hash_password(new_password, config.bcrypt_cost)?;
    repo.update_password_hash(user_id, &password_hash).await?;
    Ok(())
}
