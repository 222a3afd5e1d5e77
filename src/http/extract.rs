//! Bearer token extraction.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use super::error::AppError;
use super::state::AppState;
use crate::api::{User, UserId};

/// The authenticated caller, extracted from the `Authorization` header.
///
/// Rejects with 401 when the header is missing or the token does not
/// verify, and with 403 when the token is valid but its user no longer
/// exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: UserId,
    pub user: User,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("missing Authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed Authorization header".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("expected a bearer token".to_string()))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user_id = state.keys.verify(token)?;

        let user = state
            .repository
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Forbidden("account no longer exists".to_string()))?;

        Ok(AuthUser { id: user_id, user })
    }
}
