//! User and credential repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{NewUser, ResetToken, User, UserCredentials, UserId};

/// Repository trait for account and credential operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check database connectivity.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Create a user. Fails with `Conflict` if the email is already taken.
    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User>;

    /// Look up a user and password hash by email, for login.
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>>;

    /// Look up a user by id. Returns `None` when the user does not exist.
    async fn find_user_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>>;

    /// Replace a user's password hash.
    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> RepositoryResult<()>;

    /// Persist a password reset token digest for a user.
    async fn store_reset_token(&self, token: ResetToken) -> RepositoryResult<()>;

    /// Atomically consume a reset token by digest.
    ///
    /// Returns the owning user id when the token exists, is unused and has
    /// not expired at `now`; marks it used. Returns `None` otherwise.
    async fn consume_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<UserId>>;
}
