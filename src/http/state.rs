//! Application state for the HTTP server.

use std::sync::Arc;

use crate::auth::{AuthConfig, JwtKeys};
use crate::db::repository::FullRepository;
use crate::services::TimerRegistry;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for database operations
    pub repository: Arc<dyn FullRepository>,
    /// Authentication configuration (bcrypt cost, token lifetimes)
    pub auth_config: AuthConfig,
    /// Prepared JWT signing/verification keys
    pub keys: JwtKeys,
    /// In-memory gym timer sessions
    pub timers: TimerRegistry,
}

impl AppState {
    /// Create application state from a repository and auth configuration.
    pub fn new(repository: Arc<dyn FullRepository>, auth_config: AuthConfig) -> Self {
        let keys = JwtKeys::from_config(&auth_config);
        Self {
            repository,
            auth_config,
            keys,
            timers: TimerRegistry::new(),
        }
    }
}
