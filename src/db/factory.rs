//! Factory for creating repository instances.

use std::sync::Arc;

use super::repository::{FullRepository, RepositoryResult};

/// Available repository backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory backend for tests and local development.
    Local,
    /// SQLite file backend.
    Sqlite,
}

/// Factory for constructing repository instances.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create an in-memory repository.
    #[cfg(feature = "local-repo")]
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(super::repositories::LocalRepository::new())
    }

    /// Create a SQLite repository, running migrations.
    #[cfg(feature = "sqlite-repo")]
    pub fn create_sqlite(
        config: &super::repositories::SqliteConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo = super::repositories::SqliteRepository::new(config.clone())?;
        Ok(Arc::new(repo))
    }
}
