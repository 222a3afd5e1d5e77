//! Persistence layer.
//!
//! This module provides abstractions for database operations via the
//! repository pattern, allowing different storage backends to be swapped:
//!
//! - `repository`: trait definitions and the repository error type
//! - `repositories::sqlite`: SQLite implementation with Diesel ORM
//! - `repositories::local`: in-memory implementation for unit testing and
//!   local development
//! - `factory`: factory for creating repository instances
//!
//! Feature flag priority: sqlite > local. When both backends are enabled,
//! SQLite takes precedence.

#[cfg(not(any(feature = "sqlite-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType};
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
#[cfg(feature = "sqlite-repo")]
pub use repositories::{SqliteConfig, SqliteRepository};
pub use repository::{
    FullRepository, RecordRepository, RepositoryError, RepositoryResult, SummaryRepository,
    TaskRepository, UserRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

#[cfg(feature = "sqlite-repo")]
fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    let config = SqliteConfig::from_env();
    RepositoryFactory::create_sqlite(&config)
}

#[cfg(all(feature = "local-repo", not(feature = "sqlite-repo")))]
fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    Ok(RepositoryFactory::create_local())
}

/// Initialize the global repository singleton for the selected backend.
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let repo = create_selected_repository().map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        let _ = init_repository();
    }

    REPOSITORY
        .get()
        .context("Database not initialized. Call init_repository() first.")
}
