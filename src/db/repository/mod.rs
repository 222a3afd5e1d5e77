//! Repository trait definitions.
//!
//! The repository pattern decouples the service and HTTP layers from the
//! storage backend. `FullRepository` is the umbrella trait the application
//! is wired against; backends implement the individual traits.

mod error;
mod records;
mod summary;
mod tasks;
mod users;

pub use error::{RepositoryError, RepositoryResult};
pub use records::RecordRepository;
pub use summary::SummaryRepository;
pub use tasks::TaskRepository;
pub use users::UserRepository;

/// Umbrella trait combining every repository capability.
pub trait FullRepository:
    UserRepository + TaskRepository + RecordRepository + SummaryRepository
{
}

impl<T> FullRepository for T where
    T: UserRepository + TaskRepository + RecordRepository + SummaryRepository
{
}
