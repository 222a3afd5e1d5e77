//! Task repository trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::api::{NewTask, Task, TaskFilter, TaskId, TaskKind, UserId};

/// Repository trait for task CRUD.
///
/// Every operation is scoped by `user_id`; a task owned by another user
/// behaves exactly like a missing task (`NotFound`).
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a task and return it with its generated id.
    async fn create_task(&self, new_task: NewTask) -> RepositoryResult<Task>;

    /// Fetch a single task.
    async fn get_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<Task>;

    /// List tasks, newest first, optionally restricted to one due date.
    async fn list_tasks(
        &self,
        user_id: UserId,
        filter: TaskFilter,
        date: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<Task>>;

    /// Update a task title (and its re-derived kind).
    async fn update_task_title(
        &self,
        user_id: UserId,
        task_id: TaskId,
        title: &str,
        kind: TaskKind,
    ) -> RepositoryResult<()>;

    /// Set the completed flag.
    async fn set_task_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
        completed: bool,
    ) -> RepositoryResult<()>;

    /// Delete a task together with its sub-records.
    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<()>;

    /// Delete all completed tasks for the user. Returns the number removed.
    async fn delete_completed_tasks(&self, user_id: UserId) -> RepositoryResult<usize>;
}
