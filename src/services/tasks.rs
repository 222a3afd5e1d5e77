//! Task business logic: validation and keyword classification on top of the
//! task repository.

use chrono::{NaiveDate, NaiveTime, Utc};

use crate::api::{NewTask, Task, TaskId, UserId};
use crate::db::repository::{FullRepository, RepositoryError, RepositoryResult};
use crate::services::classifier::classify_title;

fn validated_title(title: &str) -> RepositoryResult<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RepositoryError::validation("title is required"));
    }
    Ok(title)
}

/// Create a task, deriving its kind from the title. The due date defaults
/// to today.
pub async fn create_task(
    repo: &dyn FullRepository,
    user_id: UserId,
    title: &str,
    due_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
) -> RepositoryResult<Task> {
    let title = validated_title(title)?;
    repo.create_task(NewTask {
        user_id,
        title: title.to_string(),
        kind: classify_title(title),
        due_date: due_date.unwrap_or_else(|| Utc::now().date_naive()),
        start_time,
        end_time,
    })
    .await
}

/// Rename a task, re-deriving its kind from the new title.
pub async fn rename_task(
    repo: &dyn FullRepository,
    user_id: UserId,
    task_id: TaskId,
    title: &str,
) -> RepositoryResult<()> {
    let title = validated_title(title)?;
    repo.update_task_title(user_id, task_id, title, classify_title(title))
        .await
}
