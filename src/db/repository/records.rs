//! Sub-record repository trait: meal logs, reading progress, gym routines
//! and shopping list items attached to tasks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{
    GymProgress, GymRoutine, ItemId, MealLog, NewShoppingItem, ReadingProgress, ShoppingItem,
    TaskId, UserId,
};

/// Repository trait for the domain sub-records hanging off tasks.
///
/// Meal, reading and gym records are one-per-task with upsert semantics;
/// shopping items are many-per-task. All operations verify that the parent
/// task belongs to `user_id`.
#[async_trait]
pub trait RecordRepository: Send + Sync {
    // ==================== Meal logs ====================

    /// Insert or replace the meal log for a task.
    async fn upsert_meal_log(&self, user_id: UserId, log: MealLog) -> RepositoryResult<MealLog>;

    /// Fetch the meal log for a task, if any.
    async fn get_meal_log(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<MealLog>>;

    // ==================== Reading progress ====================

    /// Insert or replace the reading progress for a task.
    async fn upsert_reading_progress(
        &self,
        user_id: UserId,
        progress: ReadingProgress,
    ) -> RepositoryResult<ReadingProgress>;

    /// Fetch the reading progress for a task, if any.
    async fn get_reading_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<ReadingProgress>>;

    // ==================== Gym progress ====================

    /// Insert or replace the routine for a gym task. Existing completion
    /// results are reset.
    async fn upsert_gym_routine(
        &self,
        user_id: UserId,
        task_id: TaskId,
        routine: GymRoutine,
    ) -> RepositoryResult<GymProgress>;

    /// Fetch the gym sub-record for a task, if any.
    async fn get_gym_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<GymProgress>>;

    /// Record the outcome of a finished (or abandoned) timer session.
    async fn record_gym_result(
        &self,
        user_id: UserId,
        task_id: TaskId,
        rounds_completed: i32,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    // ==================== Shopping list items ====================

    /// Append an item to a task's shopping list.
    async fn add_shopping_item(
        &self,
        user_id: UserId,
        task_id: TaskId,
        item: NewShoppingItem,
    ) -> RepositoryResult<ShoppingItem>;

    /// List the shopping items for a task, in insertion order.
    async fn list_shopping_items(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ShoppingItem>>;

    /// Set the purchased flag on an item.
    async fn set_item_purchased(
        &self,
        user_id: UserId,
        item_id: ItemId,
        purchased: bool,
    ) -> RepositoryResult<()>;

    /// Remove an item from its list.
    async fn delete_shopping_item(&self, user_id: UserId, item_id: ItemId)
        -> RepositoryResult<()>;
}
