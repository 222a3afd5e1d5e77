//! Row types for the SQLite backend and their conversions to domain types.
//!
//! Timestamps are stored as RFC 3339 text, dates as `YYYY-MM-DD` and times of
//! day as `HH:MM`, matching what the HTTP layer exchanges.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use diesel::prelude::*;

use super::schema::{
    gym_progress, meal_logs, password_reset_tokens, reading_progress, shopping_list_items, tasks,
    users,
};
use crate::api::{
    GymProgress, GymRoutine, ItemId, MealLog, MealType, ReadingProgress, ResetToken, ShoppingItem,
    Task, TaskId, TaskKind, User, UserId,
};
use crate::db::repository::{RepositoryError, RepositoryResult};

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn parse_datetime(s: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::internal(format!("Bad timestamp '{}': {}", s, e)))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn parse_date(s: &str) -> RepositoryResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| RepositoryError::internal(format!("Bad date '{}': {}", s, e)))
}

pub fn format_time(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_time(s: &str) -> RepositoryResult<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| RepositoryError::internal(format!("Bad time '{}': {}", s, e)))
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> RepositoryResult<User> {
        Ok(User {
            id: UserId::new(self.id),
            name: self.name,
            email: self.email,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TaskRow {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub kind: String,
    pub completed: bool,
    pub due_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: String,
}

impl TaskRow {
    pub fn into_task(self) -> RepositoryResult<Task> {
        Ok(Task {
            id: TaskId::new(self.id),
            user_id: UserId::new(self.user_id),
            title: self.title,
            kind: TaskKind::from_str_lossy(&self.kind),
            completed: self.completed,
            due_date: parse_date(&self.due_date)?,
            start_time: self.start_time.as_deref().map(parse_time).transpose()?,
            end_time: self.end_time.as_deref().map(parse_time).transpose()?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    pub user_id: i64,
    pub title: String,
    pub kind: String,
    pub completed: bool,
    pub due_date: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = meal_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MealLogRow {
    pub task_id: i64,
    pub meal_type: String,
    pub foods_text: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MealLogRow {
    pub fn into_meal_log(self) -> MealLog {
        MealLog {
            task_id: TaskId::new(self.task_id),
            meal_type: MealType::from_str_lossy(&self.meal_type),
            foods_text: self.foods_text,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
        }
    }

    pub fn from_meal_log(log: &MealLog) -> Self {
        Self {
            task_id: log.task_id.value(),
            meal_type: log.meal_type.as_str().to_string(),
            foods_text: log.foods_text.clone(),
            calories: log.calories,
            protein: log.protein,
            carbs: log.carbs,
            fat: log.fat,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reading_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReadingProgressRow {
    pub task_id: i64,
    pub book_title: String,
    pub pages_read: i32,
    pub total_pages: Option<i32>,
}

impl ReadingProgressRow {
    pub fn into_reading_progress(self) -> ReadingProgress {
        ReadingProgress {
            task_id: TaskId::new(self.task_id),
            book_title: self.book_title,
            pages_read: self.pages_read,
            total_pages: self.total_pages,
        }
    }

    pub fn from_reading_progress(progress: &ReadingProgress) -> Self {
        Self {
            task_id: progress.task_id.value(),
            book_title: progress.book_title.clone(),
            pages_read: progress.pages_read,
            total_pages: progress.total_pages,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = gym_progress)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GymProgressRow {
    pub task_id: i64,
    pub countdown_sec: i32,
    pub work_sec: i32,
    pub rest_sec: i32,
    pub rounds: i32,
    pub rounds_completed: i32,
    pub completed_at: Option<String>,
}

impl GymProgressRow {
    pub fn into_gym_progress(self) -> RepositoryResult<GymProgress> {
        Ok(GymProgress {
            task_id: TaskId::new(self.task_id),
            routine: GymRoutine {
                countdown_sec: self.countdown_sec.max(0) as u32,
                work_sec: self.work_sec.max(0) as u32,
                rest_sec: self.rest_sec.max(0) as u32,
                rounds: self.rounds.max(0) as u32,
            },
            rounds_completed: self.rounds_completed,
            completed_at: self.completed_at.as_deref().map(parse_datetime).transpose()?,
        })
    }

    pub fn new_routine(task_id: TaskId, routine: &GymRoutine) -> Self {
        Self {
            task_id: task_id.value(),
            countdown_sec: routine.countdown_sec as i32,
            work_sec: routine.work_sec as i32,
            rest_sec: routine.rest_sec as i32,
            rounds: routine.rounds as i32,
            rounds_completed: 0,
            completed_at: None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shopping_list_items)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShoppingItemRow {
    pub id: i64,
    pub task_id: i64,
    pub name: String,
    pub quantity: i32,
    pub purchased: bool,
}

impl ShoppingItemRow {
    pub fn into_shopping_item(self) -> ShoppingItem {
        ShoppingItem {
            id: ItemId::new(self.id),
            task_id: TaskId::new(self.task_id),
            name: self.name,
            quantity: self.quantity,
            purchased: self.purchased,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shopping_list_items)]
pub struct NewShoppingItemRow {
    pub task_id: i64,
    pub name: String,
    pub quantity: i32,
    pub purchased: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = password_reset_tokens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ResetTokenRow {
    pub token_digest: String,
    pub user_id: i64,
    pub expires_at: String,
    pub used: bool,
}

impl ResetTokenRow {
    pub fn from_reset_token(token: &ResetToken) -> Self {
        Self {
            token_digest: token.token_digest.clone(),
            user_id: token.user_id.value(),
            expires_at: format_datetime(token.expires_at),
            used: token.used,
        }
    }
}
