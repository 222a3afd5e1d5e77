//! Request and response DTOs for the REST API.
//!
//! Domain types from [`crate::api`] serialize directly where they already
//! match the wire shape; this module only adds the request envelopes and
//! the response wrappers that differ from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{MealType, Task, TaskFilter, TaskId, User};

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Response to a reset request. The token is returned in the body because
/// delivering it out of band is outside this service; the message is the
/// same whether or not the email was known.
#[derive(Debug, Serialize, Deserialize)]
pub struct PasswordResetResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirmRequest {
    pub token: String,
    pub new_password: String,
}

// =============================================================================
// Tasks
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    /// Due date in `YYYY-MM-DD`; defaults to today.
    pub due_date: Option<NaiveDate>,
    /// Optional start time in `HH:MM`.
    pub start_time: Option<String>,
    /// Optional end time in `HH:MM`.
    pub end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTitleRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SetCompletedRequest {
    pub completed: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Completion filter: `all`, `pending` or `done`.
    pub filter: Option<TaskFilter>,
    /// Restrict to tasks due on this date.
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: usize,
}

// =============================================================================
// Sub-records
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct MealLogRequest {
    pub meal_type: MealType,
    pub foods_text: String,
    #[serde(default)]
    pub calories: f64,
    #[serde(default)]
    pub protein: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub fat: f64,
}

#[derive(Debug, Deserialize)]
pub struct ReadingProgressRequest {
    pub book_title: String,
    #[serde(default)]
    pub pages_read: i32,
    pub total_pages: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct GymRoutineRequest {
    #[serde(default)]
    pub countdown_sec: u32,
    pub work_sec: u32,
    pub rest_sec: u32,
    pub rounds: u32,
}

#[derive(Debug, Deserialize)]
pub struct ShoppingItemRequest {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct SetPurchasedRequest {
    pub purchased: bool,
}

// =============================================================================
// Timer sessions
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub task_id: TaskId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub message: String,
}
