//! Core domain types shared between the repository, service and HTTP layers.
//!
//! These are plain serde-serializable structs; persistence-specific row types
//! live next to their repository implementation.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype wrapper around a user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Newtype wrapper around a task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl TaskId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// Newtype wrapper around a shopping list item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

/// A registered user. The password hash never leaves the repository layer
/// except through [`UserCredentials`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// User row together with its bcrypt password hash, used only during login.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Parameters for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Task category derived from keyword heuristics on the title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Plain,
    Food,
    Reading,
    Gym,
    Shopping,
}

impl TaskKind {
    /// Stable string form used for persistence.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Plain => "plain",
            TaskKind::Food => "food",
            TaskKind::Reading => "reading",
            TaskKind::Gym => "gym",
            TaskKind::Shopping => "shopping",
        }
    }

    /// Parse the persisted string form; unknown values fall back to plain.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "food" => TaskKind::Food,
            "reading" => TaskKind::Reading,
            "gym" => TaskKind::Gym,
            "shopping" => TaskKind::Shopping,
            _ => TaskKind::Plain,
        }
    }
}

/// A daily task owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub title: String,
    pub kind: TaskKind,
    pub completed: bool,
    pub due_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub user_id: UserId,
    pub title: String,
    pub kind: TaskKind,
    pub due_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

/// Completion filter for task listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Done,
}

/// Meal slot for a nutrition log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "breakfast" => MealType::Breakfast,
            "dinner" => MealType::Dinner,
            "snack" => MealType::Snack,
            _ => MealType::Lunch,
        }
    }
}

/// Nutrition log attached to a food task. One per task, upsert semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLog {
    pub task_id: TaskId,
    pub meal_type: MealType,
    pub foods_text: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Reading progress attached to a reading task. One per task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub task_id: TaskId,
    pub book_title: String,
    pub pages_read: i32,
    pub total_pages: Option<i32>,
}

/// Interval routine parameters for a gym task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GymRoutine {
    /// Initial countdown before the first work phase, in seconds.
    pub countdown_sec: u32,
    /// Duration of each work phase, in seconds.
    pub work_sec: u32,
    /// Duration of each rest phase, in seconds.
    pub rest_sec: u32,
    /// Number of work rounds.
    pub rounds: u32,
}

/// Gym sub-record: the configured routine plus completion results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymProgress {
    pub task_id: TaskId,
    pub routine: GymRoutine,
    pub rounds_completed: i32,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A single shopping list entry attached to a shopping task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub id: ItemId,
    pub task_id: TaskId,
    pub name: String,
    pub quantity: i32,
    pub purchased: bool,
}

/// Parameters for adding a shopping list item.
#[derive(Debug, Clone)]
pub struct NewShoppingItem {
    pub name: String,
    pub quantity: i32,
}

/// Summed macro-nutrients over one day of meal logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Shopping progress over one day of shopping tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingTotals {
    pub items: i64,
    pub purchased: i64,
}

/// One calendar day of tasks rolled up with their sub-records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub tasks: Vec<Task>,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub nutrition: NutritionTotals,
    pub pages_read: i64,
    pub gym_rounds_completed: i64,
    pub shopping: ShoppingTotals,
}

/// Password reset token issued for a user. Only the sha256 digest of the
/// token is persisted.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub token_digest: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}
