//! SQLite repository implementation using Diesel.
//!
//! This is the production backend: a single database file, an r2d2
//! connection pool and embedded migrations run at startup.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DAYLINE_DB_PATH` or `DATABASE_URL`: path of the database file
//!   (default: `dayline.db`)
//! - `DAYLINE_POOL_MAX`: maximum pool size (default: 8)
//! - `DAYLINE_BUSY_TIMEOUT_MS`: SQLite busy timeout (default: 5000)
//! - `DAYLINE_MAX_RETRIES`: retry attempts for locked-database errors
//!   (default: 3)
//! - `DAYLINE_RETRY_DELAY_MS`: initial retry delay, doubles per attempt
//!   (default: 50)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::time::Duration;
use tokio::task;

use crate::api::{
    DaySummary, GymProgress, GymRoutine, ItemId, MealLog, NewShoppingItem, NewTask, NewUser,
    NutritionTotals, ReadingProgress, ResetToken, ShoppingItem, ShoppingTotals, Task, TaskFilter,
    TaskId, TaskKind, User, UserCredentials, UserId,
};
use crate::db::repository::{
    RecordRepository, RepositoryError, RepositoryResult, SummaryRepository, TaskRepository,
    UserRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type SqlitePool = Pool<ConnectionManager<SqliteConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/sqlite/migrations");

/// Configuration for the SQLite backend.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path of the database file.
    pub database_path: String,
    /// Maximum number of connections in the pool.
    pub max_pool_size: u32,
    /// SQLite busy timeout applied to every connection, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Maximum retry attempts for locked-database errors.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry).
    pub retry_delay_ms: u64,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            database_path: "dayline.db".to_string(),
            max_pool_size: 8,
            busy_timeout_ms: 5000,
            max_retries: 3,
            retry_delay_ms: 50,
        }
    }
}

impl SqliteConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        let database_path = std::env::var("DAYLINE_DB_PATH")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| "dayline.db".to_string());

        let max_pool_size = std::env::var("DAYLINE_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(8);

        let busy_timeout_ms = std::env::var("DAYLINE_BUSY_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5000);

        let max_retries = std::env::var("DAYLINE_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("DAYLINE_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(50);

        Self {
            database_path,
            max_pool_size,
            busy_timeout_ms,
            max_retries,
            retry_delay_ms,
        }
    }

    /// Create a new configuration with a database file path.
    pub fn with_path(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Default::default()
        }
    }
}

/// Per-connection pragmas: referential integrity and lock patience.
#[derive(Debug)]
struct ConnectionPragmas {
    busy_timeout_ms: u64,
}

impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionPragmas
{
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Diesel-backed repository over a SQLite file.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
    config: SqliteConfig,
}

impl SqliteRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: SqliteConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<SqliteConnection>::new(&config.database_path);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .connection_customizer(Box::new(ConnectionPragmas {
                busy_timeout_ms: config.busy_timeout_ms,
            }))
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection(format!(
                    "Failed to open {}: {}",
                    config.database_path, e
                ))
            })?;

        {
            let mut conn = pool.get()?;
            conn.run_pending_migrations(MIGRATIONS)
                .map_err(|e| RepositoryError::internal(format!("Migration failed: {}", e)))?;
        }

        Ok(Self { pool, config })
    }

    /// Execute a database operation on a blocking thread, retrying
    /// locked-database errors with exponential backoff.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection(e.to_string());
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        return Err(err);
                    }
                };

                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if is_locked_error(&e) && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }

            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| RepositoryError::internal(format!("Task join error: {}", e)))?
    }
}

fn is_locked_error(err: &RepositoryError) -> bool {
    matches!(err, RepositoryError::Query(msg) if msg.contains("locked"))
}

/// Verify that a task exists and belongs to the user. Foreign tasks behave
/// like missing tasks.
fn owned_task(
    conn: &mut SqliteConnection,
    user_id: UserId,
    task_id: TaskId,
) -> RepositoryResult<()> {
    let n: i64 = tasks::table
        .filter(tasks::id.eq(task_id.value()))
        .filter(tasks::user_id.eq(user_id.value()))
        .count()
        .get_result(conn)?;
    if n == 0 {
        return Err(RepositoryError::not_found(format!(
            "Task {} not found",
            task_id.value()
        )));
    }
    Ok(())
}

/// Resolve the parent task of a shopping item, verifying ownership.
fn owned_item_task(
    conn: &mut SqliteConnection,
    user_id: UserId,
    item_id: ItemId,
) -> RepositoryResult<i64> {
    let task_id: Option<i64> = shopping_list_items::table
        .inner_join(tasks::table)
        .filter(shopping_list_items::id.eq(item_id.value()))
        .filter(tasks::user_id.eq(user_id.value()))
        .select(shopping_list_items::task_id)
        .first(conn)
        .optional()?;
    task_id.ok_or_else(|| {
        RepositoryError::not_found(format!("Item {} not found", item_id.value()))
    })
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(RepositoryError::from)
        })
        .await
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        self.with_conn(move |conn| {
            let row = NewUserRow {
                name: new_user.name.clone(),
                email: new_user.email.to_lowercase(),
                password_hash: new_user.password_hash.clone(),
                created_at: format_datetime(Utc::now()),
            };
            let inserted: UserRow = diesel::insert_into(users::table)
                .values(&row)
                .returning(UserRow::as_returning())
                .get_result(conn)?;
            inserted.into_user()
        })
        .await
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let email = email.to_lowercase();
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .filter(users::email.eq(&email))
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            row.map(|r| {
                let password_hash = r.password_hash.clone();
                Ok(UserCredentials {
                    user: r.into_user()?,
                    password_hash,
                })
            })
            .transpose()
        })
        .await
    }

    async fn find_user_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn(move |conn| {
            let row: Option<UserRow> = users::table
                .find(user_id.value())
                .select(UserRow::as_select())
                .first(conn)
                .optional()?;
            row.map(UserRow::into_user).transpose()
        })
        .await
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> RepositoryResult<()> {
        let password_hash = password_hash.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(users::table.find(user_id.value()))
                .set(users::password_hash.eq(&password_hash))
                .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "User {} not found",
                    user_id.value()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn store_reset_token(&self, token: ResetToken) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let row = ResetTokenRow::from_reset_token(&token);
            diesel::insert_into(password_reset_tokens::table)
                .values(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn consume_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<UserId>> {
        let digest = token_digest.to_string();
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                let row: Option<ResetTokenRow> = password_reset_tokens::table
                    .find(&digest)
                    .select(ResetTokenRow::as_select())
                    .first(tx)
                    .optional()?;

                let Some(row) = row else { return Ok(None) };
                if row.used || parse_datetime(&row.expires_at)? <= now {
                    return Ok(None);
                }

                diesel::update(password_reset_tokens::table.find(&digest))
                    .set(password_reset_tokens::used.eq(true))
                    .execute(tx)?;
                Ok(Some(UserId::new(row.user_id)))
            })
        })
        .await
    }
}

#[async_trait]
impl TaskRepository for SqliteRepository {
    async fn create_task(&self, new_task: NewTask) -> RepositoryResult<Task> {
        self.with_conn(move |conn| {
            let row = NewTaskRow {
                user_id: new_task.user_id.value(),
                title: new_task.title.clone(),
                kind: new_task.kind.as_str().to_string(),
                completed: false,
                due_date: format_date(new_task.due_date),
                start_time: new_task.start_time.map(format_time),
                end_time: new_task.end_time.map(format_time),
                created_at: format_datetime(Utc::now()),
            };
            let inserted: TaskRow = diesel::insert_into(tasks::table)
                .values(&row)
                .returning(TaskRow::as_returning())
                .get_result(conn)?;
            inserted.into_task()
        })
        .await
    }

    async fn get_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<Task> {
        self.with_conn(move |conn| {
            let row: Option<TaskRow> = tasks::table
                .filter(tasks::id.eq(task_id.value()))
                .filter(tasks::user_id.eq(user_id.value()))
                .select(TaskRow::as_select())
                .first(conn)
                .optional()?;
            row.ok_or_else(|| {
                RepositoryError::not_found(format!("Task {} not found", task_id.value()))
            })?
            .into_task()
        })
        .await
    }

    async fn list_tasks(
        &self,
        user_id: UserId,
        filter: TaskFilter,
        date: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<Task>> {
        self.with_conn(move |conn| {
            let mut query = tasks::table
                .filter(tasks::user_id.eq(user_id.value()))
                .into_boxed();
            match filter {
                TaskFilter::All => {}
                TaskFilter::Pending => query = query.filter(tasks::completed.eq(false)),
                TaskFilter::Done => query = query.filter(tasks::completed.eq(true)),
            }
            if let Some(d) = date {
                query = query.filter(tasks::due_date.eq(format_date(d)));
            }
            let rows: Vec<TaskRow> = query
                .order(tasks::id.desc())
                .select(TaskRow::as_select())
                .load(conn)?;
            rows.into_iter().map(TaskRow::into_task).collect()
        })
        .await
    }

    async fn update_task_title(
        &self,
        user_id: UserId,
        task_id: TaskId,
        title: &str,
        kind: TaskKind,
    ) -> RepositoryResult<()> {
        let title = title.to_string();
        self.with_conn(move |conn| {
            let affected = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.value()))
                    .filter(tasks::user_id.eq(user_id.value())),
            )
            .set((tasks::title.eq(&title), tasks::kind.eq(kind.as_str())))
            .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Task {} not found",
                    task_id.value()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn set_task_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
        completed: bool,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            let affected = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.value()))
                    .filter(tasks::user_id.eq(user_id.value())),
            )
            .set(tasks::completed.eq(completed))
            .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Task {} not found",
                    task_id.value()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            // Sub-records are removed by ON DELETE CASCADE.
            let affected = diesel::delete(
                tasks::table
                    .filter(tasks::id.eq(task_id.value()))
                    .filter(tasks::user_id.eq(user_id.value())),
            )
            .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "Task {} not found",
                    task_id.value()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn delete_completed_tasks(&self, user_id: UserId) -> RepositoryResult<usize> {
        self.with_conn(move |conn| {
            let affected = diesel::delete(
                tasks::table
                    .filter(tasks::user_id.eq(user_id.value()))
                    .filter(tasks::completed.eq(true)),
            )
            .execute(conn)?;
            Ok(affected)
        })
        .await
    }
}

#[async_trait]
impl RecordRepository for SqliteRepository {
    async fn upsert_meal_log(&self, user_id: UserId, log: MealLog) -> RepositoryResult<MealLog> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, log.task_id)?;
            let row = MealLogRow::from_meal_log(&log);
            diesel::replace_into(meal_logs::table)
                .values(&row)
                .execute(conn)?;
            Ok(log.clone())
        })
        .await
    }

    async fn get_meal_log(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<MealLog>> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let row: Option<MealLogRow> = meal_logs::table
                .find(task_id.value())
                .select(MealLogRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(MealLogRow::into_meal_log))
        })
        .await
    }

    async fn upsert_reading_progress(
        &self,
        user_id: UserId,
        progress: ReadingProgress,
    ) -> RepositoryResult<ReadingProgress> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, progress.task_id)?;
            let row = ReadingProgressRow::from_reading_progress(&progress);
            diesel::replace_into(reading_progress::table)
                .values(&row)
                .execute(conn)?;
            Ok(progress.clone())
        })
        .await
    }

    async fn get_reading_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<ReadingProgress>> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let row: Option<ReadingProgressRow> = reading_progress::table
                .find(task_id.value())
                .select(ReadingProgressRow::as_select())
                .first(conn)
                .optional()?;
            Ok(row.map(ReadingProgressRow::into_reading_progress))
        })
        .await
    }

    async fn upsert_gym_routine(
        &self,
        user_id: UserId,
        task_id: TaskId,
        routine: GymRoutine,
    ) -> RepositoryResult<GymProgress> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let row = GymProgressRow::new_routine(task_id, &routine);
            diesel::replace_into(gym_progress::table)
                .values(&row)
                .execute(conn)?;
            row.into_gym_progress()
        })
        .await
    }

    async fn get_gym_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<GymProgress>> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let row: Option<GymProgressRow> = gym_progress::table
                .find(task_id.value())
                .select(GymProgressRow::as_select())
                .first(conn)
                .optional()?;
            row.map(GymProgressRow::into_gym_progress).transpose()
        })
        .await
    }

    async fn record_gym_result(
        &self,
        user_id: UserId,
        task_id: TaskId,
        rounds_completed: i32,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let affected = diesel::update(gym_progress::table.find(task_id.value()))
                .set((
                    gym_progress::rounds_completed.eq(rounds_completed),
                    gym_progress::completed_at.eq(Some(format_datetime(completed_at))),
                ))
                .execute(conn)?;
            if affected == 0 {
                return Err(RepositoryError::not_found(format!(
                    "No gym routine for task {}",
                    task_id.value()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn add_shopping_item(
        &self,
        user_id: UserId,
        task_id: TaskId,
        item: NewShoppingItem,
    ) -> RepositoryResult<ShoppingItem> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let row = NewShoppingItemRow {
                task_id: task_id.value(),
                name: item.name.clone(),
                quantity: item.quantity,
                purchased: false,
            };
            let inserted: ShoppingItemRow = diesel::insert_into(shopping_list_items::table)
                .values(&row)
                .returning(ShoppingItemRow::as_returning())
                .get_result(conn)?;
            Ok(inserted.into_shopping_item())
        })
        .await
    }

    async fn list_shopping_items(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ShoppingItem>> {
        self.with_conn(move |conn| {
            owned_task(conn, user_id, task_id)?;
            let rows: Vec<ShoppingItemRow> = shopping_list_items::table
                .filter(shopping_list_items::task_id.eq(task_id.value()))
                .order(shopping_list_items::id.asc())
                .select(ShoppingItemRow::as_select())
                .load(conn)?;
            Ok(rows
                .into_iter()
                .map(ShoppingItemRow::into_shopping_item)
                .collect())
        })
        .await
    }

    async fn set_item_purchased(
        &self,
        user_id: UserId,
        item_id: ItemId,
        purchased: bool,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            owned_item_task(conn, user_id, item_id)?;
            diesel::update(shopping_list_items::table.find(item_id.value()))
                .set(shopping_list_items::purchased.eq(purchased))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn delete_shopping_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> RepositoryResult<()> {
        self.with_conn(move |conn| {
            owned_item_task(conn, user_id, item_id)?;
            diesel::delete(shopping_list_items::table.find(item_id.value())).execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl SummaryRepository for SqliteRepository {
    async fn fetch_day_summary(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<DaySummary> {
        self.with_conn(move |conn| {
            let day = format_date(date);
            let uid = user_id.value();

            let task_rows: Vec<TaskRow> = tasks::table
                .filter(tasks::user_id.eq(uid))
                .filter(tasks::due_date.eq(&day))
                .order(tasks::id.desc())
                .select(TaskRow::as_select())
                .load(conn)?;

            let meal_rows: Vec<MealLogRow> = meal_logs::table
                .inner_join(tasks::table)
                .filter(tasks::user_id.eq(uid))
                .filter(tasks::due_date.eq(&day))
                .select(MealLogRow::as_select())
                .load(conn)?;

            let reading_rows: Vec<ReadingProgressRow> = reading_progress::table
                .inner_join(tasks::table)
                .filter(tasks::user_id.eq(uid))
                .filter(tasks::due_date.eq(&day))
                .select(ReadingProgressRow::as_select())
                .load(conn)?;

            let gym_rows: Vec<GymProgressRow> = gym_progress::table
                .inner_join(tasks::table)
                .filter(tasks::user_id.eq(uid))
                .filter(tasks::due_date.eq(&day))
                .select(GymProgressRow::as_select())
                .load(conn)?;

            let item_rows: Vec<ShoppingItemRow> = shopping_list_items::table
                .inner_join(tasks::table)
                .filter(tasks::user_id.eq(uid))
                .filter(tasks::due_date.eq(&day))
                .select(ShoppingItemRow::as_select())
                .load(conn)?;

            let mut nutrition = NutritionTotals::default();
            for row in &meal_rows {
                nutrition.calories += row.calories;
                nutrition.protein += row.protein;
                nutrition.carbs += row.carbs;
                nutrition.fat += row.fat;
            }

            let pages_read = reading_rows.iter().map(|r| r.pages_read as i64).sum();
            let gym_rounds_completed = gym_rows.iter().map(|r| r.rounds_completed as i64).sum();
            let shopping = ShoppingTotals {
                items: item_rows.len() as i64,
                purchased: item_rows.iter().filter(|i| i.purchased).count() as i64,
            };

            let total_tasks = task_rows.len() as i64;
            let completed_tasks = task_rows.iter().filter(|t| t.completed).count() as i64;
            let tasks = task_rows
                .into_iter()
                .map(TaskRow::into_task)
                .collect::<RepositoryResult<Vec<Task>>>()?;

            Ok(DaySummary {
                date,
                tasks,
                total_tasks,
                completed_tasks,
                nutrition,
                pages_read,
                gym_rounds_completed,
                shopping,
            })
        })
        .await
    }
}
