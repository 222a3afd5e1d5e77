//! In-memory repository implementation.
//!
//! Backs the test suite and local development without a database file. Data
//! lives in process memory behind a `parking_lot` lock and is lost on
//! restart.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::api::{
    DaySummary, GymProgress, GymRoutine, ItemId, MealLog, NewShoppingItem, NewTask, NewUser,
    NutritionTotals, ReadingProgress, ResetToken, ShoppingItem, ShoppingTotals, Task, TaskFilter,
    TaskId, TaskKind, User, UserCredentials, UserId,
};
use crate::db::repository::{
    RecordRepository, RepositoryError, RepositoryResult, SummaryRepository, TaskRepository,
    UserRepository,
};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Store {
    users: HashMap<i64, UserRow>,
    tasks: HashMap<i64, Task>,
    meal_logs: HashMap<i64, MealLog>,
    reading: HashMap<i64, ReadingProgress>,
    gym: HashMap<i64, GymProgress>,
    shopping: HashMap<i64, ShoppingItem>,
    reset_tokens: HashMap<String, ResetToken>,
    next_user_id: i64,
    next_task_id: i64,
    next_item_id: i64,
}

impl Store {
    /// Fetch a task verifying ownership. Foreign tasks look like missing ones.
    fn owned_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<&Task> {
        self.tasks
            .get(&task_id.value())
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| RepositoryError::not_found(format!("Task {} not found", task_id.value())))
    }

    fn owned_item(&self, user_id: UserId, item_id: ItemId) -> RepositoryResult<&ShoppingItem> {
        let item = self
            .shopping
            .get(&item_id.value())
            .ok_or_else(|| RepositoryError::not_found(format!("Item {} not found", item_id.value())))?;
        self.owned_task(user_id, item.task_id)?;
        Ok(item)
    }
}

/// In-memory repository for unit testing and local development.
#[derive(Default)]
pub struct LocalRepository {
    store: RwLock<Store>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }

    async fn create_user(&self, new_user: NewUser) -> RepositoryResult<User> {
        let mut store = self.store.write();
        let email = new_user.email.to_lowercase();
        if store.users.values().any(|r| r.user.email == email) {
            return Err(RepositoryError::conflict(format!(
                "email {} is already registered",
                email
            )));
        }
        store.next_user_id += 1;
        let user = User {
            id: UserId::new(store.next_user_id),
            name: new_user.name,
            email,
            created_at: Utc::now(),
        };
        store.users.insert(
            user.id.value(),
            UserRow {
                user: user.clone(),
                password_hash: new_user.password_hash,
            },
        );
        Ok(user)
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let email = email.to_lowercase();
        let store = self.store.read();
        Ok(store
            .users
            .values()
            .find(|r| r.user.email == email)
            .map(|r| UserCredentials {
                user: r.user.clone(),
                password_hash: r.password_hash.clone(),
            }))
    }

    async fn find_user_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        let store = self.store.read();
        Ok(store.users.get(&user_id.value()).map(|r| r.user.clone()))
    }

    async fn update_password_hash(
        &self,
        user_id: UserId,
        password_hash: &str,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        let row = store
            .users
            .get_mut(&user_id.value())
            .ok_or_else(|| RepositoryError::not_found(format!("User {} not found", user_id.value())))?;
        row.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn store_reset_token(&self, token: ResetToken) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.reset_tokens.insert(token.token_digest.clone(), token);
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<UserId>> {
        let mut store = self.store.write();
        match store.reset_tokens.get_mut(token_digest) {
            Some(token) if !token.used && token.expires_at > now => {
                token.used = true;
                Ok(Some(token.user_id))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl TaskRepository for LocalRepository {
    async fn create_task(&self, new_task: NewTask) -> RepositoryResult<Task> {
        let mut store = self.store.write();
        store.next_task_id += 1;
        let task = Task {
            id: TaskId::new(store.next_task_id),
            user_id: new_task.user_id,
            title: new_task.title,
            kind: new_task.kind,
            completed: false,
            due_date: new_task.due_date,
            start_time: new_task.start_time,
            end_time: new_task.end_time,
            created_at: Utc::now(),
        };
        store.tasks.insert(task.id.value(), task.clone());
        Ok(task)
    }

    async fn get_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<Task> {
        let store = self.store.read();
        store.owned_task(user_id, task_id).cloned()
    }

    async fn list_tasks(
        &self,
        user_id: UserId,
        filter: TaskFilter,
        date: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<Task>> {
        let store = self.store.read();
        let mut tasks: Vec<Task> = store
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .filter(|t| match filter {
                TaskFilter::All => true,
                TaskFilter::Pending => !t.completed,
                TaskFilter::Done => t.completed,
            })
            .filter(|t| date.is_none_or(|d| t.due_date == d))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.id.value().cmp(&a.id.value()));
        Ok(tasks)
    }

    async fn update_task_title(
        &self,
        user_id: UserId,
        task_id: TaskId,
        title: &str,
        kind: TaskKind,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        let task = store.tasks.get_mut(&task_id.value()).expect("checked above");
        task.title = title.to_string();
        task.kind = kind;
        Ok(())
    }

    async fn set_task_completed(
        &self,
        user_id: UserId,
        task_id: TaskId,
        completed: bool,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        let task = store.tasks.get_mut(&task_id.value()).expect("checked above");
        task.completed = completed;
        Ok(())
    }

    async fn delete_task(&self, user_id: UserId, task_id: TaskId) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        let id = task_id.value();
        store.tasks.remove(&id);
        store.meal_logs.remove(&id);
        store.reading.remove(&id);
        store.gym.remove(&id);
        store.shopping.retain(|_, item| item.task_id != task_id);
        Ok(())
    }

    async fn delete_completed_tasks(&self, user_id: UserId) -> RepositoryResult<usize> {
        let mut store = self.store.write();
        let done: Vec<i64> = store
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.completed)
            .map(|t| t.id.value())
            .collect();
        for id in &done {
            store.tasks.remove(id);
            store.meal_logs.remove(id);
            store.reading.remove(id);
            store.gym.remove(id);
            store.shopping.retain(|_, item| item.task_id.value() != *id);
        }
        Ok(done.len())
    }
}

#[async_trait]
impl RecordRepository for LocalRepository {
    async fn upsert_meal_log(&self, user_id: UserId, log: MealLog) -> RepositoryResult<MealLog> {
        let mut store = self.store.write();
        store.owned_task(user_id, log.task_id)?;
        store.meal_logs.insert(log.task_id.value(), log.clone());
        Ok(log)
    }

    async fn get_meal_log(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<MealLog>> {
        let store = self.store.read();
        store.owned_task(user_id, task_id)?;
        Ok(store.meal_logs.get(&task_id.value()).cloned())
    }

    async fn upsert_reading_progress(
        &self,
        user_id: UserId,
        progress: ReadingProgress,
    ) -> RepositoryResult<ReadingProgress> {
        let mut store = self.store.write();
        store.owned_task(user_id, progress.task_id)?;
        store.reading.insert(progress.task_id.value(), progress.clone());
        Ok(progress)
    }

    async fn get_reading_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<ReadingProgress>> {
        let store = self.store.read();
        store.owned_task(user_id, task_id)?;
        Ok(store.reading.get(&task_id.value()).cloned())
    }

    async fn upsert_gym_routine(
        &self,
        user_id: UserId,
        task_id: TaskId,
        routine: GymRoutine,
    ) -> RepositoryResult<GymProgress> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        let progress = GymProgress {
            task_id,
            routine,
            rounds_completed: 0,
            completed_at: None,
        };
        store.gym.insert(task_id.value(), progress.clone());
        Ok(progress)
    }

    async fn get_gym_progress(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Option<GymProgress>> {
        let store = self.store.read();
        store.owned_task(user_id, task_id)?;
        Ok(store.gym.get(&task_id.value()).cloned())
    }

    async fn record_gym_result(
        &self,
        user_id: UserId,
        task_id: TaskId,
        rounds_completed: i32,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        let progress = store.gym.get_mut(&task_id.value()).ok_or_else(|| {
            RepositoryError::not_found(format!("No gym routine for task {}", task_id.value()))
        })?;
        progress.rounds_completed = rounds_completed;
        progress.completed_at = Some(completed_at);
        Ok(())
    }

    async fn add_shopping_item(
        &self,
        user_id: UserId,
        task_id: TaskId,
        item: NewShoppingItem,
    ) -> RepositoryResult<ShoppingItem> {
        let mut store = self.store.write();
        store.owned_task(user_id, task_id)?;
        store.next_item_id += 1;
        let item = ShoppingItem {
            id: ItemId::new(store.next_item_id),
            task_id,
            name: item.name,
            quantity: item.quantity,
            purchased: false,
        };
        store.shopping.insert(item.id.value(), item.clone());
        Ok(item)
    }

    async fn list_shopping_items(
        &self,
        user_id: UserId,
        task_id: TaskId,
    ) -> RepositoryResult<Vec<ShoppingItem>> {
        let store = self.store.read();
        store.owned_task(user_id, task_id)?;
        let mut items: Vec<ShoppingItem> = store
            .shopping
            .values()
            .filter(|i| i.task_id == task_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.id.value());
        Ok(items)
    }

    async fn set_item_purchased(
        &self,
        user_id: UserId,
        item_id: ItemId,
        purchased: bool,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_item(user_id, item_id)?;
        let item = store.shopping.get_mut(&item_id.value()).expect("checked above");
        item.purchased = purchased;
        Ok(())
    }

    async fn delete_shopping_item(
        &self,
        user_id: UserId,
        item_id: ItemId,
    ) -> RepositoryResult<()> {
        let mut store = self.store.write();
        store.owned_item(user_id, item_id)?;
        store.shopping.remove(&item_id.value());
        Ok(())
    }
}

#[async_trait]
impl SummaryRepository for LocalRepository {
    async fn fetch_day_summary(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> RepositoryResult<DaySummary> {
        let store = self.store.read();
        let mut tasks: Vec<Task> = store
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.due_date == date)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.id.value().cmp(&a.id.value()));

        let mut nutrition = NutritionTotals::default();
        let mut pages_read: i64 = 0;
        let mut gym_rounds_completed: i64 = 0;
        let mut shopping = ShoppingTotals::default();

        for task in &tasks {
            let id = task.id.value();
            if let Some(log) = store.meal_logs.get(&id) {
                nutrition.calories += log.calories;
                nutrition.protein += log.protein;
                nutrition.carbs += log.carbs;
                nutrition.fat += log.fat;
            }
            if let Some(progress) = store.reading.get(&id) {
                pages_read += progress.pages_read as i64;
            }
            if let Some(gym) = store.gym.get(&id) {
                gym_rounds_completed += gym.rounds_completed as i64;
            }
            for item in store.shopping.values().filter(|i| i.task_id == task.id) {
                shopping.items += 1;
                if item.purchased {
                    shopping.purchased += 1;
                }
            }
        }

        let total_tasks = tasks.len() as i64;
        let completed_tasks = tasks.iter().filter(|t| t.completed).count() as i64;

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
    }
}
