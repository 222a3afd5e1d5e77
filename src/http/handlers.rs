//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the
//! service layer or repository for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use chrono::NaiveDate;
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;

use super::dto::{
    AuthResponse, CreateSessionRequest, CreateSessionResponse, CreateTaskRequest,
    GymRoutineRequest, HealthResponse, LoginRequest, MealLogRequest,
    PasswordResetConfirmRequest, PasswordResetRequest, PasswordResetResponse, ReadingProgressRequest,
    RegisterRequest, SetCompletedRequest, SetPurchasedRequest, ShoppingItemRequest,
    TaskListQuery, TaskListResponse, UpdateTitleRequest,
};
use super::error::AppError;
use super::extract::AuthUser;
use super::state::AppState;
use crate::api::{
    DaySummary, GymProgress, GymRoutine, ItemId, MealLog, ReadingProgress, ShoppingItem, Task,
    TaskId,
};
use crate::services::{self, sessions::spawn_session_driver, SessionSnapshot, TimerEvent};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

fn parse_time(field: &str, value: Option<String>) -> Result<Option<chrono::NaiveTime>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };
    chrono::NaiveTime::parse_from_str(&value, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(&value, "%H:%M:%S"))
        .map(Some)
        .map_err(|_| AppError::BadRequest(format!("{} must be HH:MM", field)))
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Accounts
// =============================================================================

/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let (token, user) = services::account::register(
        state.repository.as_ref(),
        &state.auth_config,
        &state.keys,
        &request.name,
        &request.email,
        &request.password,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> HandlerResult<AuthResponse> {
    let (token, user) = services::account::login(
        state.repository.as_ref(),
        &state.keys,
        &request.email,
        &request.password,
    )
    .await?;

    Ok(Json(AuthResponse { token, user }))
}

/// POST /v1/auth/password-reset
///
/// The response is identical for known and unknown emails so the endpoint
/// cannot be used to probe for accounts.
pub async fn password_reset_request(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetRequest>,
) -> HandlerResult<PasswordResetResponse> {
    let issued = services::account::request_password_reset(
        state.repository.as_ref(),
        &state.auth_config,
        &request.email,
    )
    .await?;

    let (reset_token, expires_at) = match issued {
        Some((token, expires_at)) => (Some(token), Some(expires_at)),
        None => (None, None),
    };

    Ok(Json(PasswordResetResponse {
        message: "If the email is registered, a reset token has been issued".to_string(),
        reset_token,
        expires_at,
    }))
}

/// POST /v1/auth/password-reset/confirm
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    Json(request): Json<PasswordResetConfirmRequest>,
) -> Result<StatusCode, AppError> {
    services::account::confirm_password_reset(
        state.repository.as_ref(),
        &state.auth_config,
        &request.token,
        &request.new_password,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Task CRUD
// =============================================================================

/// GET /v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<TaskListQuery>,
) -> HandlerResult<TaskListResponse> {
    let tasks = state
        .repository
        .list_tasks(auth.id, query.filter.unwrap_or_default(), query.date)
        .await?;
    let total = tasks.len();

    Ok(Json(TaskListResponse { tasks, total }))
}

/// POST /v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let start_time = parse_time("start_time", request.start_time)?;
    let end_time = parse_time("end_time", request.end_time)?;

    let task = services::tasks::create_task(
        state.repository.as_ref(),
        auth.id,
        &request.title,
        request.due_date,
        start_time,
        end_time,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// GET /v1/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> HandlerResult<Task> {
    let task = state
        .repository
        .get_task(auth.id, TaskId::new(task_id))
        .await?;
    Ok(Json(task))
}

/// PUT /v1/tasks/{task_id}
pub async fn rename_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<StatusCode, AppError> {
    services::tasks::rename_task(
        state.repository.as_ref(),
        auth.id,
        TaskId::new(task_id),
        &request.title,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /v1/tasks/{task_id}
pub async fn set_task_completed(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<SetCompletedRequest>,
) -> Result<StatusCode, AppError> {
    state
        .repository
        .set_task_completed(auth.id, TaskId::new(task_id), request.completed)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .repository
        .delete_task(auth.id, TaskId::new(task_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/tasks/completed
pub async fn delete_completed_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, AppError> {
    state.repository.delete_completed_tasks(auth.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Sub-records
// =============================================================================

/// PUT /v1/tasks/{task_id}/meal
pub async fn put_meal_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<MealLogRequest>,
) -> HandlerResult<MealLog> {
    let log = state
        .repository
        .upsert_meal_log(
            auth.id,
            MealLog {
                task_id: TaskId::new(task_id),
                meal_type: request.meal_type,
                foods_text: request.foods_text,
                calories: request.calories,
                protein: request.protein,
                carbs: request.carbs,
                fat: request.fat,
            },
        )
        .await?;
    Ok(Json(log))
}

/// GET /v1/tasks/{task_id}/meal
pub async fn get_meal_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> HandlerResult<MealLog> {
    let log = state
        .repository
        .get_meal_log(auth.id, TaskId::new(task_id))
        .await?
        .ok_or_else(|| AppError::NotFound("no meal log for this task".to_string()))?;
    Ok(Json(log))
}

/// PUT /v1/tasks/{task_id}/reading
pub async fn put_reading_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<ReadingProgressRequest>,
) -> HandlerResult<ReadingProgress> {
    if request.pages_read < 0 {
        return Err(AppError::BadRequest(
            "pages_read must not be negative".to_string(),
        ));
    }
    let progress = state
        .repository
        .upsert_reading_progress(
            auth.id,
            ReadingProgress {
                task_id: TaskId::new(task_id),
                book_title: request.book_title,
                pages_read: request.pages_read,
                total_pages: request.total_pages,
            },
        )
        .await?;
    Ok(Json(progress))
}

/// GET /v1/tasks/{task_id}/reading
pub async fn get_reading_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> HandlerResult<ReadingProgress> {
    let progress = state
        .repository
        .get_reading_progress(auth.id, TaskId::new(task_id))
        .await?
        .ok_or_else(|| AppError::NotFound("no reading progress for this task".to_string()))?;
    Ok(Json(progress))
}

/// PUT /v1/tasks/{task_id}/gym
pub async fn put_gym_routine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<GymRoutineRequest>,
) -> HandlerResult<GymProgress> {
    let routine = GymRoutine {
        countdown_sec: request.countdown_sec,
        work_sec: request.work_sec,
        rest_sec: request.rest_sec,
        rounds: request.rounds,
    };
    // Catch invalid routines at configuration time, not at session start.
    crate::services::IntervalTimer::new(routine)?;

    let progress = state
        .repository
        .upsert_gym_routine(auth.id, TaskId::new(task_id), routine)
        .await?;
    Ok(Json(progress))
}

/// GET /v1/tasks/{task_id}/gym
pub async fn get_gym_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> HandlerResult<GymProgress> {
    let progress = state
        .repository
        .get_gym_progress(auth.id, TaskId::new(task_id))
        .await?
        .ok_or_else(|| AppError::NotFound("no gym routine for this task".to_string()))?;
    Ok(Json(progress))
}

/// POST /v1/tasks/{task_id}/shopping
pub async fn add_shopping_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
    Json(request): Json<ShoppingItemRequest>,
) -> Result<(StatusCode, Json<ShoppingItem>), AppError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("item name is required".to_string()));
    }
    if request.quantity < 1 {
        return Err(AppError::BadRequest(
            "quantity must be at least 1".to_string(),
        ));
    }

    let item = state
        .repository
        .add_shopping_item(
            auth.id,
            TaskId::new(task_id),
            crate::api::NewShoppingItem {
                name: name.to_string(),
                quantity: request.quantity,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// GET /v1/tasks/{task_id}/shopping
pub async fn list_shopping_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(task_id): Path<i64>,
) -> HandlerResult<Vec<ShoppingItem>> {
    let items = state
        .repository
        .list_shopping_items(auth.id, TaskId::new(task_id))
        .await?;
    Ok(Json(items))
}

/// PATCH /v1/shopping/{item_id}
pub async fn set_item_purchased(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<i64>,
    Json(request): Json<SetPurchasedRequest>,
) -> Result<StatusCode, AppError> {
    state
        .repository
        .set_item_purchased(auth.id, ItemId::new(item_id), request.purchased)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/shopping/{item_id}
pub async fn delete_shopping_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(item_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state
        .repository
        .delete_shopping_item(auth.id, ItemId::new(item_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Day summary
// =============================================================================

/// GET /v1/days/{date}
pub async fn get_day_summary(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(date): Path<NaiveDate>,
) -> HandlerResult<DaySummary> {
    let summary = state.repository.fetch_day_summary(auth.id, date).await?;
    Ok(Json(summary))
}

// =============================================================================
// Gym timer sessions
// =============================================================================

/// POST /v1/gym/sessions
///
/// Start an interval timer session for a task's configured routine. A
/// background task ticks the timer once per second and records the result
/// when the routine completes.
pub async fn create_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let progress = state
        .repository
        .get_gym_progress(auth.id, request.task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("no gym routine for this task".to_string()))?;

    let session_id = state
        .timers
        .create_session(auth.id, request.task_id, progress.routine)?;

    spawn_session_driver(
        state.timers.clone(),
        state.repository.clone(),
        auth.id,
        request.task_id,
        session_id.clone(),
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            message: format!(
                "Session started. Follow cues at /v1/gym/sessions/{}/events",
                session_id
            ),
            session_id,
        }),
    ))
}

/// GET /v1/gym/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> HandlerResult<SessionSnapshot> {
    let snapshot = state
        .timers
        .snapshot(auth.id, &session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {} not found", session_id)))?;
    Ok(Json(snapshot))
}

/// POST /v1/gym/sessions/{session_id}/pause
pub async fn pause_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.timers.pause(auth.id, &session_id) {
        return Err(AppError::NotFound(format!(
            "session {} not found",
            session_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /v1/gym/sessions/{session_id}/resume
pub async fn resume_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !state.timers.resume(auth.id, &session_id) {
        return Err(AppError::NotFound(format!(
            "session {} not found",
            session_id
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/gym/sessions/{session_id}
///
/// Abandon a session. Rounds completed so far are recorded against the
/// task's gym sub-record.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let snapshot = state
        .timers
        .snapshot(auth.id, &session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {} not found", session_id)))?;

    state.timers.remove(auth.id, &session_id);

    // A finished session already recorded its result through the driver.
    if snapshot.rounds_completed < snapshot.rounds {
        state
            .repository
            .record_gym_result(
                auth.id,
                snapshot.task_id,
                snapshot.rounds_completed as i32,
                chrono::Utc::now(),
            )
            .await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/gym/sessions/{session_id}/events
///
/// Stream timer cues via Server-Sent Events (SSE). Clients play audio on
/// the cue events; the stream closes with a `complete` event once the
/// session finishes or is abandoned.
pub async fn stream_session_events(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Verify the session exists and belongs to the caller before streaming.
    if state.timers.snapshot(auth.id, &session_id).is_none() {
        return Err(AppError::NotFound(format!(
            "session {} not found",
            session_id
        )));
    }

    let timers = state.timers.clone();
    let user_id = auth.id;
    let stream = async_stream::stream! {
        let mut sent = 0;
        loop {
            let Some(events) = timers.events(user_id, &session_id) else {
                // Session was removed; end the stream.
                break;
            };

            for event in events.iter().skip(sent) {
                let data = serde_json::to_string::<TimerEvent>(event).unwrap_or_default();
                yield Ok(Event::default().data(data));
            }
            sent = events.len();

            if timers.is_finished(user_id, &session_id) == Some(true) {
                if let Some(snapshot) = timers.snapshot(user_id, &session_id) {
                    let data = serde_json::to_string(&snapshot).unwrap_or_default();
                    yield Ok(Event::default().event("complete").data(data));
                }
                break;
            }

            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(1))
            .text("keep-alive"),
    ))
}
