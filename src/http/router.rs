//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Accounts
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/password-reset/request", post(handlers::password_reset_request))
        .route("/auth/password-reset/confirm", post(handlers::password_reset_confirm))
        // Task CRUD
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/completed", delete(handlers::delete_completed_tasks))
        .route(
            "/tasks/{task_id}",
            get(handlers::get_task)
                .put(handlers::rename_task)
                .patch(handlers::set_task_completed)
                .delete(handlers::delete_task),
        )
        // Sub-records
        .route(
            "/tasks/{task_id}/meal",
            put(handlers::put_meal_log).get(handlers::get_meal_log),
        )
        .route(
            "/tasks/{task_id}/reading",
            put(handlers::put_reading_progress).get(handlers::get_reading_progress),
        )
        .route(
            "/tasks/{task_id}/gym",
            put(handlers::put_gym_routine).get(handlers::get_gym_progress),
        )
        .route(
            "/tasks/{task_id}/shopping",
            post(handlers::add_shopping_item).get(handlers::list_shopping_items),
        )
        .route(
            "/shopping/{item_id}",
            patch(handlers::set_item_purchased).delete(handlers::delete_shopping_item),
        )
        // Day aggregation
        .route("/days/{date}", get(handlers::get_day_summary))
        // Gym timer sessions
        .route("/gym/sessions", post(handlers::create_session))
        .route(
            "/gym/sessions/{session_id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/gym/sessions/{session_id}/pause", post(handlers::pause_session))
        .route("/gym/sessions/{session_id}/resume", post(handlers::resume_session))
        .route("/gym/sessions/{session_id}/events", get(handlers::stream_session_events));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo =
            Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let state = AppState::new(repo, AuthConfig::default());
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
