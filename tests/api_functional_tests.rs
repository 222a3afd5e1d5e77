//! Functional tests for the REST API.
//!
//! Each test drives the full router with in-process requests against the
//! in-memory repository, covering authentication, task CRUD, sub-records,
//! the day aggregation endpoint and timer sessions.

#![cfg(all(feature = "http-server", feature = "local-repo"))]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use dayline::auth::AuthConfig;
use dayline::db::repositories::LocalRepository;
use dayline::db::repository::FullRepository;
use dayline::http::{create_router, AppState};

fn app() -> Router {
    let repo = Arc::new(LocalRepository::new()) as Arc<dyn FullRepository>;
    // Minimum bcrypt cost keeps the tests fast.
    let config = AuthConfig {
        bcrypt_cost: 4,
        ..AuthConfig::default()
    };
    create_router(AppState::new(repo, config))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register a user and return their bearer token.
async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "name": "Test User",
            "email": email,
            "password": "hunter22"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body["token"].as_str().unwrap().to_string()
}

async fn create_task(app: &Router, token: &str, title: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/tasks",
        Some(token),
        Some(json!({ "title": title, "due_date": "2026-03-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create task failed: {}", body);
    body["id"].as_i64().unwrap()
}

// =========================================================
// Health and authentication
// =========================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_then_login() {
    let app = app();
    register(&app, "a@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["token"].as_str().unwrap().is_empty());
    assert_eq!(body["user"]["email"], "a@example.com");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = app();
    register(&app, "a@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let app = app();
    register(&app, "a@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/register",
        None,
        Some(json!({
            "name": "Again",
            "email": "a@example.com",
            "password": "hunter22"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_validates_input() {
    let app = app();
    for body in [
        json!({ "name": "", "email": "a@example.com", "password": "hunter22" }),
        json!({ "name": "A", "email": "not-an-email", "password": "hunter22" }),
        json!({ "name": "A", "email": "a@example.com", "password": "tiny" }),
    ] {
        let (status, _) = send(&app, Method::POST, "/v1/auth/register", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = app();
    let (status, _) = send(&app, Method::GET, "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/v1/tasks", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_roundtrip() {
    let app = app();
    register(&app, "a@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/request",
        None,
        Some(json!({ "email": "a@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let reset_token = body["reset_token"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/confirm",
        None,
        Some(json!({ "token": reset_token, "new_password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Old password no longer works, new one does.
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "hunter22" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/login",
        None,
        Some(json!({ "email": "a@example.com", "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_does_not_reveal_accounts() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/request",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reset_token"].is_null());
}

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let app = app();
    register(&app, "a@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/request",
        None,
        Some(json!({ "email": "a@example.com" })),
    )
    .await;
    let reset_token = body["reset_token"].as_str().unwrap().to_string();

    let confirm = json!({ "token": reset_token, "new_password": "brand-new-pass" });
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/confirm",
        None,
        Some(confirm.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/auth/password-reset/confirm",
        None,
        Some(confirm),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =========================================================
// Task CRUD
// =========================================================

#[tokio::test]
async fn test_create_task_classifies_title() {
    let app = app();
    let token = register(&app, "a@example.com").await;

    for (title, kind) in [
        ("Cook dinner", "food"),
        ("Read chapter 4", "reading"),
        ("HIIT workout", "gym"),
        ("Buy groceries", "shopping"),
        ("Call the dentist", "plain"),
    ] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/tasks",
            Some(&token),
            Some(json!({ "title": title })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["kind"], kind, "title: {}", title);
    }
}

#[tokio::test]
async fn test_create_task_rejects_blank_title_and_bad_time() {
    let app = app();
    let token = register(&app, "a@example.com").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/tasks",
        Some(&token),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/tasks",
        Some(&token),
        Some(json!({ "title": "Walk", "start_time": "25:99" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rename_reclassifies() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "Read Dune").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/v1/tasks/{}", id),
        Some(&token),
        Some(json!({ "title": "Go to the gym" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/v1/tasks/{}", id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["kind"], "gym");
    assert_eq!(body["title"], "Go to the gym");
}

#[tokio::test]
async fn test_list_filter_and_clear_completed() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let done = create_task(&app, &token, "finished thing").await;
    create_task(&app, &token, "pending thing").await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/tasks/{}", done),
        Some(&token),
        Some(json!({ "completed": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(
        &app,
        Method::GET,
        "/v1/tasks?filter=pending&date=2026-03-02",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["tasks"][0]["title"], "pending thing");

    let (status, _) = send(&app, Method::DELETE, "/v1/tasks/completed", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/v1/tasks", Some(&token), None).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_foreign_task_is_not_found() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let stranger = register(&app, "other@example.com").await;
    let id = create_task(&app, &owner, "private").await;

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/v1/tasks/{}", id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/tasks/{}", id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =========================================================
// Sub-records and the day summary
// =========================================================

#[tokio::test]
async fn test_meal_log_roundtrip() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "Cook lunch").await;
    let uri = format!("/v1/tasks/{}/meal", id);

    // Nothing logged yet.
    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({
            "meal_type": "lunch",
            "foods_text": "pasta with pesto",
            "calories": 600.0,
            "protein": 18.5
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meal_type"], "lunch");
    // Omitted macros default to zero.
    assert_eq!(body["carbs"], 0.0);

    let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["calories"], 600.0);
}

#[tokio::test]
async fn test_reading_progress_roundtrip() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "Read Dune").await;
    let uri = format!("/v1/tasks/{}/reading", id);

    let (status, _) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "book_title": "Dune", "pages_read": -3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "book_title": "Dune", "pages_read": 42, "total_pages": 600 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pages_read"], 42);
    assert_eq!(body["total_pages"], 600);
}

#[tokio::test]
async fn test_shopping_list_flow() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "Buy groceries").await;
    let list_uri = format!("/v1/tasks/{}/shopping", id);

    let (status, item) = send(
        &app,
        Method::POST,
        &list_uri,
        Some(&token),
        Some(json!({ "name": "milk", "quantity": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = item["id"].as_i64().unwrap();

    // Quantity defaults to 1.
    let (status, item2) = send(
        &app,
        Method::POST,
        &list_uri,
        Some(&token),
        Some(json!({ "name": "bread" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(item2["quantity"], 1);

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/v1/shopping/{}", item_id),
        Some(&token),
        Some(json!({ "purchased": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, items) = send(&app, Method::GET, &list_uri, Some(&token), None).await;
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items[0]["purchased"], true);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/v1/shopping/{}", item_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_day_summary_endpoint() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let food = create_task(&app, &token, "Cook lunch").await;
    create_task(&app, &token, "Call the dentist").await;

    send(
        &app,
        Method::PUT,
        &format!("/v1/tasks/{}/meal", food),
        Some(&token),
        Some(json!({
            "meal_type": "lunch",
            "foods_text": "salad",
            "calories": 350.0
        })),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/v1/days/2026-03-02", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_tasks"], 2);
    assert_eq!(body["nutrition"]["calories"], 350.0);
    assert_eq!(body["pages_read"], 0);

    // Another day is empty.
    let (_, body) = send(&app, Method::GET, "/v1/days/2026-03-09", Some(&token), None).await;
    assert_eq!(body["total_tasks"], 0);
}

// =========================================================
// Gym timer sessions
// =========================================================

#[tokio::test]
async fn test_gym_routine_validation() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "HIIT workout").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/v1/tasks/{}/gym", id),
        Some(&token),
        Some(json!({ "work_sec": 30, "rest_sec": 10, "rounds": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "HIIT workout").await;

    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/v1/tasks/{}/gym", id),
        Some(&token),
        Some(json!({ "countdown_sec": 5, "work_sec": 30, "rest_sec": 10, "rounds": 8 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/gym/sessions",
        Some(&token),
        Some(json!({ "task_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let session_uri = format!("/v1/gym/sessions/{}", session_id);
    let (status, snapshot) = send(&app, Method::GET, &session_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["phase"], "countdown");
    assert_eq!(snapshot["rounds"], 8);
    assert_eq!(snapshot["paused"], false);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("{}/pause", session_uri),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, snapshot) = send(&app, Method::GET, &session_uri, Some(&token), None).await;
    assert_eq!(snapshot["paused"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("{}/resume", session_uri),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::DELETE, &session_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &session_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_session_requires_configured_routine() {
    let app = app();
    let token = register(&app, "a@example.com").await;
    let id = create_task(&app, &token, "HIIT workout").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/gym/sessions",
        Some(&token),
        Some(json!({ "task_id": id })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sessions_are_scoped_by_user() {
    let app = app();
    let owner = register(&app, "owner@example.com").await;
    let stranger = register(&app, "other@example.com").await;
    let id = create_task(&app, &owner, "HIIT workout").await;

    send(
        &app,
        Method::PUT,
        &format!("/v1/tasks/{}/gym", id),
        Some(&owner),
        Some(json!({ "work_sec": 30, "rest_sec": 10, "rounds": 4 })),
    )
    .await;
    let (_, body) = send(
        &app,
        Method::POST,
        "/v1/gym/sessions",
        Some(&owner),
        Some(json!({ "task_id": id })),
    )
    .await;
    let session_id = body["session_id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/v1/gym/sessions/{}", session_id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
