use super::*;
use crate::net::types::Role;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

// =============================================================
// Pure helpers
// =============================================================

#[test]
fn endpoints_format_expected_paths() {
    assert_eq!(login_endpoint("http://h"), "http://h/api/auth/login");
    assert_eq!(users_endpoint("http://h"), "http://h/api/users");
    assert_eq!(user_endpoint("http://h", &UserId::from(5)), "http://h/api/users/5");
}

#[test]
fn parse_optional_body_empty_is_none() {
    let parsed: Option<User> = parse_optional_body("  ").unwrap();
    assert!(parsed.is_none());
}

#[test]
fn parse_body_reports_decode_error() {
    let err = parse_body::<User>("{not json").unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[test]
fn new_trims_trailing_slash() {
    let api = HttpApi::new("http://127.0.0.1:9/", HttpTimeouts::default()).unwrap();
    assert_eq!(api.base_url(), "http://127.0.0.1:9");
}

// =============================================================
// Against an in-process backend
// =============================================================

const TOKEN: &str = "header.payload.sig";

async fn spawn_backend(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn login_handler(Json(body): Json<Value>) -> Response {
    if body["email"] == "admin@test.com" && body["password"] == "password" {
        Json(json!({ "token": TOKEN, "id": 1, "name": "Admin User", "email": "admin@test.com", "role": "admin" }))
            .into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({ "message": "Invalid email or password" }))).into_response()
    }
}

async fn list_handler(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, "missing token").into_response();
    }
    Json(json!([
        { "id": 1, "name": "Admin User", "email": "admin@test.com", "role": "ADMIN" },
        { "id": 2, "name": "Worker Bee", "email": "worker@test.com", "role": "worker" }
    ]))
    .into_response()
}

async fn delete_handler(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match id.as_str() {
        "2" => StatusCode::NO_CONTENT.into_response(),
        "1" => (StatusCode::CONFLICT, Json(json!({ "message": "cannot delete yourself" }))).into_response(),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
    }
}

async fn update_handler(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body.get("password").is_some() {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(json!({ "id": 2, "name": body["name"], "email": "worker@test.com", "role": "WORKER" })).into_response()
}

async fn get_handler(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    match id.as_str() {
        "2" => Json(json!({ "id": 2, "name": "Worker Bee", "email": "worker@test.com", "role": "WORKER" }))
            .into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "user not found" }))).into_response(),
    }
}

async fn create_handler(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if body["email"] == "admin@test.com" {
        return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "message": "email already in use" }))).into_response();
    }
    if body["password"].as_str().is_none_or(str::is_empty) {
        return (StatusCode::BAD_REQUEST, "password required").into_response();
    }
    let created = json!({ "id": "u-9", "name": body["name"], "email": body["email"], "role": body["role"] });
    (StatusCode::CREATED, Json(created)).into_response()
}

fn backend() -> Router {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/users", get(list_handler).post(create_handler))
        .route("/api/users/{id}", get(get_handler).delete(delete_handler).put(update_handler))
}

async fn client() -> HttpApi {
    let base = spawn_backend(backend()).await;
    HttpApi::new(base, HttpTimeouts::default()).unwrap()
}

#[tokio::test]
async fn login_returns_token_and_identity() {
    let api = client().await;
    let resp = api.login("admin@test.com", "password").await.unwrap();
    assert_eq!(resp.token, TOKEN);
    assert_eq!(resp.role, Some(Role::Admin));
    assert_eq!(resp.id, Some(UserId::from(1)));
}

#[tokio::test]
async fn login_rejection_is_auth_error() {
    let api = client().await;
    let err = api.login("admin@test.com", "wrong").await.unwrap_err();
    assert_eq!(err, ApiError::Auth("Invalid email or password".to_owned()));
}

#[tokio::test]
async fn list_users_attaches_bearer_token() {
    let api = client().await;
    let users = api.list_users(TOKEN).await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[1].role, Role::Worker);

    let err = api.list_users("stale").await.unwrap_err();
    assert_eq!(err, ApiError::Auth("missing token".to_owned()));
}

#[tokio::test]
async fn get_user_fetches_one_record() {
    let api = client().await;
    let user = api.get_user(TOKEN, &UserId::from(2)).await.unwrap();
    assert_eq!(user.name, "Worker Bee");
    assert_eq!(user.role, Role::Worker);

    let missing = api.get_user(TOKEN, &UserId::from(99)).await.unwrap_err();
    assert_eq!(missing, ApiError::Validation { status: 404, message: "user not found".to_owned() });
}

#[tokio::test]
async fn create_user_posts_payload_and_returns_record() {
    let api = client().await;
    let new_user = NewUser {
        name: "New Hire".to_owned(),
        email: "hire@test.com".to_owned(),
        password: "s3cret".to_owned(),
        role: Role::Worker,
    };
    let created = api.create_user(TOKEN, &new_user).await.unwrap();
    assert_eq!(created.id, UserId::from("u-9"));
    assert_eq!(created.email, "hire@test.com");
    assert_eq!(created.role, Role::Worker);

    let duplicate = NewUser { email: "admin@test.com".to_owned(), ..new_user };
    let err = api.create_user(TOKEN, &duplicate).await.unwrap_err();
    assert_eq!(err, ApiError::Validation { status: 422, message: "email already in use".to_owned() });

    let err = api.create_user("stale", &duplicate).await.unwrap_err();
    assert!(err.is_auth());
}

#[tokio::test]
async fn delete_user_success_and_failures() {
    let api = client().await;
    api.delete_user(TOKEN, &UserId::from(2)).await.unwrap();

    let structured = api.delete_user(TOKEN, &UserId::from(1)).await.unwrap_err();
    assert_eq!(structured, ApiError::Validation { status: 409, message: "cannot delete yourself".to_owned() });

    let raw = api.delete_user(TOKEN, &UserId::from(3)).await.unwrap_err();
    assert_eq!(raw, ApiError::Validation { status: 500, message: "boom".to_owned() });
}

#[tokio::test]
async fn update_user_handles_echo_and_empty_body() {
    let api = client().await;
    let id = UserId::from(2);

    let rename = UserUpdate { name: Some("Queen Bee".to_owned()), ..UserUpdate::default() };
    let echoed = api.update_user(TOKEN, &id, &rename).await.unwrap().unwrap();
    assert_eq!(echoed.name, "Queen Bee");

    let reset = UserUpdate { password: Some("n3w".to_owned()), ..UserUpdate::default() };
    assert!(api.update_user(TOKEN, &id, &reset).await.unwrap().is_none());
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = HttpApi::new(format!("http://{addr}"), HttpTimeouts::default()).unwrap();
    let err = api.login("admin@test.com", "password").await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)), "unexpected error: {err:?}");
}
