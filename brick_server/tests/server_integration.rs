//! Integration tests for the HTTP API.
//!
//! Drives the full router (middleware, cookies, CORS) against an in-memory
//! SQLite database.

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use brick_auth::{
    AuthManager, CredentialHasher,
    db::{Database, DatabaseConfig, SqliteSessionRepository, SqliteUserRepository},
};
use brick_server::api::{AppState, create_router, request_id::REQUEST_ID_HEADER};
use brick_server::config::{HttpConfig, SessionConfig};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create the router over a fresh database
async fn create_test_server_with(http: HttpConfig) -> axum::Router {
    let db = Database::new(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to create test database");
    db.migrate().await.expect("Failed to create schema");

    let users = Arc::new(SqliteUserRepository::new(db.pool().clone()));
    let sessions = Arc::new(SqliteSessionRepository::new(
        db.pool().clone(),
        chrono::Duration::hours(24),
    ));
    let auth_manager = AuthManager::new(
        users,
        sessions,
        CredentialHasher::new("test_pepper_for_testing_only"),
    );

    create_router(AppState {
        auth_manager: Arc::new(auth_manager),
        database: db,
        session: Arc::new(SessionConfig::default()),
        http: Arc::new(http),
    })
}

async fn create_test_server() -> axum::Router {
    create_test_server_with(HttpConfig::default()).await
}

fn json_request(method: &str, uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// Send a request and return status, headers and the JSON body (`Null` when empty)
async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

/// `name=value` pair of the session cookie set by a response
fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session_id="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

fn set_cookie_header(headers: &HeaderMap) -> String {
    headers
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn register(app: &axum::Router, username: &str, email: &str, password: &str) -> StatusCode {
    let (status, _, _) = send(
        app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": username, "email": email, "password": password }),
            None,
        ),
    )
    .await;
    status
}

async fn login(app: &axum::Router, username: &str, password: &str) -> (StatusCode, HeaderMap, Value) {
    send(
        app,
        json_request(
            "POST",
            "/api/login",
            json!({ "username": username, "password": password }),
            None,
        ),
    )
    .await
}

#[tokio::test]
async fn test_register_login_me_logout_flow() {
    let app = create_test_server().await;

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "alice", "email": "a@x.io", "password": "pw1" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User registered successfully");
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.io");
    assert!(body["user_id"].as_i64().is_some());
    assert!(body.get("password_hash").is_none());

    let (status, headers, body) = login(&app, "alice", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged in successfully");
    assert_eq!(body["user"]["username"], "alice");
    let cookie = session_cookie(&headers).expect("login should set the session cookie");

    let (status, _, body) = send(&app, get_request("/api/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "a@x.io");

    let (status, headers, body) =
        send(&app, json_request("POST", "/api/logout", json!({}), Some(&cookie))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out successfully");
    assert!(set_cookie_header(&headers).contains("Max-Age=0"));

    let (status, _, body) = send(&app, get_request("/api/me", Some(&cookie))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn test_relogin_revokes_previous_session() {
    let app = create_test_server().await;
    assert_eq!(register(&app, "alice", "a@x.io", "pw1").await, StatusCode::CREATED);

    let (_, headers, _) = login(&app, "alice", "pw1").await;
    let first = session_cookie(&headers).expect("first login should set a cookie");

    let (status, headers, _) = send(
        &app,
        json_request(
            "POST",
            "/api/login",
            json!({ "username": "alice", "password": "pw1" }),
            Some(&first),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let second = session_cookie(&headers).expect("second login should set a cookie");
    assert_ne!(first, second);

    let (status, _, _) = send(&app, get_request("/api/me", Some(&first))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) =
        send(&app, json_request("POST", "/api/logout", json!({}), Some(&second))).await;
    assert_eq!(status, StatusCode::OK);

    for cookie in [&first, &second] {
        let (status, _, _) = send(&app, get_request("/api/me", Some(cookie))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_login_by_email() {
    let app = create_test_server().await;
    assert_eq!(register(&app, "alice", "a@x.io", "pw1").await, StatusCode::CREATED);

    let (status, headers, body) = login(&app, "a@x.io", "pw1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "alice");
    assert!(session_cookie(&headers).is_some());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = create_test_server().await;
    assert_eq!(register(&app, "alice", "a@x.io", "pw1").await, StatusCode::CREATED);

    let (status, _, body) = send(
        &app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "alice", "email": "b@x.io", "password": "pw2" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username or email already exists");

    assert_eq!(register(&app, "bob", "a@x.io", "pw2").await, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = create_test_server().await;

    for uri in ["/api/register", "/api/login"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "Cannot parse JSON");
    }
}

#[tokio::test]
async fn test_missing_fields_are_bad_request() {
    let app = create_test_server().await;

    let (status, _, body) = send(
        &app,
        json_request("POST", "/api/register", json!({ "username": "bob" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username, email, and password are required");

    let (status, _, body) = send(
        &app,
        json_request("POST", "/api/login", json!({ "username": "bob", "password": "" }), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username and password are required");
}

#[tokio::test]
async fn test_failed_logins_are_indistinguishable() {
    let app = create_test_server().await;
    assert_eq!(register(&app, "alice", "a@x.io", "pw1").await, StatusCode::CREATED);

    let (wrong_status, wrong_headers, wrong_body) = login(&app, "alice", "wrong").await;
    let (unknown_status, _, unknown_body) = login(&app, "nosuchuser", "anything").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid credentials");
    assert!(session_cookie(&wrong_headers).is_none());
}

#[tokio::test]
async fn test_me_without_cookie_is_unauthorized() {
    let app = create_test_server().await;

    let (status, _, body) = send(&app, get_request("/api/me", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn test_unknown_session_cookie_is_cleared() {
    let app = create_test_server().await;

    let (status, headers, _) =
        send(&app, get_request("/api/me", Some("session_id=forged"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let set_cookie = set_cookie_header(&headers);
    assert!(set_cookie.starts_with("session_id="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let app = create_test_server().await;

    let (status, _, body) = send(&app, json_request("POST", "/api/logout", json!({}), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logged out");
}

#[tokio::test]
async fn test_session_cookie_attributes() {
    let app = create_test_server().await;
    assert_eq!(register(&app, "alice", "a@x.io", "pw1").await, StatusCode::CREATED);

    let (_, headers, _) = login(&app, "alice", "pw1").await;
    let set_cookie = set_cookie_header(&headers);

    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Path=/"));
    assert!(!set_cookie.contains("Secure"));
}

#[tokio::test]
async fn test_health_and_hello() {
    let app = create_test_server().await;

    let (status, _, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], true);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let (status, _, body) = send(&app, get_request("/api/hello", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().is_some());
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = create_test_server().await;

    let (status, _, _) = send(&app, get_request("/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_generated_and_propagated() {
    let app = create_test_server().await;

    let (_, headers, _) = send(&app, get_request("/api/hello", None)).await;
    assert!(headers.contains_key(REQUEST_ID_HEADER));

    let request = Request::builder()
        .uri("/api/hello")
        .header(REQUEST_ID_HEADER, "trace-me")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers[REQUEST_ID_HEADER], "trace-me");
}

#[tokio::test]
async fn test_cors_allows_only_listed_origins() {
    let app = create_test_server().await;

    let request = Request::builder()
        .uri("/api/hello")
        .header(header::ORIGIN, "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let request = Request::builder()
        .uri("/api/hello")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert!(!headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
}

#[tokio::test]
async fn test_static_files_are_served() {
    let dir = std::env::temp_dir().join(format!("brick_static_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("index.html"), "<h1>brick</h1>").unwrap();

    let app = create_test_server_with(HttpConfig {
        static_dir: Some(dir.clone()),
        ..HttpConfig::default()
    })
    .await;

    let response = app.clone().oneshot(get_request("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>brick</h1>");

    // API routes still win over the static fallback
    let (status, _, _) = send(&app, get_request("/api/hello", None)).await;
    assert_eq!(status, StatusCode::OK);

    std::fs::remove_dir_all(&dir).ok();
}
