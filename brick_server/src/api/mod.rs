//! HTTP API for the authentication server.
//!
//! # Endpoints Overview
//!
//! ## Public
//! - `POST /api/register` - Create an account
//! - `POST /api/login` - Verify credentials and start a cookie session
//! - `POST /api/logout` - End the current session (always succeeds)
//! - `GET /api/hello` - Connectivity probe
//!
//! ## Session Required
//! - `GET /api/me` - Current user
//!
//! ## Operations
//! - `GET /health` - Server and database health
//!
//! Any other path is served from the static UI directory when one is
//! configured.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use brick_server::api::{create_router, AppState};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let state: AppState = unimplemented!();
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! Only origins on the configured allow-list may make cross-origin requests.
//! Credentials are allowed so browsers send the session cookie.

pub mod auth;
pub mod cookies;
pub mod middleware;
pub mod request_id;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json},
    routing::{get, post},
};
use brick_auth::{AuthManager, Database};
use serde_json::json;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
};

use crate::config::{HttpConfig, SessionConfig};

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Database,
    pub session: Arc<SessionConfig>,
    pub http: Arc<HttpConfig>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health            - Health check
/// POST /api/register      - Register user
/// POST /api/login         - Login, sets session cookie
/// POST /api/logout        - Logout, clears session cookie
/// GET  /api/me            - Current user (session required)
/// GET  /api/hello         - Connectivity probe
/// GET  /*                 - Static UI (when configured)
/// ```
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/hello", get(hello));

    let protected_routes = Router::new()
        .route("/me", get(auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ));

    let mut router = Router::new()
        .route("/health", get(health_check))
        .nest("/api", public_routes.merge(protected_routes));

    if let Some(dir) = &state.http.static_dir {
        tracing::info!("Serving static files from {}", dir.display());
        router = router.fallback_service(ServeDir::new(dir));
    }

    router
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(cors_layer(&state.http))
        .with_state(state)
}

/// Build the CORS layer from the configured origin allow-list.
///
/// Origins that are not valid header values are skipped with a warning.
fn cors_layer(http: &HttpConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = http
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT])
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database answers, `503 Service Unavailable`
/// otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-10-15T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match state.database.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!(error = %e, "Database health check failed");
            false
        }
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}

async fn hello() -> Json<auth::MessageResponse> {
    Json(auth::MessageResponse {
        message: "Hello from the Rust backend!".to_string(),
    })
}
