//! Authentication API handlers.
//!
//! Register, login, logout and current-user endpoints. Bodies are JSON; the
//! session travels in an HttpOnly cookie set by login and cleared by logout.
//!
//! # Examples
//!
//! Register a new user:
//! ```bash
//! curl -X POST http://localhost:3000/api/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "alice", "email": "a@x.io", "password": "pw1"}'
//! ```
//!
//! Login by username or email, keeping the cookie:
//! ```bash
//! curl -c cookies.txt -X POST http://localhost:3000/api/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "a@x.io", "password": "pw1"}'
//! ```

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use axum_extra::extract::cookie::CookieJar;
use brick_auth::auth::{AuthError, LoginRequest, RegisterRequest, User, UserId};
use serde::{Deserialize, Serialize};

use super::{AppState, cookies, request_id::RequestId};
use crate::{logging, metrics};

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// `username` may hold a username or an email address.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: UserId,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserView,
}

/// Public user fields returned to clients
#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Map an [`AuthError`] to a status code and client-safe body.
///
/// Internal failures are logged here and reach the client only as a generic
/// message.
pub fn error_response(err: &AuthError) -> ApiError {
    let status = match err {
        AuthError::Validation(_) => StatusCode::BAD_REQUEST,
        AuthError::Duplicate => StatusCode::CONFLICT,
        AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Database(_) | AuthError::Timeout(_) | AuthError::HashingFailed => {
            tracing::error!(error = %err, "Internal error while handling auth request");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.client_message(),
        }),
    )
}

fn malformed_json(rejection: JsonRejection) -> ApiError {
    tracing::debug!(error = %rejection, "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Cannot parse JSON".to_string(),
        }),
    )
}

/// Register a new user account.
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "email": "a@x.io", "password": "pw1" }
/// ```
///
/// # Response
///
/// `201 Created`:
/// ```json
/// { "message": "User registered successfully", "user_id": 1, "username": "alice", "email": "a@x.io" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON or a missing field
/// - `409 Conflict`: Username or email already registered
/// - `500 Internal Server Error`: Storage or hashing failure
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        metrics::registrations_total("invalid");
        malformed_json(rejection)
    })?;

    let request = RegisterRequest {
        username: payload.username,
        email: payload.email,
        password: payload.password,
    };

    match state.auth_manager.register(request).await {
        Ok(user) => {
            metrics::registrations_total("created");
            Ok((
                StatusCode::CREATED,
                Json(RegisterResponse {
                    message: "User registered successfully".to_string(),
                    user_id: user.id,
                    username: user.username,
                    email: user.email,
                }),
            ))
        }
        Err(e) => {
            metrics::registrations_total(match &e {
                AuthError::Validation(_) => "invalid",
                AuthError::Duplicate => "duplicate",
                _ => "error",
            });
            Err(error_response(&e))
        }
    }
}

/// Verify credentials and start a session.
///
/// # Request Body
///
/// ```json
/// { "username": "alice", "password": "pw1" }
/// ```
///
/// # Response
///
/// `200 OK` with a `Set-Cookie` header carrying the session id:
/// ```json
/// { "message": "Logged in successfully", "user": { "id": 1, "username": "alice", "email": "a@x.io" } }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON or a missing field
/// - `401 Unauthorized`: Unknown user or wrong password (indistinguishable)
/// - `500 Internal Server Error`: Storage or hashing failure
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    jar: CookieJar,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    let Json(payload) = payload.map_err(malformed_json)?;

    let request = LoginRequest {
        username: payload.username,
        password: payload.password,
    };

    match state.auth_manager.login(request).await {
        Ok((user, session)) => {
            metrics::login_attempts_total(true);

            // Revoke the session this browser already holds.
            if let Some(previous) = jar.get(&state.session.cookie_name) {
                state
                    .auth_manager
                    .logout(previous.value())
                    .await
                    .map_err(|e| error_response(&e))?;
            }

            let jar = jar.add(cookies::session_cookie(&state.session, session.id));
            Ok((
                jar,
                Json(LoginResponse {
                    message: "Logged in successfully".to_string(),
                    user: user.into(),
                }),
            ))
        }
        Err(e) => {
            if matches!(e, AuthError::InvalidCredentials) {
                metrics::login_attempts_total(false);
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    "Invalid credentials",
                );
            }
            Err(error_response(&e))
        }
    }
}

/// End the current session and clear the cookie.
///
/// Returns `200 OK` whether or not a session existed. Fails only when the
/// session store itself fails.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let Some(session_id) = jar
        .get(&state.session.cookie_name)
        .map(|cookie| cookie.value().to_string())
    else {
        return Ok((
            jar,
            Json(MessageResponse {
                message: "Logged out".to_string(),
            }),
        ));
    };

    state
        .auth_manager
        .logout(&session_id)
        .await
        .map_err(|e| error_response(&e))?;

    metrics::logouts_total();

    Ok((
        jar.remove(cookies::removal_cookie(&state.session)),
        Json(MessageResponse {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Current user for the session cookie.
///
/// Runs behind [`session_middleware`](super::middleware::session_middleware),
/// which resolves the session and injects the [`User`].
pub async fn me(Extension(user): Extension<User>) -> Json<UserView> {
    Json(user.into())
}
