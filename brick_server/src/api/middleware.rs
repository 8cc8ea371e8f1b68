//! Session middleware for protected endpoints.
//!
//! Reads the session cookie, resolves it through the `AuthManager`, and
//! injects the authenticated [`User`] into request extensions for downstream
//! handlers.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum::{Router, routing::get, middleware};
//! # use brick_server::api::middleware::session_middleware;
//! # use brick_server::api::AppState;
//! # async fn handler() {}
//! # let state: AppState = unimplemented!();
//!
//! let protected_routes: Router<AppState> = Router::new()
//!     .route("/api/protected", get(handler))
//!     .layer(middleware::from_fn_with_state(state.clone(), session_middleware));
//! # let _ = protected_routes;
//! ```
//!
//! # Extracting the User
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use brick_auth::User;
//!
//! async fn protected_handler(Extension(user): Extension<User>) -> String {
//!     format!("Authenticated as {}", user.username)
//! }
//! # let _ = protected_handler;
//! ```

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use brick_auth::AuthError;

use super::{AppState, auth::error_response, cookies, request_id::RequestId};
use crate::{logging, metrics};

/// Session middleware that resolves the cookie and injects the user.
///
/// # Behavior
///
/// - **Live session**: Injects `User` into request extensions → Calls next handler
/// - **No cookie**: Returns `401 Unauthorized`
/// - **Unknown, expired, or orphaned session**: Returns `401 Unauthorized`
///   and clears the cookie; the stored session is already destroyed
/// - **Store failure**: Returns `500 Internal Server Error`
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session_id) = jar
        .get(&state.session.cookie_name)
        .map(|cookie| cookie.value().to_string())
    else {
        return error_response(&AuthError::Unauthenticated).into_response();
    };

    match state.auth_manager.current_user(&session_id).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) if e.is_internal() => error_response(&e).into_response(),
        Err(e) => {
            let request_id = request.extensions().get::<RequestId>().cloned();
            logging::log_security_event(
                "stale_session",
                None,
                request_id.as_ref().map(RequestId::as_str),
                "Rejected session cookie",
            );
            metrics::stale_sessions_total();

            (
                jar.remove(cookies::removal_cookie(&state.session)),
                error_response(&e),
            )
                .into_response()
        }
    }
}
