//! Session cookie construction.

use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::config::SessionConfig;

/// Cookie carrying a freshly issued session id.
///
/// No `Max-Age` is set; the server enforces expiry and the cookie lives for
/// the browser session.
pub fn session_cookie(config: &SessionConfig, session_id: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

/// Cookie handed to `CookieJar::remove` to clear the session cookie.
///
/// The path must match the one used by [`session_cookie`].
pub fn removal_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone()).path("/").build()
}
