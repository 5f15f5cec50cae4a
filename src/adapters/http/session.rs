//! Session cookie handling for dashboard routes.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::jwt,
};

pub const AUTH_COOKIE: &str = "auth_token";

/// Resolve the signed-in user from the session cookie. Missing, malformed,
/// expired and forged tokens are all `InvalidCredentials`.
pub fn current_user(jar: &CookieJar, app_state: &AppState) -> AppResult<Uuid> {
    let Some(cookie) = jar.get(AUTH_COOKIE) else {
        return Err(AppError::InvalidCredentials);
    };
    let claims = jwt::verify(cookie.value(), &app_state.config.jwt_secret)?;
    claims.user_id()
}

pub fn session_cookie(token: String, app_state: &AppState) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(app_state.config.secure_cookies)
        .path("/")
        .max_age(app_state.config.session_ttl)
        .build()
}

pub fn cleared_session_cookie(app_state: &AppState) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(app_state.config.secure_cookies)
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build()
}

/// Issue a session token for the user and attach it to the jar.
pub fn start_session(
    jar: CookieJar,
    app_state: &AppState,
    user_id: Uuid,
    partner_id: &str,
) -> AppResult<CookieJar> {
    let token = jwt::issue(
        user_id,
        partner_id,
        &app_state.config.jwt_secret,
        app_state.config.session_ttl,
    )?;
    Ok(jar.add(session_cookie(token, app_state)))
}
