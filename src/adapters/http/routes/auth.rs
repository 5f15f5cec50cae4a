use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::ValidatedJson,
        session::{cleared_session_cookie, current_user, start_session},
    },
    app_error::AppResult,
    use_cases::auth::{SessionUser, SignupInput},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/session", get(session))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SignupPayload {
    email: Option<String>,
    password: Option<String>,
    company_name: Option<String>,
    website: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SigninPayload {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct UserResponse {
    user: SessionUser,
}

#[derive(Serialize)]
struct SignoutResponse {
    success: bool,
}

async fn signup(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SignupPayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .signup(SignupInput {
            email: payload.email,
            password: payload.password,
            company_name: payload.company_name,
            website: payload.website,
        })
        .await?;

    let jar = start_session(jar, &app_state, user.id, &user.partner_id)?;
    Ok((StatusCode::CREATED, jar, Json(UserResponse { user })))
}

async fn signin(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<SigninPayload>,
) -> AppResult<impl IntoResponse> {
    let user = app_state
        .auth_use_cases
        .signin(&payload.email, &payload.password)
        .await?;

    let jar = start_session(jar, &app_state, user.id, &user.partner_id)?;
    Ok((jar, Json(UserResponse { user })))
}

async fn signout(State(app_state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(cleared_session_cookie(&app_state));
    (jar, Json(SignoutResponse { success: true }))
}

async fn session(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let user = app_state.auth_use_cases.session(user_id).await?;
    Ok(Json(UserResponse { user }))
}
