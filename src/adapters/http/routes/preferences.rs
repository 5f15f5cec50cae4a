use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, extract::ValidatedJson, session::current_user},
    app_error::AppResult,
    domain::entities::preferences::{Theme, UserPreferences},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_preferences).put(update_preferences))
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpdatePreferencesPayload {
    theme: Theme,
}

#[derive(Serialize)]
struct PreferencesResponse {
    preferences: UserPreferences,
}

async fn get_preferences(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let preferences = app_state.profile_use_cases.get_preferences(user_id).await?;
    Ok(Json(PreferencesResponse { preferences }))
}

async fn update_preferences(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<UpdatePreferencesPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let preferences = app_state
        .profile_use_cases
        .update_theme(user_id, payload.theme)
        .await?;
    Ok(Json(PreferencesResponse { preferences }))
}
