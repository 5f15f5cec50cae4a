use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, extract::ValidatedJson, session::current_user},
    app_error::AppResult,
    domain::entities::developer_profile::DeveloperProfile,
    use_cases::profile::ProfileUpdate,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_profile).put(update_profile))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct UpdateProfilePayload {
    company_name: Option<String>,
    website: Option<String>,
    api_usage_plan: Option<String>,
}

#[derive(Serialize)]
struct ProfileResponse {
    profile: DeveloperProfile,
}

async fn get_profile(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let profile = app_state.profile_use_cases.get_profile(user_id).await?;
    Ok(Json(ProfileResponse { profile }))
}

async fn update_profile(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let profile = app_state
        .profile_use_cases
        .update_profile(
            user_id,
            ProfileUpdate {
                company_name: payload.company_name,
                website: payload.website,
                usage_plan: payload.api_usage_plan,
            },
        )
        .await?;
    Ok(Json(ProfileResponse { profile }))
}
