use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{
        app_state::AppState,
        extract::{PathId, ValidatedJson},
        session::current_user,
    },
    app_error::AppResult,
    use_cases::api_key::{ApiKeyView, CreateKeyInput, IssuedApiKey},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_keys).post(create_key))
        .route("/{key_id}", delete(delete_key))
        .route("/{key_id}/status", patch(set_status))
        .route("/{key_id}/rotate", post(rotate_key))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct CreateKeyPayload {
    #[serde(default)]
    key_name: String,
    permissions: Option<Vec<String>>,
    expires_in_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct StatusPayload {
    is_active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListKeysResponse {
    api_keys: Vec<ApiKeyView>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssuedKeyResponse {
    api_key: IssuedApiKey,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyResponse {
    api_key: ApiKeyView,
}

#[derive(Serialize)]
struct DeletedResponse {
    success: bool,
}

async fn list_keys(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let api_keys = app_state.api_key_use_cases.list_keys(user_id).await?;
    Ok(Json(ListKeysResponse { api_keys }))
}

async fn create_key(
    State(app_state): State<AppState>,
    jar: CookieJar,
    ValidatedJson(payload): ValidatedJson<CreateKeyPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let api_key = app_state
        .api_key_use_cases
        .create_key(
            user_id,
            CreateKeyInput {
                name: payload.key_name,
                permissions: payload.permissions,
                expires_in_days: payload.expires_in_days,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(IssuedKeyResponse { api_key })))
}

async fn delete_key(
    State(app_state): State<AppState>,
    jar: CookieJar,
    PathId(key_id): PathId,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    app_state
        .api_key_use_cases
        .delete_key(user_id, key_id)
        .await?;

    Ok(Json(DeletedResponse { success: true }))
}

async fn set_status(
    State(app_state): State<AppState>,
    jar: CookieJar,
    PathId(key_id): PathId,
    ValidatedJson(payload): ValidatedJson<StatusPayload>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let api_key = app_state
        .api_key_use_cases
        .set_status(user_id, key_id, payload.is_active)
        .await?;
    Ok(Json(KeyResponse { api_key }))
}

async fn rotate_key(
    State(app_state): State<AppState>,
    jar: CookieJar,
    PathId(key_id): PathId,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let api_key = app_state
        .api_key_use_cases
        .rotate_key(user_id, key_id)
        .await?;

    Ok(Json(IssuedKeyResponse { api_key }))
}
