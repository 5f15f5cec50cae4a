//! Partner-facing screening endpoints, authenticated with API keys.

use axum::{Extension, Json, Router, extract::State, middleware, routing::post};

use crate::{
    adapters::http::{app_state::AppState, extract::ValidatedJson, middleware::api_key_auth},
    app_error::{AppError, AppResult},
    application::ports::relay_service::{CheckRequest, RelayRequest, ScreeningResponse},
    use_cases::relay::{CHECK_ENDPOINT, RELAY_ENDPOINT, RelayCaller},
};

pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route("/check", post(check))
        .route("/relay", post(relay))
        .route_layer(middleware::from_fn_with_state(app_state, api_key_auth))
}

async fn check(
    State(app_state): State<AppState>,
    Extension(caller): Extension<RelayCaller>,
    payload: Result<ValidatedJson<CheckRequest>, AppError>,
) -> AppResult<Json<ScreeningResponse>> {
    let ValidatedJson(request) =
        reject_recorded(&app_state, &caller, CHECK_ENDPOINT, payload).await?;
    let response = app_state.relay_use_cases.check(&caller, &request).await?;
    Ok(Json(response))
}

async fn relay(
    State(app_state): State<AppState>,
    Extension(caller): Extension<RelayCaller>,
    payload: Result<ValidatedJson<RelayRequest>, AppError>,
) -> AppResult<Json<ScreeningResponse>> {
    let ValidatedJson(request) =
        reject_recorded(&app_state, &caller, RELAY_ENDPOINT, payload).await?;
    let response = app_state.relay_use_cases.relay(&caller, &request).await?;
    Ok(Json(response))
}

/// An unreadable body still counts as a call against the key.
async fn reject_recorded<T>(
    app_state: &AppState,
    caller: &RelayCaller,
    endpoint: &str,
    payload: Result<T, AppError>,
) -> AppResult<T> {
    match payload {
        Ok(payload) => Ok(payload),
        Err(e) => {
            app_state
                .relay_use_cases
                .record_usage(caller, endpoint, e.status_code(), 0)
                .await;
            Err(e)
        }
    }
}
