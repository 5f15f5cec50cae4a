pub mod analytics;
pub mod auth;
pub mod dashboard;
pub mod keys;
pub mod preferences;
pub mod profile;
pub mod relay;

use axum::{Json, Router};
use serde_json::{Value, json};

use crate::adapters::http::app_state::AppState;

/// Everything served under `/api`. The relay routes need the state up front
/// for their API-key middleware.
pub fn router(app_state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/profile", profile::router())
        .nest("/keys", keys::router())
        .nest("/analytics", analytics::router())
        .nest("/preferences", preferences::router())
        .nest("/dashboard", dashboard::router())
        .nest("/v1", relay::router(app_state))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
