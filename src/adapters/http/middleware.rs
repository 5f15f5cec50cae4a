use std::net::SocketAddr;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, OriginalUri, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppError,
    infra::rate_limit::{api_key_bucket, ip_bucket},
};

/// Per-key limits are expressed per minute.
const API_KEY_WINDOW_SECS: u64 = 60;

pub async fn rate_limit_middleware(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = client_ip(&request, app_state.config.trust_proxy)
        .unwrap_or_else(|| "unknown".to_string());

    tracing::debug!(
        trust_proxy = app_state.config.trust_proxy,
        using_ip = %ip,
        "Rate limiting request"
    );

    app_state
        .rate_limiter
        .check(
            &ip_bucket(&ip),
            app_state.config.rate_limit_per_ip,
            app_state.config.rate_limit_window_secs,
        )
        .await?;

    Ok(next.run(request).await)
}

/// Authenticates `Authorization: Bearer <api key>` and applies the key's own
/// per-minute limit. Handlers receive the caller as `Extension<RelayCaller>`.
pub async fn api_key_auth(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let started = Instant::now();
    let raw_key = bearer_token(&request).ok_or(AppError::InvalidApiKey)?;
    let ip = client_ip(&request, app_state.config.trust_proxy);

    let caller = app_state.relay_use_cases.authorize(&raw_key, ip).await?;

    let limit = u64::try_from(caller.key.rate_limit_per_minute).unwrap_or(0);
    if let Err(e) = app_state
        .rate_limiter
        .check(&api_key_bucket(&caller.key.key_id), limit, API_KEY_WINDOW_SECS)
        .await
    {
        let endpoint = request
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| request.uri().path().to_string());
        let latency_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        app_state
            .relay_use_cases
            .record_usage(&caller, &endpoint, e.status_code(), latency_ms)
            .await;
        return Err(e);
    }

    request.extensions_mut().insert(caller);
    Ok(next.run(request).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Peer address, or the forwarded client address when running behind a
/// trusted proxy.
fn client_ip(req: &Request, trust_proxy: bool) -> Option<String> {
    if trust_proxy && let Some(ip) = forwarded_ip(req) {
        return Some(ip);
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn forwarded_ip(req: &Request) -> Option<String> {
    if let Some(forwarded) = req.headers().get("x-forwarded-for")
        && let Ok(val) = forwarded.to_str()
        && let Some(first) = val.split(',').next()
    {
        let trimmed = first.trim();
        if !trimmed.is_empty() {
            return Some(trimmed.to_string());
        }
    }
    if let Some(real) = req.headers().get("x-real-ip")
        && let Ok(val) = real.to_str()
        && !val.trim().is_empty()
    {
        return Some(val.trim().to_string());
    }
    None
}
