use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tokio::sync::{broadcast, broadcast::error::RecvError, mpsc};
use tokio_stream::{Stream, StreamExt, wrappers::ReceiverStream};
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, session::current_user},
    app_error::AppResult,
    application::change_feed::ChangeEvent,
    use_cases::analytics::{AnalyticsReport, AnalyticsUseCases, validate_window},
};

const ANALYTICS_EVENT: &str = "analytics";
const STREAM_BUFFER: usize = 16;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_report))
        .route("/stream", get(stream_report))
}

#[derive(Deserialize)]
struct WindowQuery {
    days: Option<i64>,
}

async fn get_report(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<WindowQuery>,
) -> AppResult<impl IntoResponse> {
    let user_id = current_user(&jar, &app_state)?;
    let days = validate_window(query.days)?;
    let report = app_state.analytics_use_cases.report(user_id, days).await?;
    Ok(Json(report))
}

/// Emits the current report, then a fresh one after every usage or relay-log
/// insert that belongs to the caller.
async fn stream_report(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<WindowQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let user_id = current_user(&jar, &app_state)?;
    let days = validate_window(query.days)?;

    let analytics = app_state.analytics_use_cases.clone();
    // Subscribe before the first computation so no insert falls in between.
    let changes = analytics.subscribe();
    let initial = analytics.report(user_id, days).await?;

    let (tx, rx) = mpsc::channel::<AnalyticsReport>(STREAM_BUFFER);
    tokio::spawn(async move {
        if tx.send(initial).await.is_ok() {
            forward_reports(analytics, user_id, days, changes, tx).await;
        }
    });

    let stream =
        ReceiverStream::new(rx).map(|report| Ok::<_, Infallible>(report_event(&report)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn report_event(report: &AnalyticsReport) -> Event {
    Event::default()
        .event(ANALYTICS_EVENT)
        .json_data(report)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize analytics report");
            Event::default().event("error").data("report unavailable")
        })
}

/// Recomputes the owner's report on every relevant change until the client
/// goes away or the feed shuts down. A lagged receiver recomputes once.
async fn forward_reports(
    analytics: Arc<AnalyticsUseCases>,
    user_id: Uuid,
    days: u32,
    mut changes: broadcast::Receiver<ChangeEvent>,
    tx: mpsc::Sender<AnalyticsReport>,
) {
    loop {
        let received = tokio::select! {
            _ = tx.closed() => break,
            received = changes.recv() => received,
        };

        match received {
            Ok(event) if event.user_id != user_id => continue,
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(user_id = %user_id, skipped, "Analytics stream lagged");
            }
            Err(RecvError::Closed) => break,
        }

        match analytics.report(user_id, days).await {
            Ok(report) => {
                if tx.send(report).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = ?e, user_id = %user_id, "Failed to recompute analytics");
            }
        }
    }
    tracing::debug!(user_id = %user_id, "Analytics stream closed");
}
