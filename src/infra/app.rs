use axum::{
    Router,
    http::{HeaderValue, Method, Request, header},
    middleware,
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::adapters::http::{
    app_state::AppState,
    middleware::rate_limit_middleware,
    routes::{self, health},
};

pub fn create_app(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(app_state.config.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "http-request",
            method = %request.method(),
            uri = %request.uri(),
            version = ?request.version(),
            request_id = %Uuid::new_v4()
        )
    });

    // Outermost first: every response, including 429s, gets headers and CORS.
    let stack = ServiceBuilder::new()
        .layer(trace)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .nest("/api", routes::router(app_state.clone()))
        .route("/health", get(health))
        .with_state(app_state)
        .layer(stack)
}
