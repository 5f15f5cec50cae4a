use std::fs::File;
use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::{http::app_state::AppState, relay::HttpRelayService},
    application::{change_feed::ChangeFeed, ports::password_hasher::PasswordHasher},
    infra::{
        InfraError, RateLimiterTrait, config::AppConfig, http_client::build_client,
        password::Argon2Hasher, postgres_persistence, rate_limit::RedisRateLimiter,
    },
    use_cases::{
        analytics::{AnalyticsUseCases, RelayLogRepo, UsageRepo},
        api_key::{ApiKeyRepo, ApiKeyUseCases},
        auth::AuthUseCases,
        profile::{PreferencesRepo, ProfileRepo, ProfileUseCases},
        relay::RelayUseCases,
    },
};

const LOG_FILE: &str = "app.log";

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.run_migrations).await?);
    let rate_limiter = Arc::new(RedisRateLimiter::new(&config.redis_url).await?);
    let http_client = build_client().map_err(InfraError::HttpClient)?;

    let profiles = postgres_arc.clone() as Arc<dyn ProfileRepo>;
    let api_keys = postgres_arc.clone() as Arc<dyn ApiKeyRepo>;
    let usage = postgres_arc.clone() as Arc<dyn UsageRepo>;
    let relay_logs = postgres_arc.clone() as Arc<dyn RelayLogRepo>;
    let feed = ChangeFeed::new();

    let relay_service = Arc::new(HttpRelayService::new(
        http_client,
        config.relay_api_url.clone(),
        config.relay_api_token.clone(),
    ));

    let auth_use_cases = AuthUseCases::new(
        profiles.clone(),
        Arc::new(Argon2Hasher::new()) as Arc<dyn PasswordHasher>,
    );
    let profile_use_cases = ProfileUseCases::new(
        profiles.clone(),
        postgres_arc.clone() as Arc<dyn PreferencesRepo>,
    );
    let api_key_use_cases = ApiKeyUseCases::new(api_keys, profiles.clone());
    let analytics_use_cases = AnalyticsUseCases::new(
        profiles,
        usage.clone(),
        relay_logs.clone(),
        feed.clone(),
    );
    let relay_use_cases = RelayUseCases::new(
        api_key_use_cases.clone(),
        usage,
        relay_logs,
        relay_service,
        feed,
    );

    tracing::info!(relay_api_url = %config.relay_api_url, "Application state initialized");

    Ok(AppState {
        config: Arc::new(config),
        auth_use_cases: Arc::new(auth_use_cases),
        profile_use_cases: Arc::new(profile_use_cases),
        api_key_use_cases: Arc::new(api_key_use_cases),
        analytics_use_cases: Arc::new(analytics_use_cases),
        relay_use_cases: Arc::new(relay_use_cases),
        rate_limiter: rate_limiter as Arc<dyn RateLimiterTrait>,
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aml_portal=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer().with_target(false).with_level(true).pretty();

    // File (structured JSON logs); skipped when the file cannot be created.
    let json_layer = match File::create(LOG_FILE) {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create {LOG_FILE}: {e}; logging to console only");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
