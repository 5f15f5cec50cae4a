use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use time::Duration;
use url::Url;

const DEFAULT_RELAY_API_URL: &str = "https://resumeak.onrender.com/";

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub session_ttl: Duration,
    /// `Secure` is set on the session cookie only in production.
    pub secure_cookies: bool,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub run_migrations: bool,
    pub redis_url: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_per_ip: u64,
    /// Whether to trust X-Forwarded-For headers. Only enable behind a reverse proxy.
    pub trust_proxy: bool,
    pub relay_api_url: Url,
    pub relay_api_token: Option<SecretString>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let session_ttl_days: i64 = get_env_default("SESSION_TTL_DAYS", 7);
        let app_env: String = get_env_default("APP_ENV", String::from("development"));

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:5173"))
                .parse()
                .expect("CORS_ORIGIN must be a valid header value");

        let bind_addr: SocketAddr = get_env_default(
            "BIND_ADDR",
            SocketAddr::from(([127, 0, 0, 1], 3001)),
        );
        let database_url: String = get_env("DATABASE_URL");
        let run_migrations: bool = get_env_default("RUN_MIGRATIONS", true);
        let redis_url: String = get_env_default("REDIS_URL", "redis://127.0.0.1:6379".to_string());
        let rate_limit_window_secs: u64 = get_env_default("RATE_LIMIT_WINDOW_SECS", 60);
        let rate_limit_per_ip: u64 = get_env_default("RATE_LIMIT_PER_IP", 120);
        // Default to false - must explicitly enable when behind a trusted proxy
        let trust_proxy: bool = get_env_default("TRUST_PROXY", false);

        let relay_api_url: String =
            get_env_default("RELAY_API_URL", DEFAULT_RELAY_API_URL.to_string());
        let relay_api_url =
            normalize_base_url(&relay_api_url).expect("RELAY_API_URL must be a valid URL");
        let relay_api_token = std::env::var("RELAY_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(|t| SecretString::new(t.into()));

        Self {
            jwt_secret,
            session_ttl: Duration::days(session_ttl_days),
            secure_cookies: is_production(&app_env),
            cors_origin,
            bind_addr,
            database_url,
            run_migrations,
            redis_url,
            rate_limit_window_secs,
            rate_limit_per_ip,
            trust_proxy,
            relay_api_url,
            relay_api_token,
        }
    }
}

fn is_production(app_env: &str) -> bool {
    matches!(app_env.trim().to_ascii_lowercase().as_str(), "production" | "prod")
}

/// Relative joins drop the last path segment unless the base ends with `/`.
fn normalize_base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}
