//! Test app state builder for HTTP-level integration testing.
//!
//! This module provides `TestAppStateBuilder` which creates a complete `AppState`
//! over in-memory mocks for testing HTTP endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::Duration;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::change_feed::ChangeFeed,
    domain::entities::{
        api_key::ApiKey, developer_profile::DeveloperProfile, relay_log::RelayLog,
        usage_record::UsageRecord,
    },
    infra::{RateLimiterTrait, config::AppConfig},
    test_utils::{
        InMemoryApiKeyRepo, InMemoryPreferencesRepo, InMemoryProfileRepo, InMemoryRateLimiter,
        InMemoryRelayLogRepo, InMemoryUsageRepo, StubPasswordHasher, StubRelayService,
    },
    use_cases::{
        analytics::AnalyticsUseCases, api_key::ApiKeyUseCases, auth::AuthUseCases,
        profile::ProfileUseCases, relay::RelayUseCases,
    },
};

/// Handles on the mocks behind a built `AppState`, for test assertions.
pub struct TestMocks {
    pub profiles: Arc<InMemoryProfileRepo>,
    pub preferences: Arc<InMemoryPreferencesRepo>,
    pub api_keys: Arc<InMemoryApiKeyRepo>,
    pub usage: Arc<InMemoryUsageRepo>,
    pub relay_logs: Arc<InMemoryRelayLogRepo>,
    pub relay_service: Arc<StubRelayService>,
    pub feed: ChangeFeed,
}

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let profile = create_test_profile(|p| p.email = "ops@acme.io".to_string());
/// let key = create_test_api_key(profile.user_id, |k| k.is_active = false);
///
/// let (app_state, mocks) = TestAppStateBuilder::new()
///     .with_profile(profile)
///     .with_api_key(key)
///     .build_with_mocks();
/// ```
pub struct TestAppStateBuilder {
    profiles: Vec<DeveloperProfile>,
    api_keys: Vec<ApiKey>,
    usage: Vec<UsageRecord>,
    relay_logs: Vec<RelayLog>,
    relay_service: StubRelayService,
    rate_limiter: InMemoryRateLimiter,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            profiles: vec![],
            api_keys: vec![],
            usage: vec![],
            relay_logs: vec![],
            relay_service: StubRelayService::allowing(),
            rate_limiter: InMemoryRateLimiter::permissive(),
        }
    }

    pub fn with_profile(mut self, profile: DeveloperProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_keys.push(key);
        self
    }

    pub fn with_usage_record(mut self, record: UsageRecord) -> Self {
        self.usage.push(record);
        self
    }

    pub fn with_relay_log(mut self, log: RelayLog) -> Self {
        self.relay_logs.push(log);
        self
    }

    /// Replace the default allow-everything screening stub.
    pub fn with_relay_service(mut self, service: StubRelayService) -> Self {
        self.relay_service = service;
        self
    }

    /// Replace the default permissive rate limiter.
    pub fn with_rate_limiter(mut self, limiter: InMemoryRateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        self.build_with_mocks().0
    }

    /// Build the AppState and return the mocks behind it.
    pub fn build_with_mocks(self) -> (AppState, TestMocks) {
        let profiles = Arc::new(InMemoryProfileRepo::with_profiles(self.profiles));
        let preferences = Arc::new(InMemoryPreferencesRepo::new());
        let api_keys = Arc::new(InMemoryApiKeyRepo::with_keys(self.api_keys));
        let usage = Arc::new(InMemoryUsageRepo::with_records(self.usage));
        let relay_logs = Arc::new(InMemoryRelayLogRepo::with_logs(self.relay_logs));
        let relay_service = Arc::new(self.relay_service);
        let feed = ChangeFeed::new();

        let auth_use_cases = AuthUseCases::new(profiles.clone(), Arc::new(StubPasswordHasher));
        let profile_use_cases = ProfileUseCases::new(profiles.clone(), preferences.clone());
        let api_key_use_cases = ApiKeyUseCases::new(api_keys.clone(), profiles.clone());
        let analytics_use_cases = AnalyticsUseCases::new(
            profiles.clone(),
            usage.clone(),
            relay_logs.clone(),
            feed.clone(),
        );
        let relay_use_cases = RelayUseCases::new(
            api_key_use_cases.clone(),
            usage.clone(),
            relay_logs.clone(),
            relay_service.clone(),
            feed.clone(),
        );

        // Create minimal config for testing
        let config = Arc::new(AppConfig {
            jwt_secret: SecretString::new("test_jwt_secret".into()),
            session_ttl: Duration::days(7),
            secure_cookies: false,
            cors_origin: HeaderValue::from_static("http://localhost:5173"),
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            database_url: String::new(),
            run_migrations: false,
            redis_url: String::new(),
            rate_limit_window_secs: 60,
            rate_limit_per_ip: 1000,
            trust_proxy: false,
            relay_api_url: Url::parse("http://relay.test/").unwrap(),
            relay_api_token: None,
        });

        let rate_limiter: Arc<dyn RateLimiterTrait> = Arc::new(self.rate_limiter);

        let app_state = AppState {
            config,
            auth_use_cases: Arc::new(auth_use_cases),
            profile_use_cases: Arc::new(profile_use_cases),
            api_key_use_cases: Arc::new(api_key_use_cases),
            analytics_use_cases: Arc::new(analytics_use_cases),
            relay_use_cases: Arc::new(relay_use_cases),
            rate_limiter,
        };

        let mocks = TestMocks {
            profiles,
            preferences,
            api_keys,
            usage,
            relay_logs,
            relay_service,
            feed,
        };

        (app_state, mocks)
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
