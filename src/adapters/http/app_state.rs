use std::sync::Arc;

use crate::{
    infra::{RateLimiterTrait, config::AppConfig},
    use_cases::{
        analytics::AnalyticsUseCases, api_key::ApiKeyUseCases, auth::AuthUseCases,
        profile::ProfileUseCases, relay::RelayUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth_use_cases: Arc<AuthUseCases>,
    pub profile_use_cases: Arc<ProfileUseCases>,
    pub api_key_use_cases: Arc<ApiKeyUseCases>,
    pub analytics_use_cases: Arc<AnalyticsUseCases>,
    pub relay_use_cases: Arc<RelayUseCases>,
    pub rate_limiter: Arc<dyn RateLimiterTrait>,
}
