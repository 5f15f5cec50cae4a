//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use axum_extra::extract::cookie::Cookie;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::{
    adapters::http::{app_state::AppState, session::session_cookie},
    application::jwt,
    domain::entities::{
        api_key::{ApiKey, ApiKeyPermission, DEFAULT_RATE_LIMIT_PER_MINUTE, mask_key},
        developer_profile::DeveloperProfile,
        relay_log::{RelayDecision, RelayKind, RelayLog},
        usage_plan::UsagePlan,
        usage_record::UsageRecord,
    },
    use_cases::{
        api_key::{generate_api_key, hash_api_key},
        auth::generate_partner_id,
        relay::CHECK_ENDPOINT,
    },
};

/// Create a test developer profile with sensible defaults.
pub fn create_test_profile(overrides: impl FnOnce(&mut DeveloperProfile)) -> DeveloperProfile {
    let plan = UsagePlan::Free;
    let mut profile = DeveloperProfile {
        user_id: Uuid::new_v4(),
        email: "dev@example.com".to_string(),
        company_name: None,
        website: None,
        usage_plan: plan,
        monthly_request_limit: plan.default_monthly_limit(),
        partner_id: generate_partner_id(),
        created_at: test_datetime(),
        updated_at: test_datetime(),
    };
    overrides(&mut profile);
    profile
}

/// Create a test API key owned by `user_id`. The secret behind the stored
/// hash is random and not recoverable; issue keys through `ApiKeyUseCases`
/// when a test needs to authenticate.
pub fn create_test_api_key(user_id: Uuid, overrides: impl FnOnce(&mut ApiKey)) -> ApiKey {
    let secret = generate_api_key();
    let mut key = ApiKey {
        id: Uuid::new_v4(),
        user_id,
        name: "Test key".to_string(),
        key_hash: hash_api_key(&secret),
        masked_key: Some(mask_key(&secret)),
        permissions: ApiKeyPermission::all(),
        is_active: true,
        rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
        expires_at: None,
        last_used_at: None,
        rotated_at: None,
        created_at: test_datetime(),
    };
    overrides(&mut key);
    key
}

/// Create a successful test usage record.
pub fn create_test_usage_record(
    api_key_id: Uuid,
    user_id: Uuid,
    overrides: impl FnOnce(&mut UsageRecord),
) -> UsageRecord {
    let mut record = UsageRecord {
        id: rand::random::<u32>().into(),
        api_key_id,
        user_id,
        endpoint: CHECK_ENDPOINT.to_string(),
        method: "POST".to_string(),
        status_code: Some(200),
        latency_ms: Some(120),
        ip_address: Some("203.0.113.7".to_string()),
        created_at: test_datetime(),
    };
    overrides(&mut record);
    record
}

/// Create an allowed, low-risk test relay log.
pub fn create_test_relay_log(
    partner_id: &str,
    overrides: impl FnOnce(&mut RelayLog),
) -> RelayLog {
    let mut log = RelayLog {
        id: Uuid::new_v4(),
        partner_id: partner_id.to_string(),
        api_key_id: None,
        kind: RelayKind::Check,
        chain: "ethereum".to_string(),
        from_address: Some("0x2222222222222222222222222222222222222222".to_string()),
        to_address: Some("0x1111111111111111111111111111111111111111".to_string()),
        decision: RelayDecision::Allow,
        risk_score: 0.1,
        risk_band: "LOW".to_string(),
        reasons: vec![],
        tx_hash: None,
        idempotency_key: None,
        created_at: test_datetime(),
    };
    overrides(&mut log);
    log
}

/// Session cookie for `profile`, signed with the test app state's secret.
pub fn session_cookie_for(app_state: &AppState, profile: &DeveloperProfile) -> Cookie<'static> {
    let token = jwt::issue(
        profile.user_id,
        &profile.partner_id,
        &app_state.config.jwt_secret,
        app_state.config.session_ttl,
    )
    .unwrap();
    session_cookie(token, app_state)
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Returns a consistent test datetime (2026-01-15 12:00:00 UTC).
fn test_datetime() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2026-01-15 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::developer_profile::is_partner_id;

    #[test]
    fn test_create_profile_with_defaults() {
        let profile = create_test_profile(|_| {});
        assert_eq!(profile.usage_plan, UsagePlan::Free);
        assert_eq!(profile.monthly_request_limit, 1000);
        assert!(is_partner_id(&profile.partner_id));
    }

    #[test]
    fn test_create_profile_with_overrides() {
        let profile = create_test_profile(|p| {
            p.email = "ops@acme.io".to_string();
            p.usage_plan = UsagePlan::Pro;
        });
        assert_eq!(profile.email, "ops@acme.io");
        assert_eq!(profile.usage_plan, UsagePlan::Pro);
    }

    #[test]
    fn test_create_api_key_is_masked_and_active() {
        let user_id = Uuid::new_v4();
        let key = create_test_api_key(user_id, |_| {});
        assert_eq!(key.user_id, user_id);
        assert!(key.is_active);
        assert!(key.display_key().starts_with("aml_"));
        assert!(key.display_key().contains("..."));
    }

    #[test]
    fn test_create_relay_log_defaults() {
        let log = create_test_relay_log("AML-ABCDEF123456", |_| {});
        assert_eq!(log.partner_id, "AML-ABCDEF123456");
        assert!(log.decision.is_allowed());
    }
}
