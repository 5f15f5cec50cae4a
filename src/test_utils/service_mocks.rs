//! Stub implementations of outbound services: password hashing, the
//! screening API and the rate limiter.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::ports::{
        password_hasher::PasswordHasher,
        relay_service::{CheckRequest, RelayRequest, RelayService, ScreeningResponse},
    },
};

// ============================================================================
// StubPasswordHasher
// ============================================================================

/// Reversible "hash" so tests stay fast; never use outside tests.
#[derive(Default)]
pub struct StubPasswordHasher;

impl PasswordHasher for StubPasswordHasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        Ok(format!("stub${password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        hash.strip_prefix("stub$") == Some(password)
    }

    fn dummy_hash(&self) -> &str {
        "stub-dummy"
    }
}

// ============================================================================
// StubRelayService
// ============================================================================

/// Screening service returning a canned verdict and counting calls.
pub struct StubRelayService {
    response: Option<ScreeningResponse>,
    calls: AtomicUsize,
}

impl StubRelayService {
    pub fn new(response: Option<ScreeningResponse>) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    /// Low-risk verdict that lets the transfer through.
    pub fn allowing() -> Self {
        Self::new(Some(ScreeningResponse {
            allowed: true,
            risk_band: "LOW".to_string(),
            risk_score: 0.12,
            reasons: vec![],
            tx_hash: Some("0xabc123".to_string()),
            status: Some("broadcast".to_string()),
        }))
    }

    /// High-risk verdict that blocks the transfer.
    pub fn blocking() -> Self {
        Self::new(Some(ScreeningResponse {
            allowed: false,
            risk_band: "HIGH".to_string(),
            risk_score: 0.93,
            reasons: vec!["sanctioned counterparty".to_string()],
            tx_hash: None,
            status: Some("blocked".to_string()),
        }))
    }

    /// Every call fails as an unreachable upstream.
    pub fn failing() -> Self {
        Self::new(None)
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn respond(&self) -> AppResult<ScreeningResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| AppError::Upstream("screening service unavailable".into()))
    }
}

impl Default for StubRelayService {
    fn default() -> Self {
        Self::allowing()
    }
}

#[async_trait]
impl RelayService for StubRelayService {
    async fn check(&self, _partner_id: &str, _request: &CheckRequest) -> AppResult<ScreeningResponse> {
        self.respond()
    }

    async fn relay(&self, _partner_id: &str, _request: &RelayRequest) -> AppResult<ScreeningResponse> {
        self.respond()
    }
}

// ============================================================================
// InMemoryRateLimiter
// ============================================================================

/// Counting rate limiter. Windows never expire.
pub struct InMemoryRateLimiter {
    counts: Mutex<HashMap<String, u64>>,
    cap: Option<u64>,
}

impl InMemoryRateLimiter {
    /// Create a permissive rate limiter that never blocks (for most tests).
    pub fn permissive() -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            cap: None,
        }
    }

    /// Allow `cap` hits per bucket, ignoring the caller's configured limit.
    pub fn limited(cap: u64) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            cap: Some(cap),
        }
    }
}

#[async_trait]
impl crate::infra::RateLimiterTrait for InMemoryRateLimiter {
    async fn check(&self, bucket: &str, _limit: u64, _window_secs: u64) -> AppResult<()> {
        let mut counts = self.counts.lock().unwrap();
        let count = counts.entry(bucket.to_string()).or_insert(0);
        *count += 1;

        match self.cap {
            Some(cap) if *count > cap => Err(AppError::RateLimited),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::RateLimiterTrait;

    #[test]
    fn test_stub_hasher_round_trip() {
        let hasher = StubPasswordHasher;
        let hash = hasher.hash("hunter22").unwrap();
        assert!(hasher.verify("hunter22", &hash));
        assert!(!hasher.verify("hunter23", &hash));
        assert!(!hasher.verify("hunter22", ""));
    }

    #[tokio::test]
    async fn test_limited_rate_limiter_is_per_bucket() {
        let limiter = InMemoryRateLimiter::limited(1);
        assert!(limiter.check("a", 60, 60).await.is_ok());
        assert!(matches!(
            limiter.check("a", 60, 60).await,
            Err(AppError::RateLimited)
        ));
        assert!(limiter.check("b", 60, 60).await.is_ok());
    }

    #[tokio::test]
    async fn test_failing_relay_counts_calls() {
        let service = StubRelayService::failing();
        let request = RelayRequest {
            chain: "ethereum".into(),
            raw_tx: "0xdead".into(),
            idempotency_key: None,
        };
        assert!(matches!(
            service.relay("AML-X", &request).await,
            Err(AppError::Upstream(_))
        ));
        assert_eq!(service.call_count(), 1);
    }
}
