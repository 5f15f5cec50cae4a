use std::sync::Arc;
use std::time::Instant;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use tracing::instrument;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        change_feed::{ChangeFeed, ChangedTable},
        ports::relay_service::{CheckRequest, RelayRequest, RelayService, ScreeningResponse},
        use_cases::{
            analytics::{RelayLogRepo, UsageRepo},
            api_key::{ApiKeyUseCases, AuthenticatedKey},
        },
        validators::{is_valid_chain, is_valid_idempotency_key},
    },
    domain::entities::{
        api_key::ApiKeyPermission,
        relay_log::{NewRelayLog, RelayDecision, RelayKind, RelayLog},
        usage_record::NewUsageRecord,
    },
};

pub const CHECK_ENDPOINT: &str = "/api/v1/check";
pub const RELAY_ENDPOINT: &str = "/api/v1/relay";

const MAX_RAW_TX_LEN: usize = 131_072;

/// An API-key-authenticated caller of the gateway.
#[derive(Debug, Clone)]
pub struct RelayCaller {
    pub key: AuthenticatedKey,
    pub ip_address: Option<String>,
}

impl From<&RelayLog> for ScreeningResponse {
    fn from(log: &RelayLog) -> Self {
        Self {
            allowed: log.decision.is_allowed(),
            risk_band: log.risk_band.clone(),
            risk_score: log.risk_score,
            reasons: log.reasons.clone(),
            tx_hash: log.tx_hash.clone(),
            status: None,
        }
    }
}

#[derive(Clone)]
pub struct RelayUseCases {
    keys: ApiKeyUseCases,
    usage: Arc<dyn UsageRepo>,
    logs: Arc<dyn RelayLogRepo>,
    service: Arc<dyn RelayService>,
    feed: ChangeFeed,
}

impl RelayUseCases {
    pub fn new(
        keys: ApiKeyUseCases,
        usage: Arc<dyn UsageRepo>,
        logs: Arc<dyn RelayLogRepo>,
        service: Arc<dyn RelayService>,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            keys,
            usage,
            logs,
            service,
            feed,
        }
    }

    pub async fn authorize(&self, raw_key: &str, ip_address: Option<String>) -> AppResult<RelayCaller> {
        let key = self.keys.authenticate(raw_key).await?;
        Ok(RelayCaller { key, ip_address })
    }

    #[instrument(skip_all, fields(partner_id = %caller.key.partner_id, chain = %request.chain))]
    pub async fn check(
        &self,
        caller: &RelayCaller,
        request: &CheckRequest,
    ) -> AppResult<ScreeningResponse> {
        let started = Instant::now();
        let result = self.screen_transfer(caller, request).await;
        self.finish(caller, CHECK_ENDPOINT, &result, started).await;
        result
    }

    #[instrument(skip_all, fields(partner_id = %caller.key.partner_id, chain = %request.chain))]
    pub async fn relay(
        &self,
        caller: &RelayCaller,
        request: &RelayRequest,
    ) -> AppResult<ScreeningResponse> {
        let started = Instant::now();
        let result = self.screen_transaction(caller, request).await;
        self.finish(caller, RELAY_ENDPOINT, &result, started).await;
        result
    }

    /// Writes the usage row for a call that got past authentication and
    /// notifies analytics subscribers.
    pub async fn record_usage(
        &self,
        caller: &RelayCaller,
        endpoint: &str,
        status_code: u16,
        latency_ms: i32,
    ) {
        let record = NewUsageRecord {
            api_key_id: caller.key.key_id,
            user_id: caller.key.user_id,
            endpoint: endpoint.to_string(),
            method: "POST".to_string(),
            status_code: Some(i32::from(status_code)),
            latency_ms: Some(latency_ms),
            ip_address: caller.ip_address.clone(),
        };
        match self.usage.record(record).await {
            Ok(_) => self.feed.publish(caller.key.user_id, ChangedTable::UsageRecords),
            Err(e) => tracing::warn!(error = %e, "Failed to record API usage"),
        }
    }

    async fn finish(
        &self,
        caller: &RelayCaller,
        endpoint: &str,
        result: &AppResult<ScreeningResponse>,
        started: Instant,
    ) {
        let status = match result {
            Ok(_) => 200,
            Err(e) => e.status_code(),
        };
        let latency_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        self.record_usage(caller, endpoint, status, latency_ms).await;
    }

    async fn screen_transfer(
        &self,
        caller: &RelayCaller,
        request: &CheckRequest,
    ) -> AppResult<ScreeningResponse> {
        require(caller, ApiKeyPermission::Check)?;
        validate_check(request)?;
        self.enforce_quota(caller).await?;

        let response = self.service.check(&caller.key.partner_id, request).await?;
        self.store_decision(
            caller,
            NewRelayLog {
                partner_id: caller.key.partner_id.clone(),
                api_key_id: Some(caller.key.key_id),
                kind: RelayKind::Check,
                chain: request.chain.clone(),
                from_address: Some(request.from.clone()),
                to_address: Some(request.to.clone()),
                decision: RelayDecision::from_allowed(response.allowed),
                risk_score: response.risk_score,
                risk_band: response.risk_band.clone(),
                reasons: response.reasons.clone(),
                tx_hash: response.tx_hash.clone(),
                idempotency_key: None,
            },
        )
        .await?;
        Ok(response)
    }

    async fn screen_transaction(
        &self,
        caller: &RelayCaller,
        request: &RelayRequest,
    ) -> AppResult<ScreeningResponse> {
        require(caller, ApiKeyPermission::Relay)?;
        validate_relay(request)?;

        if let Some(key) = &request.idempotency_key
            && let Some(existing) = self
                .logs
                .find_by_idempotency_key(&caller.key.partner_id, key)
                .await?
        {
            tracing::info!(relay_log_id = %existing.id, "Replaying stored relay decision");
            return Ok(ScreeningResponse::from(&existing));
        }

        self.enforce_quota(caller).await?;

        let response = self.service.relay(&caller.key.partner_id, request).await?;
        let stored = self
            .store_decision(
                caller,
                NewRelayLog {
                    partner_id: caller.key.partner_id.clone(),
                    api_key_id: Some(caller.key.key_id),
                    kind: RelayKind::Relay,
                    chain: request.chain.clone(),
                    from_address: None,
                    to_address: None,
                    decision: RelayDecision::from_allowed(response.allowed),
                    risk_score: response.risk_score,
                    risk_band: response.risk_band.clone(),
                    reasons: response.reasons.clone(),
                    tx_hash: response.tx_hash.clone(),
                    idempotency_key: request.idempotency_key.clone(),
                },
            )
            .await?;

        if stored.is_none()
            && let Some(key) = &request.idempotency_key
        {
            // A concurrent call with the same idempotency key won the insert.
            let winner = self
                .logs
                .find_by_idempotency_key(&caller.key.partner_id, key)
                .await?
                .ok_or_else(|| AppError::Internal("Idempotent relay log vanished".into()))?;
            return Ok(ScreeningResponse::from(&winner));
        }
        Ok(response)
    }

    async fn store_decision(
        &self,
        caller: &RelayCaller,
        log: NewRelayLog,
    ) -> AppResult<Option<RelayLog>> {
        let Some(stored) = self.logs.insert(log).await? else {
            return Ok(None);
        };
        self.feed.publish(caller.key.user_id, ChangedTable::RelayLogs);
        tracing::info!(
            relay_log_id = %stored.id,
            decision = %stored.decision,
            risk_band = %stored.risk_band,
            "Screening decision stored"
        );
        Ok(Some(stored))
    }

    async fn enforce_quota(&self, caller: &RelayCaller) -> AppResult<()> {
        let used = self
            .usage
            .count_for_user_since(caller.key.user_id, month_start(Utc::now().date_naive()))
            .await?;
        if used >= i64::from(caller.key.monthly_request_limit) {
            tracing::warn!(used, limit = caller.key.monthly_request_limit, "Monthly quota exhausted");
            return Err(AppError::QuotaExceeded);
        }
        Ok(())
    }
}

fn require(caller: &RelayCaller, permission: ApiKeyPermission) -> AppResult<()> {
    if caller.key.allows(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn validate_check(request: &CheckRequest) -> AppResult<()> {
    if !is_valid_chain(&request.chain) {
        return Err(AppError::InvalidInput("Invalid chain".into()));
    }
    if request.to.trim().is_empty() || request.from.trim().is_empty() {
        return Err(AppError::InvalidInput("Both 'to' and 'from' are required".into()));
    }
    if request.asset.trim().is_empty() {
        return Err(AppError::InvalidInput("Asset is required".into()));
    }
    match request.value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
        _ => Err(AppError::InvalidInput("Value must be a non-negative number".into())),
    }
}

fn validate_relay(request: &RelayRequest) -> AppResult<()> {
    if !is_valid_chain(&request.chain) {
        return Err(AppError::InvalidInput("Invalid chain".into()));
    }
    let raw_tx = request.raw_tx.trim();
    if raw_tx.is_empty() || raw_tx.len() > MAX_RAW_TX_LEN {
        return Err(AppError::InvalidInput("Invalid raw transaction".into()));
    }
    if let Some(key) = &request.idempotency_key
        && !is_valid_idempotency_key(key)
    {
        return Err(AppError::InvalidInput("Invalid idempotency key".into()));
    }
    Ok(())
}

/// Midnight UTC on the first day of `today`'s month.
pub fn month_start(today: NaiveDate) -> NaiveDateTime {
    today
        .with_day(1)
        .unwrap_or(today)
        .and_time(chrono::NaiveTime::MIN)
}
