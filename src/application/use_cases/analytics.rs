use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        change_feed::{ChangeEvent, ChangeFeed},
        use_cases::profile::ProfileRepo,
    },
    domain::entities::{
        relay_log::{NewRelayLog, RelayLog},
        usage_record::{NewUsageRecord, UsageRecord},
    },
};

pub const DEFAULT_WINDOW_DAYS: u32 = 7;
pub const MAX_WINDOW_DAYS: u32 = 90;

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait UsageRepo: Send + Sync {
    async fn record(&self, record: NewUsageRecord) -> AppResult<UsageRecord>;

    /// Every row for the owner, including rows of keys deleted since.
    async fn list_for_user_since(
        &self,
        user_id: Uuid,
        since: NaiveDateTime,
    ) -> AppResult<Vec<UsageRecord>>;

    async fn count_for_user_since(&self, user_id: Uuid, since: NaiveDateTime) -> AppResult<i64>;
}

#[async_trait]
pub trait RelayLogRepo: Send + Sync {
    /// `None` when the partner already logged the same idempotency key; nothing
    /// is written in that case.
    async fn insert(&self, log: NewRelayLog) -> AppResult<Option<RelayLog>>;

    async fn find_by_idempotency_key(
        &self,
        partner_id: &str,
        idempotency_key: &str,
    ) -> AppResult<Option<RelayLog>>;

    async fn list_for_partner_since(
        &self,
        partner_id: &str,
        since: NaiveDateTime,
    ) -> AppResult<Vec<RelayLog>>;
}

// ============================================================================
// Report Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub total_requests: u64,
    pub today_requests: u64,
    pub average_latency_ms: u64,
    /// Whole percent, 0 when there are no records.
    pub success_rate: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaySummary {
    pub total: u64,
    pub allowed: u64,
    pub blocked: u64,
    pub by_risk_band: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub days: u32,
    pub daily: Vec<DailyUsage>,
    pub summary: UsageSummary,
    pub relay: RelaySummary,
}

// ============================================================================
// Aggregation
// ============================================================================

/// First instant of the window ending on `today`, inclusive.
pub fn window_start(today: NaiveDate, days: u32) -> NaiveDateTime {
    today
        .checked_sub_days(Days::new(u64::from(days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MIN)
        .and_time(chrono::NaiveTime::MIN)
}

/// Exactly `days` chronological buckets ending on `today`. Records outside
/// the window are ignored.
pub fn bucket_by_day(records: &[UsageRecord], days: u32, today: NaiveDate) -> Vec<DailyUsage> {
    let first = window_start(today, days).date();
    let mut buckets: Vec<DailyUsage> = first
        .iter_days()
        .take(days as usize)
        .map(|date| DailyUsage {
            date,
            total_requests: 0,
            successful: 0,
            failed: 0,
        })
        .collect();

    for record in records {
        let date = record.created_at.date();
        if date < first || date > today {
            continue;
        }
        let offset = (date - first).num_days() as usize;
        if let Some(bucket) = buckets.get_mut(offset) {
            bucket.total_requests += 1;
            if record.is_success() {
                bucket.successful += 1;
            } else {
                bucket.failed += 1;
            }
        }
    }
    buckets
}

pub fn summarize(records: &[UsageRecord], today: NaiveDate) -> UsageSummary {
    let total = records.len() as u64;
    let today_requests = records
        .iter()
        .filter(|r| r.created_at.date() == today)
        .count() as u64;

    let latencies: Vec<i64> = records
        .iter()
        .filter_map(|r| r.latency_ms.map(i64::from))
        .collect();
    let average_latency_ms = if latencies.is_empty() {
        0
    } else {
        let mean = latencies.iter().sum::<i64>() as f64 / latencies.len() as f64;
        mean.round().max(0.0) as u64
    };

    let success_rate = if total == 0 {
        0
    } else {
        let successful = records.iter().filter(|r| r.is_success()).count() as f64;
        (successful * 100.0 / total as f64).round() as u64
    };

    UsageSummary {
        total_requests: total,
        today_requests,
        average_latency_ms,
        success_rate,
    }
}

pub fn summarize_relay(logs: &[RelayLog]) -> RelaySummary {
    logs.iter().fold(RelaySummary::default(), |mut acc, log| {
        acc.total += 1;
        if log.decision.is_allowed() {
            acc.allowed += 1;
        } else {
            acc.blocked += 1;
        }
        *acc.by_risk_band.entry(log.risk_band.clone()).or_default() += 1;
        acc
    })
}

/// `None` selects the default window.
pub fn validate_window(days: Option<i64>) -> AppResult<u32> {
    match days {
        None => Ok(DEFAULT_WINDOW_DAYS),
        Some(d) if (1..=i64::from(MAX_WINDOW_DAYS)).contains(&d) => Ok(d as u32),
        Some(_) => Err(AppError::InvalidInput(format!(
            "days must be between 1 and {MAX_WINDOW_DAYS}"
        ))),
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct AnalyticsUseCases {
    profiles: Arc<dyn ProfileRepo>,
    usage: Arc<dyn UsageRepo>,
    relay_logs: Arc<dyn RelayLogRepo>,
    feed: ChangeFeed,
}

impl AnalyticsUseCases {
    pub fn new(
        profiles: Arc<dyn ProfileRepo>,
        usage: Arc<dyn UsageRepo>,
        relay_logs: Arc<dyn RelayLogRepo>,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            profiles,
            usage,
            relay_logs,
            feed,
        }
    }

    pub async fn report(&self, user_id: Uuid, days: u32) -> AppResult<AnalyticsReport> {
        self.report_for(user_id, days, Utc::now().date_naive()).await
    }

    #[instrument(skip(self))]
    pub async fn report_for(
        &self,
        user_id: Uuid,
        days: u32,
        today: NaiveDate,
    ) -> AppResult<AnalyticsReport> {
        let since = window_start(today, days);

        let records = self.usage.list_for_user_since(user_id, since).await?;

        let profile = self
            .profiles
            .get_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotFound)?;
        let logs = self
            .relay_logs
            .list_for_partner_since(&profile.partner_id, since)
            .await?;

        Ok(AnalyticsReport {
            days,
            daily: bucket_by_day(&records, days, today),
            summary: summarize(&records, today),
            relay: summarize_relay(&logs),
        })
    }

    /// Raw change notifications; callers filter by owner.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.feed.subscribe()
    }
}
