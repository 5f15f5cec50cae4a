//! In-memory mock implementations for usage and relay-log repositories.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::analytics::{RelayLogRepo, UsageRepo},
    domain::entities::{
        relay_log::{NewRelayLog, RelayLog},
        usage_record::{NewUsageRecord, UsageRecord},
    },
};

// ============================================================================
// InMemoryUsageRepo
// ============================================================================

/// In-memory implementation of UsageRepo for testing. Keeps insertion order.
#[derive(Default)]
pub struct InMemoryUsageRepo {
    pub records: Mutex<Vec<UsageRecord>>,
}

impl InMemoryUsageRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<UsageRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// Get all records in insertion order (for test assertions).
    pub fn get_all(&self) -> Vec<UsageRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl UsageRepo for InMemoryUsageRepo {
    async fn record(&self, new: NewUsageRecord) -> AppResult<UsageRecord> {
        let mut records = self.records.lock().unwrap();
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        let record = UsageRecord {
            id: next_id,
            api_key_id: new.api_key_id,
            user_id: new.user_id,
            endpoint: new.endpoint,
            method: new.method,
            status_code: new.status_code,
            latency_ms: new.latency_ms,
            ip_address: new.ip_address,
            created_at: chrono::Utc::now().naive_utc(),
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn list_for_user_since(
        &self,
        user_id: Uuid,
        since: NaiveDateTime,
    ) -> AppResult<Vec<UsageRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .cloned()
            .collect())
    }

    async fn count_for_user_since(&self, user_id: Uuid, since: NaiveDateTime) -> AppResult<i64> {
        let count = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.user_id == user_id && r.created_at >= since)
            .count();
        Ok(count as i64)
    }
}

// ============================================================================
// InMemoryRelayLogRepo
// ============================================================================

/// In-memory implementation of RelayLogRepo for testing. Enforces the
/// per-partner idempotency key uniqueness the database index provides.
#[derive(Default)]
pub struct InMemoryRelayLogRepo {
    pub logs: Mutex<Vec<RelayLog>>,
}

impl InMemoryRelayLogRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_logs(logs: Vec<RelayLog>) -> Self {
        Self {
            logs: Mutex::new(logs),
        }
    }

    /// Get all logs in insertion order (for test assertions).
    pub fn get_all(&self) -> Vec<RelayLog> {
        self.logs.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayLogRepo for InMemoryRelayLogRepo {
    async fn insert(&self, new: NewRelayLog) -> AppResult<Option<RelayLog>> {
        let mut logs = self.logs.lock().unwrap();

        if let Some(key) = &new.idempotency_key
            && logs.iter().any(|l| {
                l.partner_id == new.partner_id && l.idempotency_key.as_ref() == Some(key)
            })
        {
            return Ok(None);
        }

        let log = RelayLog {
            id: Uuid::new_v4(),
            partner_id: new.partner_id,
            api_key_id: new.api_key_id,
            kind: new.kind,
            chain: new.chain,
            from_address: new.from_address,
            to_address: new.to_address,
            decision: new.decision,
            risk_score: new.risk_score,
            risk_band: new.risk_band,
            reasons: new.reasons,
            tx_hash: new.tx_hash,
            idempotency_key: new.idempotency_key,
            created_at: chrono::Utc::now().naive_utc(),
        };
        logs.push(log.clone());
        Ok(Some(log))
    }

    async fn find_by_idempotency_key(
        &self,
        partner_id: &str,
        idempotency_key: &str,
    ) -> AppResult<Option<RelayLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .find(|l| {
                l.partner_id == partner_id
                    && l.idempotency_key.as_deref() == Some(idempotency_key)
            })
            .cloned())
    }

    async fn list_for_partner_since(
        &self,
        partner_id: &str,
        since: NaiveDateTime,
    ) -> AppResult<Vec<RelayLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.partner_id == partner_id && l.created_at >= since)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::relay_log::{RelayDecision, RelayKind};

    fn new_log(partner_id: &str, idempotency_key: Option<&str>) -> NewRelayLog {
        NewRelayLog {
            partner_id: partner_id.to_string(),
            api_key_id: None,
            kind: RelayKind::Relay,
            chain: "ethereum".to_string(),
            from_address: None,
            to_address: None,
            decision: RelayDecision::Allow,
            risk_score: 0.2,
            risk_band: "LOW".to_string(),
            reasons: vec![],
            tx_hash: None,
            idempotency_key: idempotency_key.map(String::from),
        }
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key_is_skipped_per_partner() {
        let repo = InMemoryRelayLogRepo::new();

        assert!(repo.insert(new_log("AML-A", Some("k1"))).await.unwrap().is_some());
        assert!(repo.insert(new_log("AML-A", Some("k1"))).await.unwrap().is_none());
        assert!(repo.insert(new_log("AML-B", Some("k1"))).await.unwrap().is_some());
        assert!(repo.insert(new_log("AML-A", None)).await.unwrap().is_some());
        assert!(repo.insert(new_log("AML-A", None)).await.unwrap().is_some());

        assert_eq!(repo.get_all().len(), 4);
    }

    #[tokio::test]
    async fn test_usage_ids_are_sequential() {
        let repo = InMemoryUsageRepo::new();
        let new = || NewUsageRecord {
            api_key_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            endpoint: "/api/v1/check".to_string(),
            method: "POST".to_string(),
            status_code: Some(200),
            latency_ms: Some(10),
            ip_address: None,
        };

        let first = repo.record(new()).await.unwrap();
        let second = repo.record(new()).await.unwrap();
        assert_eq!(second.id, first.id + 1);
    }
}
