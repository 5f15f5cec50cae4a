use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

/// One call made with an API key. Rows are append-only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageRecord {
    pub id: i64,
    pub api_key_id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: Option<i32>,
    pub latency_ms: Option<i32>,
    pub ip_address: Option<String>,
    pub created_at: NaiveDateTime,
}

impl UsageRecord {
    /// A call counts as successful only when a status was recorded and it is below 400.
    pub fn is_success(&self) -> bool {
        matches!(self.status_code, Some(code) if code < 400)
    }
}

#[derive(Debug, Clone)]
pub struct NewUsageRecord {
    pub api_key_id: Uuid,
    pub user_id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub status_code: Option<i32>,
    pub latency_ms: Option<i32>,
    pub ip_address: Option<String>,
}
