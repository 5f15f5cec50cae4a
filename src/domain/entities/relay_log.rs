use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RelayKind {
    #[default]
    Check,
    Relay,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RelayDecision {
    Allow,
    /// Unknown stored decisions read back as blocked.
    #[default]
    Block,
}

impl RelayDecision {
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            RelayDecision::Allow
        } else {
            RelayDecision::Block
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, RelayDecision::Allow)
    }
}

/// Screening decision for one transaction. Rows are append-only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayLog {
    pub id: Uuid,
    pub partner_id: String,
    pub api_key_id: Option<Uuid>,
    pub kind: RelayKind,
    pub chain: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub decision: RelayDecision,
    pub risk_score: f64,
    pub risk_band: String,
    pub reasons: Vec<String>,
    pub tx_hash: Option<String>,
    pub idempotency_key: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewRelayLog {
    pub partner_id: String,
    pub api_key_id: Option<Uuid>,
    pub kind: RelayKind,
    pub chain: String,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub decision: RelayDecision,
    pub risk_score: f64,
    pub risk_band: String,
    pub reasons: Vec<String>,
    pub tx_hash: Option<String>,
    pub idempotency_key: Option<String>,
}
