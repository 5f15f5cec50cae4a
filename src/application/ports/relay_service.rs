//! Port for the external transaction screening ("relay/check") service.
//!
//! The scoring engine lives outside this service; only its HTTP contract is
//! modelled here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_error::AppResult;

/// Screening request for a transfer that has not been signed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckRequest {
    pub chain: String,
    pub to: String,
    pub from: String,
    /// Decimal amount in the asset's display units.
    pub value: String,
    pub asset: String,
}

/// Screening request for a signed transaction that should be broadcast when allowed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelayRequest {
    pub chain: String,
    pub raw_tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningResponse {
    pub allowed: bool,
    pub risk_band: String,
    pub risk_score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(rename = "txHash", default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[async_trait]
pub trait RelayService: Send + Sync {
    async fn check(&self, partner_id: &str, request: &CheckRequest) -> AppResult<ScreeningResponse>;

    async fn relay(&self, partner_id: &str, request: &RelayRequest) -> AppResult<ScreeningResponse>;
}
