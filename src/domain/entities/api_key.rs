use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

pub const DEFAULT_RATE_LIMIT_PER_MINUTE: i32 = 60;

const MASK_PREFIX_LEN: usize = 8;
const MASK_SUFFIX_LEN: usize = 4;
const MASK_UNAVAILABLE: &str = "N/A";

/// Scope an API key may be used for against the relay gateway.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ApiKeyPermission {
    Check,
    Relay,
}

impl ApiKeyPermission {
    pub fn all() -> Vec<ApiKeyPermission> {
        vec![ApiKeyPermission::Check, ApiKeyPermission::Relay]
    }
}

/// Live states of a key. Deletion removes the row, so it has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApiKeyStatus {
    Active,
    Disabled,
}

impl ApiKeyStatus {
    pub fn from_active(is_active: bool) -> Self {
        if is_active {
            ApiKeyStatus::Active
        } else {
            ApiKeyStatus::Disabled
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub key_hash: String,
    pub masked_key: Option<String>,
    pub permissions: Vec<ApiKeyPermission>,
    pub is_active: bool,
    pub rate_limit_per_minute: i32,
    pub expires_at: Option<NaiveDateTime>,
    pub last_used_at: Option<NaiveDateTime>,
    pub rotated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl ApiKey {
    pub fn status(&self) -> ApiKeyStatus {
        ApiKeyStatus::from_active(self.is_active)
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// Display-safe rendering of the secret.
    pub fn display_key(&self) -> &str {
        self.masked_key.as_deref().unwrap_or(MASK_UNAVAILABLE)
    }
}

/// Fields required to insert a new key.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub user_id: Uuid,
    pub name: String,
    pub key_hash: String,
    pub masked_key: String,
    pub permissions: Vec<ApiKeyPermission>,
    pub rate_limit_per_minute: i32,
    pub expires_at: Option<NaiveDateTime>,
}

/// `prefix(8) + "..." + suffix(4)`, or `"N/A"` when the secret is too short
/// to hide anything.
pub fn mask_key(raw: &str) -> String {
    if !raw.is_ascii() || raw.len() <= MASK_PREFIX_LEN + MASK_SUFFIX_LEN {
        return MASK_UNAVAILABLE.to_string();
    }
    format!(
        "{}...{}",
        &raw[..MASK_PREFIX_LEN],
        &raw[raw.len() - MASK_SUFFIX_LEN..]
    )
}
