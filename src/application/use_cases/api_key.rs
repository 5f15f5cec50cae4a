use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{use_cases::profile::ProfileRepo, validators::is_valid_key_name},
    domain::entities::api_key::{
        ApiKey, ApiKeyPermission, ApiKeyStatus, DEFAULT_RATE_LIMIT_PER_MINUTE, NewApiKey, mask_key,
    },
};

const API_KEY_PREFIX: &str = "aml_";
const API_KEY_RANDOM_BYTES: usize = 32;
pub const MAX_EXPIRES_IN_DAYS: i64 = 365;

// ============================================================================
// Repository Trait
// ============================================================================

/// Every mutating method is scoped by owner; a key belonging to someone else
/// behaves exactly like a missing key.
#[async_trait]
pub trait ApiKeyRepo: Send + Sync {
    async fn create(&self, key: NewApiKey) -> AppResult<ApiKey>;

    /// Newest first.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>>;

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>>;

    /// Returns whether a row was removed.
    async fn delete(&self, user_id: Uuid, key_id: Uuid) -> AppResult<bool>;

    async fn set_active(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        is_active: bool,
    ) -> AppResult<Option<ApiKey>>;

    /// Swaps the secret for the same key id and stamps `rotated_at`.
    async fn replace_secret(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        key_hash: &str,
        masked_key: &str,
    ) -> AppResult<Option<ApiKey>>;

    async fn update_last_used(&self, key_id: Uuid) -> AppResult<()>;
}

// ============================================================================
// Views
// ============================================================================

/// Dashboard rendering of a key. `key` is always the masked form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyView {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub status: ApiKeyStatus,
    pub permissions: Vec<ApiKeyPermission>,
    pub rate_limit_per_minute: i32,
    pub expires_at: Option<NaiveDateTime>,
    pub last_used_at: Option<NaiveDateTime>,
    pub rotated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl From<&ApiKey> for ApiKeyView {
    fn from(key: &ApiKey) -> Self {
        Self {
            id: key.id,
            name: key.name.clone(),
            key: key.display_key().to_string(),
            status: key.status(),
            permissions: key.permissions.clone(),
            rate_limit_per_minute: key.rate_limit_per_minute,
            expires_at: key.expires_at,
            last_used_at: key.last_used_at,
            rotated_at: key.rotated_at,
            created_at: key.created_at,
        }
    }
}

/// A freshly created or rotated key. The plaintext exists only in this value.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedApiKey {
    pub id: Uuid,
    pub name: String,
    /// Plaintext secret, returned exactly once.
    pub key: String,
    pub masked_key: String,
    pub status: ApiKeyStatus,
    pub permissions: Vec<ApiKeyPermission>,
    pub rate_limit_per_minute: i32,
    pub expires_at: Option<NaiveDateTime>,
    pub rotated_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}

impl fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("id", &self.id)
            .field("masked_key", &self.masked_key)
            .field("key", &"[redacted]")
            .finish()
    }
}

impl IssuedApiKey {
    fn new(key: &ApiKey, secret: String) -> Self {
        Self {
            id: key.id,
            name: key.name.clone(),
            key: secret,
            masked_key: key.display_key().to_string(),
            status: key.status(),
            permissions: key.permissions.clone(),
            rate_limit_per_minute: key.rate_limit_per_minute,
            expires_at: key.expires_at,
            rotated_at: key.rotated_at,
            created_at: key.created_at,
        }
    }
}

/// Identity attached to a request that authenticated with an API key.
#[derive(Debug, Clone)]
pub struct AuthenticatedKey {
    pub key_id: Uuid,
    pub user_id: Uuid,
    pub partner_id: String,
    pub permissions: Vec<ApiKeyPermission>,
    pub rate_limit_per_minute: i32,
    pub monthly_request_limit: i32,
}

impl AuthenticatedKey {
    pub fn allows(&self, permission: ApiKeyPermission) -> bool {
        self.permissions.contains(&permission)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateKeyInput {
    pub name: String,
    pub permissions: Option<Vec<String>>,
    pub expires_in_days: Option<i64>,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ApiKeyUseCases {
    repo: Arc<dyn ApiKeyRepo>,
    profiles: Arc<dyn ProfileRepo>,
}

impl ApiKeyUseCases {
    pub fn new(repo: Arc<dyn ApiKeyRepo>, profiles: Arc<dyn ProfileRepo>) -> Self {
        Self { repo, profiles }
    }

    pub async fn list_keys(&self, user_id: Uuid) -> AppResult<Vec<ApiKeyView>> {
        let keys = self.repo.list_by_user(user_id).await?;
        Ok(keys.iter().map(ApiKeyView::from).collect())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_key(&self, user_id: Uuid, input: CreateKeyInput) -> AppResult<IssuedApiKey> {
        if !is_valid_key_name(&input.name) {
            return Err(AppError::InvalidInput("Key name is required".into()));
        }

        let permissions = match input.permissions {
            Some(raw) => parse_permissions(&raw)?,
            None => ApiKeyPermission::all(),
        };

        let expires_at = match input.expires_in_days {
            Some(days) if (1..=MAX_EXPIRES_IN_DAYS).contains(&days) => {
                Some((Utc::now() + Duration::days(days)).naive_utc())
            }
            Some(_) => {
                return Err(AppError::InvalidInput(format!(
                    "expiresInDays must be between 1 and {MAX_EXPIRES_IN_DAYS}"
                )));
            }
            None => None,
        };

        let secret = generate_api_key();
        let key = self
            .repo
            .create(NewApiKey {
                user_id,
                name: input.name.trim().to_string(),
                key_hash: hash_api_key(&secret),
                masked_key: mask_key(&secret),
                permissions,
                rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
                expires_at,
            })
            .await?;

        tracing::info!(key_id = %key.id, "API key created");
        Ok(IssuedApiKey::new(&key, secret))
    }

    #[instrument(skip(self))]
    pub async fn delete_key(&self, user_id: Uuid, key_id: Uuid) -> AppResult<()> {
        if !self.repo.delete(user_id, key_id).await? {
            return Err(AppError::NotFound);
        }
        tracing::info!("API key deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        is_active: bool,
    ) -> AppResult<ApiKeyView> {
        let key = self
            .repo
            .set_active(user_id, key_id, is_active)
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!(status = %key.status(), "API key status changed");
        Ok(ApiKeyView::from(&key))
    }

    #[instrument(skip(self))]
    pub async fn rotate_key(&self, user_id: Uuid, key_id: Uuid) -> AppResult<IssuedApiKey> {
        let secret = generate_api_key();
        let key = self
            .repo
            .replace_secret(user_id, key_id, &hash_api_key(&secret), &mask_key(&secret))
            .await?
            .ok_or(AppError::NotFound)?;
        tracing::info!("API key rotated");
        Ok(IssuedApiKey::new(&key, secret))
    }

    /// Resolve a presented secret to its key and owner.
    #[instrument(skip(self, raw_key))]
    pub async fn authenticate(&self, raw_key: &str) -> AppResult<AuthenticatedKey> {
        let Some(key) = self.repo.get_by_hash(&hash_api_key(raw_key)).await? else {
            return Err(AppError::InvalidApiKey);
        };
        if !key.is_active || key.is_expired(Utc::now().naive_utc()) {
            tracing::debug!(key_id = %key.id, "Rejected inactive or expired key");
            return Err(AppError::InvalidApiKey);
        }

        let profile = self
            .profiles
            .get_by_user_id(key.user_id)
            .await?
            .ok_or(AppError::InvalidApiKey)?;

        if let Err(e) = self.repo.update_last_used(key.id).await {
            tracing::warn!(error = %e, key_id = %key.id, "Failed to update last_used_at");
        }

        Ok(AuthenticatedKey {
            key_id: key.id,
            user_id: key.user_id,
            partner_id: profile.partner_id,
            permissions: key.permissions,
            rate_limit_per_minute: key.rate_limit_per_minute,
            monthly_request_limit: profile.monthly_request_limit,
        })
    }
}

fn parse_permissions(raw: &[String]) -> AppResult<Vec<ApiKeyPermission>> {
    if raw.is_empty() {
        return Err(AppError::InvalidInput("At least one permission is required".into()));
    }
    let mut permissions = Vec::with_capacity(raw.len());
    for value in raw {
        let permission = ApiKeyPermission::from_str(value.trim())
            .map_err(|_| AppError::InvalidInput(format!("Unknown permission: {value}")))?;
        if !permissions.contains(&permission) {
            permissions.push(permission);
        }
    }
    Ok(permissions)
}

// ============================================================================
// Key Generation
// ============================================================================

/// `aml_` followed by 32 random bytes in lowercase hex.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_RANDOM_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    format!("{API_KEY_PREFIX}{}", hex::encode(bytes))
}

/// SHA-256 of the key, hex-encoded.
pub fn hash_api_key(raw_key: &str) -> String {
    hex::encode(Sha256::digest(raw_key.as_bytes()))
}
