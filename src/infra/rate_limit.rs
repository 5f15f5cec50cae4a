use async_trait::async_trait;
use redis::{Script, aio::ConnectionManager};

use super::error::InfraError;
use crate::app_error::{AppError, AppResult};

/// Fixed-window counter keyed by an arbitrary bucket name.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// `Err(AppError::RateLimited)` once `bucket` has seen more than `limit`
    /// hits within the current `window_secs` window.
    async fn check(&self, bucket: &str, limit: u64, window_secs: u64) -> AppResult<()>;
}

pub fn ip_bucket(ip: &str) -> String {
    format!("rate:ip:{ip}")
}

pub fn api_key_bucket(key_id: &uuid::Uuid) -> String {
    format!("rate:key:{key_id}")
}

/// Atomic increment that sets the TTL on first hit, and repairs a missing TTL.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return current
"#;

#[derive(Clone)]
pub struct RedisRateLimiter {
    manager: ConnectionManager,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        Ok(Self {
            manager,
            script: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimiterTrait for RedisRateLimiter {
    async fn check(&self, bucket: &str, limit: u64, window_secs: u64) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let current: u64 = self
            .script
            .key(bucket)
            .arg(window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        if current > limit {
            tracing::debug!(bucket, current, limit, "Rate limit exceeded");
            return Err(AppError::RateLimited);
        }
        Ok(())
    }
}
