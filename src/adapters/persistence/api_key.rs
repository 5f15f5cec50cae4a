use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::api_key::ApiKeyRepo,
    domain::entities::api_key::{ApiKey, NewApiKey},
};

const KEY_COLUMNS: &str = "id, user_id, name, key_hash, masked_key, permissions, is_active, \
     rate_limit_per_minute, expires_at, last_used_at, rotated_at, created_at";

fn row_to_key(row: &sqlx::postgres::PgRow) -> ApiKey {
    let id: Uuid = row.get("id");
    let permissions: serde_json::Value = row.get("permissions");
    ApiKey {
        id,
        user_id: row.get("user_id"),
        name: row.get("name"),
        key_hash: row.get("key_hash"),
        masked_key: row.get("masked_key"),
        permissions: parse_json_with_fallback(&permissions, "permissions", "api_key", &id.to_string()),
        is_active: row.get("is_active"),
        rate_limit_per_minute: row.get("rate_limit_per_minute"),
        expires_at: row.get("expires_at"),
        last_used_at: row.get("last_used_at"),
        rotated_at: row.get("rotated_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ApiKeyRepo for PostgresPersistence {
    async fn create(&self, key: NewApiKey) -> AppResult<ApiKey> {
        let permissions = serde_json::to_value(&key.permissions)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO api_keys
                (id, user_id, name, key_hash, masked_key, permissions, rate_limit_per_minute, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {KEY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(key.user_id)
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(&key.masked_key)
        .bind(permissions)
        .bind(key.rate_limit_per_minute)
        .bind(key.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_key(&row))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {KEY_COLUMNS}
            FROM api_keys
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_key).collect())
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query(&format!("SELECT {KEY_COLUMNS} FROM api_keys WHERE key_hash = $1"))
            .bind(key_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_key))
    }

    async fn delete(&self, user_id: Uuid, key_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1 AND user_id = $2")
            .bind(key_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_active(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        is_active: bool,
    ) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE api_keys SET is_active = $3
            WHERE id = $1 AND user_id = $2
            RETURNING {KEY_COLUMNS}
            "#
        ))
        .bind(key_id)
        .bind(user_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_key))
    }

    async fn replace_secret(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        key_hash: &str,
        masked_key: &str,
    ) -> AppResult<Option<ApiKey>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE api_keys
            SET key_hash = $3, masked_key = $4, rotated_at = (NOW() AT TIME ZONE 'utc')
            WHERE id = $1 AND user_id = $2
            RETURNING {KEY_COLUMNS}
            "#
        ))
        .bind(key_id)
        .bind(user_id)
        .bind(key_hash)
        .bind(masked_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_key))
    }

    async fn update_last_used(&self, key_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE api_keys SET last_used_at = (NOW() AT TIME ZONE 'utc') WHERE id = $1")
            .bind(key_id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
