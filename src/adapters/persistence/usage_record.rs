use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::analytics::UsageRepo,
    domain::entities::usage_record::{NewUsageRecord, UsageRecord},
};

const USAGE_COLUMNS: &str =
    "id, api_key_id, user_id, endpoint, method, status_code, latency_ms, ip_address, created_at";

fn row_to_record(row: &sqlx::postgres::PgRow) -> UsageRecord {
    UsageRecord {
        id: row.get("id"),
        api_key_id: row.get("api_key_id"),
        user_id: row.get("user_id"),
        endpoint: row.get("endpoint"),
        method: row.get("method"),
        status_code: row.get("status_code"),
        latency_ms: row.get("latency_ms"),
        ip_address: row.get("ip_address"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UsageRepo for PostgresPersistence {
    async fn record(&self, record: NewUsageRecord) -> AppResult<UsageRecord> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO usage_records
                (api_key_id, user_id, endpoint, method, status_code, latency_ms, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USAGE_COLUMNS}
            "#
        ))
        .bind(record.api_key_id)
        .bind(record.user_id)
        .bind(&record.endpoint)
        .bind(&record.method)
        .bind(record.status_code)
        .bind(record.latency_ms)
        .bind(&record.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_record(&row))
    }

    async fn list_for_user_since(
        &self,
        user_id: Uuid,
        since: NaiveDateTime,
    ) -> AppResult<Vec<UsageRecord>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {USAGE_COLUMNS}
            FROM usage_records
            WHERE user_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count_for_user_since(&self, user_id: Uuid, since: NaiveDateTime) -> AppResult<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM usage_records
            WHERE user_id = $1 AND created_at >= $2
            "#,
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.get("count"))
    }
}
