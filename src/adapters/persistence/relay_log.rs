use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_enum_with_fallback, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::analytics::RelayLogRepo,
    domain::entities::relay_log::{NewRelayLog, RelayLog},
};

const LOG_COLUMNS: &str = "id, partner_id, api_key_id, kind, chain, from_address, to_address, \
     decision, risk_score, risk_band, reasons, tx_hash, idempotency_key, created_at";

fn row_to_log(row: &sqlx::postgres::PgRow) -> RelayLog {
    let id: Uuid = row.get("id");
    let entity_id = id.to_string();
    let kind: String = row.get("kind");
    let decision: String = row.get("decision");
    let reasons: serde_json::Value = row.get("reasons");
    RelayLog {
        id,
        partner_id: row.get("partner_id"),
        api_key_id: row.get("api_key_id"),
        kind: parse_enum_with_fallback(&kind, "kind", "relay_log", &entity_id),
        chain: row.get("chain"),
        from_address: row.get("from_address"),
        to_address: row.get("to_address"),
        decision: parse_enum_with_fallback(&decision, "decision", "relay_log", &entity_id),
        risk_score: row.get("risk_score"),
        risk_band: row.get("risk_band"),
        reasons: parse_json_with_fallback(&reasons, "reasons", "relay_log", &entity_id),
        tx_hash: row.get("tx_hash"),
        idempotency_key: row.get("idempotency_key"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl RelayLogRepo for PostgresPersistence {
    async fn insert(&self, log: NewRelayLog) -> AppResult<Option<RelayLog>> {
        let reasons =
            serde_json::to_value(&log.reasons).map_err(|e| AppError::Internal(e.to_string()))?;
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO relay_logs
                (id, partner_id, api_key_id, kind, chain, from_address, to_address,
                 decision, risk_score, risk_band, reasons, tx_hash, idempotency_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (partner_id, idempotency_key) WHERE idempotency_key IS NOT NULL
            DO NOTHING
            RETURNING {LOG_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&log.partner_id)
        .bind(log.api_key_id)
        .bind(log.kind.as_ref())
        .bind(&log.chain)
        .bind(&log.from_address)
        .bind(&log.to_address)
        .bind(log.decision.as_ref())
        .bind(log.risk_score)
        .bind(&log.risk_band)
        .bind(reasons)
        .bind(&log.tx_hash)
        .bind(&log.idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_log))
    }

    async fn find_by_idempotency_key(
        &self,
        partner_id: &str,
        idempotency_key: &str,
    ) -> AppResult<Option<RelayLog>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {LOG_COLUMNS}
            FROM relay_logs
            WHERE partner_id = $1 AND idempotency_key = $2
            "#
        ))
        .bind(partner_id)
        .bind(idempotency_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_log))
    }

    async fn list_for_partner_since(
        &self,
        partner_id: &str,
        since: NaiveDateTime,
    ) -> AppResult<Vec<RelayLog>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {LOG_COLUMNS}
            FROM relay_logs
            WHERE partner_id = $1 AND created_at >= $2
            ORDER BY created_at ASC
            "#
        ))
        .bind(partner_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(rows.iter().map(row_to_log).collect())
    }
}
