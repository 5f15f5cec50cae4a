use sqlx::PgPool;

use crate::app_error::AppError;

pub mod api_key;
pub mod developer_profile;
pub mod preferences;
pub mod relay_log;
pub mod usage_record;

const MAX_LOG_VALUE_LEN: usize = 200;

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Parse a JSON column, falling back to the default and logging when the
/// stored value has the wrong shape. SQL NULL is a silent default.
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncate_for_log(&json.to_string()),
            error = %err,
            "Failed to parse JSON column, using default value"
        );
        T::default()
    })
}

/// Parse a text enum column, logging unknown values.
pub fn parse_enum_with_fallback<T: std::str::FromStr + Default>(
    raw: &str,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    raw.parse().unwrap_or_else(|_| {
        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_value = %truncate_for_log(raw),
            "Unknown enum value in column, using default"
        );
        T::default()
    })
}

fn truncate_for_log(raw: &str) -> String {
    if raw.len() > MAX_LOG_VALUE_LEN {
        let cut = (0..=MAX_LOG_VALUE_LEN)
            .rev()
            .find(|i| raw.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &raw[..cut])
    } else {
        raw.to_string()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    AppError::Conflict("A record with this value already exists".into())
                } else if db_err.is_foreign_key_violation() {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if db_err.is_check_violation() {
                    AppError::InvalidInput("Value violates a constraint".into())
                } else {
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}
