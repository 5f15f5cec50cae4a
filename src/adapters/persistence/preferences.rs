use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_enum_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::profile::PreferencesRepo,
    domain::entities::preferences::{Theme, UserPreferences},
};

fn row_to_preferences(row: &sqlx::postgres::PgRow) -> UserPreferences {
    let user_id: Uuid = row.get("user_id");
    let theme: String = row.get("theme");
    UserPreferences {
        user_id,
        theme: parse_enum_with_fallback(&theme, "theme", "user_preferences", &user_id.to_string()),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl PreferencesRepo for PostgresPersistence {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        let row = sqlx::query(
            "SELECT user_id, theme, updated_at FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_preferences))
    }

    async fn upsert(&self, user_id: Uuid, theme: Theme) -> AppResult<UserPreferences> {
        let row = sqlx::query(
            r#"
            INSERT INTO user_preferences (user_id, theme)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE
                SET theme = EXCLUDED.theme,
                    updated_at = (NOW() AT TIME ZONE 'utc')
            RETURNING user_id, theme, updated_at
            "#,
        )
        .bind(user_id)
        .bind(theme.as_ref())
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row_to_preferences(&row))
    }
}
