use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, parse_enum_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::profile::ProfileRepo,
    domain::entities::developer_profile::{
        DeveloperProfile, NewDeveloperProfile, ProfileChanges, ProfileCredentials,
    },
};

const PROFILE_COLUMNS: &str = "user_id, email, company_name, website, usage_plan, \
     monthly_request_limit, partner_id, created_at, updated_at";

fn row_to_profile(row: &sqlx::postgres::PgRow) -> DeveloperProfile {
    let user_id: Uuid = row.get("user_id");
    let usage_plan: String = row.get("usage_plan");
    DeveloperProfile {
        user_id,
        email: row.get("email"),
        company_name: row.get("company_name"),
        website: row.get("website"),
        usage_plan: parse_enum_with_fallback(
            &usage_plan,
            "usage_plan",
            "developer_profile",
            &user_id.to_string(),
        ),
        monthly_request_limit: row.get("monthly_request_limit"),
        partner_id: row.get("partner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ProfileRepo for PostgresPersistence {
    async fn create(&self, profile: NewDeveloperProfile) -> AppResult<DeveloperProfile> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO developer_profiles
                (user_id, email, password_hash, company_name, website, usage_plan,
                 monthly_request_limit, partner_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.password_hash)
        .bind(&profile.company_name)
        .bind(&profile.website)
        .bind(profile.usage_plan.as_ref())
        .bind(profile.monthly_request_limit)
        .bind(&profile.partner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => {
                AppError::Conflict("An account with this email already exists".into())
            }
            other => other,
        })?;

        Ok(row_to_profile(&row))
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<DeveloperProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS} FROM developer_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<ProfileCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {PROFILE_COLUMNS}, password_hash FROM developer_profiles WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.map(|row| ProfileCredentials {
            profile: row_to_profile(&row),
            password_hash: row.get("password_hash"),
        }))
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM developer_profiles WHERE email = $1) AS present",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.get("present"))
    }

    async fn update(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> AppResult<Option<DeveloperProfile>> {
        // Each optional field is paired with a "was supplied" flag so a
        // supplied NULL clears the column while an omitted field is kept.
        let row = sqlx::query(&format!(
            r#"
            UPDATE developer_profiles SET
                company_name = CASE WHEN $2 THEN $3 ELSE company_name END,
                website = CASE WHEN $4 THEN $5 ELSE website END,
                usage_plan = COALESCE($6, usage_plan),
                updated_at = (NOW() AT TIME ZONE 'utc')
            WHERE user_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.company_name.is_some())
        .bind(changes.company_name.clone().flatten())
        .bind(changes.website.is_some())
        .bind(changes.website.clone().flatten())
        .bind(changes.usage_plan.map(|p| p.as_ref().to_string()))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(row.as_ref().map(row_to_profile))
    }
}
