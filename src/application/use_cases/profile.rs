use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::validators::{is_valid_website, normalize_optional_text},
    domain::entities::{
        developer_profile::{
            DeveloperProfile, NewDeveloperProfile, ProfileChanges, ProfileCredentials,
        },
        preferences::{Theme, UserPreferences},
        usage_plan::UsagePlan,
    },
};

// ============================================================================
// Repository Traits
// ============================================================================

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn create(&self, profile: NewDeveloperProfile) -> AppResult<DeveloperProfile>;

    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<DeveloperProfile>>;

    async fn get_credentials_by_email(&self, email: &str)
    -> AppResult<Option<ProfileCredentials>>;

    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// Applies the supplied fields and touches `updated_at`. `None` when no row matches.
    async fn update(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> AppResult<Option<DeveloperProfile>>;
}

#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>>;

    async fn upsert(&self, user_id: Uuid, theme: Theme) -> AppResult<UserPreferences>;
}

// ============================================================================
// Input Types
// ============================================================================

/// Raw profile update as received from the client. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub usage_plan: Option<String>,
}

impl ProfileUpdate {
    fn into_changes(self) -> AppResult<ProfileChanges> {
        let website = match self.website {
            Some(raw) => {
                let website = normalize_optional_text(&raw);
                if let Some(url) = &website
                    && !is_valid_website(url)
                {
                    return Err(AppError::InvalidInput(
                        "Website must be an http(s) URL".into(),
                    ));
                }
                Some(website)
            }
            None => None,
        };

        let usage_plan = match self.usage_plan {
            Some(raw) => Some(UsagePlan::from_str(raw.trim()).map_err(|_| {
                AppError::InvalidInput(format!("Unknown usage plan: {}", raw.trim()))
            })?),
            None => None,
        };

        Ok(ProfileChanges {
            company_name: self.company_name.map(|c| normalize_optional_text(&c)),
            website,
            usage_plan,
        })
    }
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct ProfileUseCases {
    repo: Arc<dyn ProfileRepo>,
    preferences: Arc<dyn PreferencesRepo>,
}

impl ProfileUseCases {
    pub fn new(repo: Arc<dyn ProfileRepo>, preferences: Arc<dyn PreferencesRepo>) -> Self {
        Self { repo, preferences }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<DeveloperProfile> {
        self.repo
            .get_by_user_id(user_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<DeveloperProfile> {
        let changes = update.into_changes()?;
        let profile = self
            .repo
            .update(user_id, &changes)
            .await?
            .ok_or(AppError::NotFound)?;

        tracing::info!(
            partner_id = %profile.partner_id,
            usage_plan = %profile.usage_plan,
            "Profile updated"
        );
        Ok(profile)
    }

    pub async fn get_preferences(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        Ok(self
            .preferences
            .get(user_id)
            .await?
            .unwrap_or_else(|| UserPreferences::defaults_for(user_id)))
    }

    #[instrument(skip(self))]
    pub async fn update_theme(&self, user_id: Uuid, theme: Theme) -> AppResult<UserPreferences> {
        self.preferences.upsert(user_id, theme).await
    }
}
