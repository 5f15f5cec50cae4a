//! In-memory mock implementations for profile and preference repositories.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::profile::{PreferencesRepo, ProfileRepo},
    domain::entities::{
        developer_profile::{
            DeveloperProfile, NewDeveloperProfile, ProfileChanges, ProfileCredentials,
        },
        preferences::{Theme, UserPreferences},
    },
};

// ============================================================================
// InMemoryProfileRepo
// ============================================================================

/// In-memory implementation of ProfileRepo for testing.
///
/// Seeded profiles carry an empty password hash, so they can never sign in;
/// sign up through `AuthUseCases` when a test needs working credentials.
#[derive(Default)]
pub struct InMemoryProfileRepo {
    pub profiles: Mutex<HashMap<Uuid, ProfileCredentials>>,
}

impl InMemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial profiles for testing.
    pub fn with_profiles(profiles: Vec<DeveloperProfile>) -> Self {
        let map = profiles
            .into_iter()
            .map(|profile| {
                (
                    profile.user_id,
                    ProfileCredentials {
                        profile,
                        password_hash: String::new(),
                    },
                )
            })
            .collect();
        Self {
            profiles: Mutex::new(map),
        }
    }

    /// Get all profiles (for test assertions).
    pub fn get_all(&self) -> Vec<DeveloperProfile> {
        self.profiles
            .lock()
            .unwrap()
            .values()
            .map(|c| c.profile.clone())
            .collect()
    }
}

#[async_trait]
impl ProfileRepo for InMemoryProfileRepo {
    async fn create(&self, new: NewDeveloperProfile) -> AppResult<DeveloperProfile> {
        let mut profiles = self.profiles.lock().unwrap();

        if profiles.values().any(|c| c.profile.email == new.email) {
            return Err(AppError::Conflict(
                "An account with this email already exists".into(),
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let profile = DeveloperProfile {
            user_id: new.user_id,
            email: new.email,
            company_name: new.company_name,
            website: new.website,
            usage_plan: new.usage_plan,
            monthly_request_limit: new.monthly_request_limit,
            partner_id: new.partner_id,
            created_at: now,
            updated_at: now,
        };
        profiles.insert(
            profile.user_id,
            ProfileCredentials {
                profile: profile.clone(),
                password_hash: new.password_hash,
            },
        );
        Ok(profile)
    }

    async fn get_by_user_id(&self, user_id: Uuid) -> AppResult<Option<DeveloperProfile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|c| c.profile.clone()))
    }

    async fn get_credentials_by_email(
        &self,
        email: &str,
    ) -> AppResult<Option<ProfileCredentials>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|c| c.profile.email == email)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .any(|c| c.profile.email == email))
    }

    async fn update(
        &self,
        user_id: Uuid,
        changes: &ProfileChanges,
    ) -> AppResult<Option<DeveloperProfile>> {
        let mut profiles = self.profiles.lock().unwrap();
        let Some(stored) = profiles.get_mut(&user_id) else {
            return Ok(None);
        };
        changes.apply_to(&mut stored.profile, chrono::Utc::now().naive_utc());
        Ok(Some(stored.profile.clone()))
    }
}

// ============================================================================
// InMemoryPreferencesRepo
// ============================================================================

/// In-memory implementation of PreferencesRepo for testing.
#[derive(Default)]
pub struct InMemoryPreferencesRepo {
    pub preferences: Mutex<HashMap<Uuid, UserPreferences>>,
}

impl InMemoryPreferencesRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepo for InMemoryPreferencesRepo {
    async fn get(&self, user_id: Uuid) -> AppResult<Option<UserPreferences>> {
        Ok(self.preferences.lock().unwrap().get(&user_id).cloned())
    }

    async fn upsert(&self, user_id: Uuid, theme: Theme) -> AppResult<UserPreferences> {
        let prefs = UserPreferences {
            user_id,
            theme,
            updated_at: Some(chrono::Utc::now().naive_utc()),
        };
        self.preferences
            .lock()
            .unwrap()
            .insert(user_id, prefs.clone());
        Ok(prefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_profile;

    #[tokio::test]
    async fn test_seeded_profiles_cannot_sign_in() {
        let profile = create_test_profile(|p| p.email = "alice@example.com".to_string());
        let repo = InMemoryProfileRepo::with_profiles(vec![profile]);

        let creds = repo
            .get_credentials_by_email("alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(creds.password_hash.is_empty());
        assert!(repo.email_exists("alice@example.com").await.unwrap());
        assert!(!repo.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_missing_profile_returns_none() {
        let repo = InMemoryProfileRepo::new();
        let result = repo
            .update(Uuid::new_v4(), &ProfileChanges::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
