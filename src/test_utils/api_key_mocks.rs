//! In-memory mock implementation of the API key repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{
    app_error::AppResult,
    application::use_cases::api_key::ApiKeyRepo,
    domain::entities::api_key::{ApiKey, NewApiKey},
};

/// In-memory implementation of ApiKeyRepo for testing.
#[derive(Default)]
pub struct InMemoryApiKeyRepo {
    pub keys: Mutex<HashMap<Uuid, ApiKey>>,
}

impl InMemoryApiKeyRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial keys for testing.
    pub fn with_keys(keys: Vec<ApiKey>) -> Self {
        let map = keys.into_iter().map(|k| (k.id, k)).collect();
        Self {
            keys: Mutex::new(map),
        }
    }

    /// Insert a fully-formed key, bypassing `create`.
    pub fn insert(&self, key: ApiKey) {
        self.keys.lock().unwrap().insert(key.id, key);
    }

    /// Get all keys (for test assertions).
    pub fn get_all(&self) -> Vec<ApiKey> {
        self.keys.lock().unwrap().values().cloned().collect()
    }

    fn owned_mut<R>(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        f: impl FnOnce(&mut ApiKey) -> R,
    ) -> Option<R> {
        let mut keys = self.keys.lock().unwrap();
        keys.get_mut(&key_id).filter(|k| k.user_id == user_id).map(f)
    }
}

#[async_trait]
impl ApiKeyRepo for InMemoryApiKeyRepo {
    async fn create(&self, new: NewApiKey) -> AppResult<ApiKey> {
        let key = ApiKey {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name,
            key_hash: new.key_hash,
            masked_key: Some(new.masked_key),
            permissions: new.permissions,
            is_active: true,
            rate_limit_per_minute: new.rate_limit_per_minute,
            expires_at: new.expires_at,
            last_used_at: None,
            rotated_at: None,
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.insert(key.clone());
        Ok(key)
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .keys
            .lock()
            .unwrap()
            .values()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn get_by_hash(&self, key_hash: &str) -> AppResult<Option<ApiKey>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .values()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    /// Removes the key only; its usage rows live in another repo and stay.
    async fn delete(&self, user_id: Uuid, key_id: Uuid) -> AppResult<bool> {
        let mut keys = self.keys.lock().unwrap();
        let owned = keys.get(&key_id).is_some_and(|k| k.user_id == user_id);
        if owned {
            keys.remove(&key_id);
        }
        Ok(owned)
    }

    async fn set_active(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        is_active: bool,
    ) -> AppResult<Option<ApiKey>> {
        Ok(self.owned_mut(user_id, key_id, |k| {
            k.is_active = is_active;
            k.clone()
        }))
    }

    async fn replace_secret(
        &self,
        user_id: Uuid,
        key_id: Uuid,
        key_hash: &str,
        masked_key: &str,
    ) -> AppResult<Option<ApiKey>> {
        Ok(self.owned_mut(user_id, key_id, |k| {
            k.key_hash = key_hash.to_string();
            k.masked_key = Some(masked_key.to_string());
            k.rotated_at = Some(chrono::Utc::now().naive_utc());
            k.clone()
        }))
    }

    async fn update_last_used(&self, key_id: Uuid) -> AppResult<()> {
        if let Some(key) = self.keys.lock().unwrap().get_mut(&key_id) {
            key.last_used_at = Some(chrono::Utc::now().naive_utc());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_api_key;

    #[tokio::test]
    async fn test_list_is_newest_first_and_scoped() {
        let user_id = Uuid::new_v4();
        let older = create_test_api_key(user_id, |k| k.name = "older".to_string());
        let newer = create_test_api_key(user_id, |k| {
            k.name = "newer".to_string();
            k.created_at = older.created_at + chrono::Duration::hours(1);
        });
        let foreign = create_test_api_key(Uuid::new_v4(), |_| {});
        let repo = InMemoryApiKeyRepo::with_keys(vec![older, newer, foreign]);

        let listed = repo.list_by_user(user_id).await.unwrap();
        let names: Vec<&str> = listed.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_mutations_ignore_foreign_owner() {
        let key = create_test_api_key(Uuid::new_v4(), |_| {});
        let key_id = key.id;
        let repo = InMemoryApiKeyRepo::with_keys(vec![key]);
        let stranger = Uuid::new_v4();

        assert!(!repo.delete(stranger, key_id).await.unwrap());
        assert!(
            repo.set_active(stranger, key_id, false)
                .await
                .unwrap()
                .is_none()
        );
        assert!(repo.get_all()[0].is_active);
    }
}
