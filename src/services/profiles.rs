use async_trait::async_trait;
use std::sync::Arc;

use crate::models::Profile;
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::store::{ProfileStore, StoreError};

/// Read-through cache in front of a profile store
///
/// Cache failures never fail a request: reads fall back to the inner store
/// and write errors are logged. Upserts invalidate the directory and the
/// affected profile.
pub struct CachedProfileStore {
    inner: Arc<dyn ProfileStore>,
    cache: Arc<CacheManager>,
}

impl CachedProfileStore {
    pub fn new(inner: Arc<dyn ProfileStore>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }

    async fn remember<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
    }

    async fn forget(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            tracing::warn!("Failed to invalidate cache: {}", e);
        }
    }
}

#[async_trait]
impl ProfileStore for CachedProfileStore {
    async fn list_profiles(&self) -> Result<Vec<Profile>, StoreError> {
        let key = CacheKey::profile_directory();
        if let Ok(profiles) = self.cache.get::<Vec<Profile>>(&key).await {
            return Ok(profiles);
        }

        let profiles = self.inner.list_profiles().await?;
        self.remember(&key, &profiles).await;
        Ok(profiles)
    }

    async fn get_profile(&self, id: &str) -> Result<Profile, StoreError> {
        let key = CacheKey::profile(id);
        if let Ok(profile) = self.cache.get::<Profile>(&key).await {
            return Ok(profile);
        }

        let profile = self.inner.get_profile(id).await?;
        self.remember(&key, &profile).await;
        Ok(profile)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<Profile, StoreError> {
        let stored = self.inner.upsert_profile(profile).await?;

        self.forget(&CacheKey::profile_directory()).await;
        self.forget(&CacheKey::profile(&profile.id)).await;

        Ok(stored)
    }
}
