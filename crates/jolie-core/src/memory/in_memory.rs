//! Process-local `MemoryStore` for tests and offline demos.
//! Mirrors the remote store's semantics: unique identifiers, replace-on-update
//! columns, `NotFound` on empty update/delete.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::store::MemoryStore;
use super::types::{ProfileUpdate, UserProfile};
use crate::types::StoreError;

#[derive(Default)]
pub struct InMemoryStore {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing profiles
    pub fn with_profiles(profiles: impl IntoIterator<Item = UserProfile>) -> Self {
        let profiles = profiles
            .into_iter()
            .map(|p| (p.identifier.clone(), p))
            .collect();
        Self {
            profiles: RwLock::new(profiles),
        }
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn fetch(&self, identifier: &str) -> Result<Option<UserProfile>, StoreError> {
        Ok(self.profiles.read().await.get(identifier).cloned())
    }

    async fn create(&self, profile: &UserProfile) -> Result<Vec<UserProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.identifier) {
            return Err(StoreError::Request(format!(
                "duplicate key value violates unique constraint: {}",
                profile.identifier
            )));
        }
        profiles.insert(profile.identifier.clone(), profile.clone());
        Ok(vec![profile.clone()])
    }

    async fn update(
        &self,
        identifier: &str,
        update: &ProfileUpdate,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(identifier)
            .ok_or_else(|| StoreError::NotFound(identifier.to_string()))?;
        profile.apply(update);
        Ok(vec![profile.clone()])
    }

    async fn delete(&self, identifier: &str) -> Result<(), StoreError> {
        self.profiles
            .write()
            .await
            .remove(identifier)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(identifier.to_string()))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
