// src/db/memory.rs
// DOCUMENTATION: In-memory store adapters
// PURPOSE: Backends for local development (STORE_BACKEND=memory) and tests

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{FavoritesStore, ProfileStore, QuotaStore, StoreError};
use crate::models::{FavoriteRecord, Preference, Profile, QuotaState, Role};

/// Profiles and quota held in a map
/// DOCUMENTATION: Compare-and-set runs under the write lock, so it is atomic
/// with respect to every other caller
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a full profile row
    pub async fn put_profile(&self, user_id: Uuid, profile: Profile) {
        self.profiles.write().await.insert(user_id, profile);
    }

    pub async fn set_role(&self, user_id: Uuid, role: Role) {
        let mut profiles = self.profiles.write().await;
        profiles.entry(user_id).or_default().role = role;
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn load_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn save_preference(
        &self,
        user_id: Uuid,
        preference: &Preference,
    ) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        profiles.entry(user_id).or_default().preference = preference.clone();
        Ok(())
    }
}

#[async_trait]
impl QuotaStore for MemoryProfileStore {
    async fn load_quota(&self, user_id: Uuid) -> Result<QuotaState, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .get(&user_id)
            .map(|p| p.quota)
            .unwrap_or_default())
    }

    async fn compare_and_set_quota(
        &self,
        user_id: Uuid,
        expected: &QuotaState,
        next: &QuotaState,
    ) -> Result<bool, StoreError> {
        let mut profiles = self.profiles.write().await;
        let current = profiles.get(&user_id).map(|p| p.quota).unwrap_or_default();
        if current != *expected {
            return Ok(false);
        }
        profiles.entry(user_id).or_default().quota = *next;
        Ok(true)
    }
}

/// Favorites keyed by (user_id, place_id)
#[derive(Default)]
pub struct MemoryFavoritesStore {
    rows: RwLock<BTreeMap<(Uuid, String), FavoriteRecord>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all users
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

#[async_trait]
impl FavoritesStore for MemoryFavoritesStore {
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteRecord>, StoreError> {
        let rows = self.rows.read().await;
        let mut favorites: Vec<FavoriteRecord> = rows
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        favorites.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(favorites)
    }

    async fn insert_favorite(&self, record: &FavoriteRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.write().await;
        rows.entry((record.user_id, record.place_id.clone()))
            .or_insert_with(|| record.clone());
        Ok(())
    }

    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .remove(&(user_id, place_id.to_string()));
        Ok(())
    }
}
