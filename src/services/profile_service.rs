// src/services/profile_service.rs
// DOCUMENTATION: Profile access for the engine
// PURPOSE: Preference reads through a short-lived cache, fresh role and quota reads
// from the profile row

use std::sync::Arc;
use uuid::Uuid;

use super::TtlCache;
use crate::db::ProfileStore;
use crate::errors::RouletteError;
use crate::models::{Preference, Profile};

/// Profile service
/// DOCUMENTATION: Only preferences are cached. Role and quota always come
/// from the store because the spin gate depends on them.
pub struct ProfileService {
    profiles: Arc<dyn ProfileStore>,
    cache: TtlCache,
}

impl ProfileService {
    /// `cache` should carry the generic TTL policy
    pub fn new(profiles: Arc<dyn ProfileStore>, cache: TtlCache) -> Self {
        Self { profiles, cache }
    }

    fn cache_key(user_id: Uuid) -> String {
        format!("prefs:{}", user_id)
    }

    /// Full profile row; users without a row get defaults
    pub async fn load_profile(&self, user_id: Uuid) -> Result<Profile, RouletteError> {
        let profile = self.profiles.load_profile(user_id).await?;
        Ok(profile.unwrap_or_else(|| {
            log::debug!("No profile for {}, using defaults", user_id);
            Profile::default()
        }))
    }

    pub async fn preference(&self, user_id: Uuid) -> Result<Preference, RouletteError> {
        let key = Self::cache_key(user_id);
        if let Some(cached) = self.cache.get::<Preference>(&key) {
            return Ok(cached);
        }

        let preference = self.load_profile(user_id).await?.preference;
        self.cache.set(&key, &preference);
        Ok(preference)
    }

    /// Persist preferences and overwrite the cached copy
    pub async fn save_preference(
        &self,
        user_id: Uuid,
        preference: &Preference,
    ) -> Result<(), RouletteError> {
        self.profiles.save_preference(user_id, preference).await?;
        self.cache.set(&Self::cache_key(user_id), preference);
        log::info!("Saved preferences for {}", user_id);
        Ok(())
    }
}
