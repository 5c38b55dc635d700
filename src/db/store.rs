// src/db/store.rs
// DOCUMENTATION: Store ports consumed by the engine
// PURPOSE: Narrow async contracts for profiles, quota and favorites so the engine
// never depends on a particular backend

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{FavoriteRecord, Preference, Profile, QuotaState};

/// Errors raised by store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("store row could not be decoded: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(err.to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// Profile rows keyed by user id
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// None when the user has never saved a profile
    async fn load_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    /// Upsert the preference columns, leaving role and quota untouched
    async fn save_preference(
        &self,
        user_id: Uuid,
        preference: &Preference,
    ) -> Result<(), StoreError>;
}

/// Spin quota keyed by user id
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Missing rows read as the default (zero spins, never spun)
    async fn load_quota(&self, user_id: Uuid) -> Result<QuotaState, StoreError>;

    /// Atomically replace `expected` with `next`.
    ///
    /// Returns `Ok(false)` without writing when the stored state no longer
    /// equals `expected`.
    async fn compare_and_set_quota(
        &self,
        user_id: Uuid,
        expected: &QuotaState,
        next: &QuotaState,
    ) -> Result<bool, StoreError>;
}

/// Favorite rows keyed by (user_id, place_id)
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteRecord>, StoreError>;

    /// Saving an already saved place is a no-op
    async fn insert_favorite(&self, record: &FavoriteRecord) -> Result<(), StoreError>;

    /// Deleting a missing row is a no-op
    async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<(), StoreError>;
}
