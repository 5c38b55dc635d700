// src/services/favorites.rs
// DOCUMENTATION: Favorites reconciliation
// PURPOSE: Save/unsave places against the favorites store while keeping a
// per-user saved-id set that only ever reflects confirmed store state

use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::Clock;
use crate::db::FavoritesStore;
use crate::errors::RouletteError;
use crate::models::{FavoriteRecord, Place};

/// Saved ids for one user as last read from the store
#[derive(Default)]
struct SavedSet {
    ids: HashSet<String>,
    loaded_at_ms: Option<i64>,
}

impl SavedSet {
    fn is_fresh(&self, now_ms: i64, ttl: Duration) -> bool {
        self.loaded_at_ms
            .map_or(false, |at| now_ms.saturating_sub(at) <= ttl.as_millis() as i64)
    }
}

/// Favorites reconciler
/// DOCUMENTATION: Operations for one user are serialized on that user's
/// saved set. Toggles re-read the store before deciding, local state changes
/// only after the store confirms the write, and idle sets expire after `ttl`.
pub struct FavoritesReconciler {
    store: Arc<dyn FavoritesStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    users: Mutex<HashMap<Uuid, Arc<Mutex<SavedSet>>>>,
}

impl FavoritesReconciler {
    pub fn new(store: Arc<dyn FavoritesStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            users: Mutex::new(HashMap::new()),
        }
    }

    async fn saved_set(&self, user_id: Uuid) -> Arc<Mutex<SavedSet>> {
        let now_ms = self.clock.now_ms();
        let mut users = self.users.lock().await;
        // handles are only cloned under this lock, so a count of one means idle
        users.retain(|_, set| {
            Arc::strong_count(set) > 1
                || set.try_lock().map_or(true, |set| set.is_fresh(now_ms, self.ttl))
        });
        users.entry(user_id).or_default().clone()
    }

    /// Replace the set with the store's current rows
    async fn refresh(&self, user_id: Uuid, set: &mut SavedSet) -> Result<(), RouletteError> {
        let records = self.store.list_favorites(user_id).await?;
        set.ids = records.into_iter().map(|r| r.place_id).collect();
        set.loaded_at_ms = Some(self.clock.now_ms());
        log::debug!("Loaded {} saved places for {}", set.ids.len(), user_id);
        Ok(())
    }

    /// Ids of every place the user has saved
    pub async fn saved_ids(&self, user_id: Uuid) -> Result<HashSet<String>, RouletteError> {
        let set = self.saved_set(user_id).await;
        let mut set = set.lock().await;
        if !set.is_fresh(self.clock.now_ms(), self.ttl) {
            self.refresh(user_id, &mut set).await?;
        }
        Ok(set.ids.clone())
    }

    pub async fn is_saved(&self, user_id: Uuid, place_id: &str) -> Result<bool, RouletteError> {
        Ok(self.saved_ids(user_id).await?.contains(place_id))
    }

    /// Flip the saved state of a place
    ///
    /// # Returns
    /// The new saved state, true when the place is now saved
    pub async fn toggle_favorite(&self, user_id: Uuid, place: &Place) -> Result<bool, RouletteError> {
        let set = self.saved_set(user_id).await;
        let mut set = set.lock().await;
        self.refresh(user_id, &mut set).await?;

        if set.ids.contains(&place.id) {
            self.store.delete_favorite(user_id, &place.id).await.map_err(|e| {
                log::error!("Unsave of {} failed for {}: {}", place.id, user_id, e);
                RouletteError::from(e)
            })?;
            set.ids.remove(&place.id);
            log::info!("User {} unsaved {}", user_id, place.id);
            Ok(false)
        } else {
            let record = FavoriteRecord::from_place(user_id, place, Utc::now());
            self.store.insert_favorite(&record).await.map_err(|e| {
                log::error!("Save of {} failed for {}: {}", place.id, user_id, e);
                RouletteError::from(e)
            })?;
            set.ids.insert(place.id.clone());
            log::info!("User {} saved {}", user_id, place.id);
            Ok(true)
        }
    }

    /// Remove a saved place by id; removing an unsaved id is a no-op
    pub async fn unsave(&self, user_id: Uuid, place_id: &str) -> Result<(), RouletteError> {
        let set = self.saved_set(user_id).await;
        let mut set = set.lock().await;

        self.store.delete_favorite(user_id, place_id).await?;
        set.ids.remove(place_id);
        log::info!("User {} unsaved {}", user_id, place_id);
        Ok(())
    }

    /// Saved list, newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<FavoriteRecord>, RouletteError> {
        let set = self.saved_set(user_id).await;
        let mut set = set.lock().await;

        let records = self.store.list_favorites(user_id).await?;
        set.ids = records.iter().map(|r| r.place_id.clone()).collect();
        set.loaded_at_ms = Some(self.clock.now_ms());
        Ok(records)
    }

    #[cfg(test)]
    async fn tracked_users(&self) -> usize {
        self.users.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryFavoritesStore, StoreError};
    use crate::models::Coordinates;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use crate::services::{ManualClock, GENERIC_TTL};
    use chrono::NaiveDate;
    use tokio_test::assert_ok;

    fn reconciler_with(store: Arc<dyn FavoritesStore>) -> (FavoritesReconciler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::on(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()));
        (FavoritesReconciler::new(store, clock.clone(), GENERIC_TTL), clock)
    }

    fn new_reconciler(store: Arc<dyn FavoritesStore>) -> FavoritesReconciler {
        reconciler_with(store).0
    }

    fn place(id: &str) -> Place {
        Place {
            id: id.to_string(),
            name: format!("Place {}", id),
            cuisine: "Thai".to_string(),
            cuisine_tags: BTreeSet::new(),
            price: None,
            dietary_tags: BTreeSet::new(),
            open_now: true,
            coordinates: Coordinates { lat: 43.46, lng: -80.52 },
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_round_trips() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let reconciler = new_reconciler(store.clone());
        let user = Uuid::new_v4();
        let p = place("node/1");

        assert!(reconciler.toggle_favorite(user, &p).await.unwrap());
        assert!(assert_ok!(reconciler.is_saved(user, "node/1").await));
        assert_eq!(store.len().await, 1);

        assert!(!reconciler.toggle_favorite(user, &p).await.unwrap());
        assert!(!assert_ok!(reconciler.is_saved(user, "node/1").await));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_saved_ids_come_from_store() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let user = Uuid::new_v4();
        let record = FavoriteRecord::from_place(user, &place("way/9"), Utc::now());
        assert_ok!(store.insert_favorite(&record).await);
        assert_ok!(store.insert_favorite(&record).await);

        let reconciler = new_reconciler(store.clone());
        let ids = reconciler.saved_ids(user).await.unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("way/9"));

        // Toggling a place already saved in the store unsaves it
        assert!(!reconciler.toggle_favorite(user, &place("way/9")).await.unwrap());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let reconciler = new_reconciler(store);
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        reconciler.toggle_favorite(alice, &place("node/1")).await.unwrap();
        assert!(reconciler.saved_ids(bob).await.unwrap().is_empty());
        assert_eq!(reconciler.list(alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unsave_missing_is_noop() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let reconciler = new_reconciler(store.clone());
        let user = Uuid::new_v4();

        assert_ok!(reconciler.unsave(user, "node/404").await);
        reconciler.toggle_favorite(user, &place("node/1")).await.unwrap();
        assert_ok!(reconciler.unsave(user, "node/1").await);
        assert!(reconciler.saved_ids(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_follows_rows_removed_behind_its_back() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let reconciler = new_reconciler(store.clone());
        let user = Uuid::new_v4();
        let p = place("node/7");

        assert!(reconciler.toggle_favorite(user, &p).await.unwrap());
        assert_ok!(store.delete_favorite(user, "node/7").await);
        assert!(!assert_ok!(reconciler.is_saved(user, "node/7").await));

        // The row is gone, so the next toggle saves it again
        assert!(reconciler.toggle_favorite(user, &p).await.unwrap());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_idle_sets_expire() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let (reconciler, clock) = reconciler_with(store.clone());

        for n in 0..20 {
            reconciler.saved_ids(Uuid::from_u128(n)).await.unwrap();
        }
        assert_eq!(reconciler.tracked_users().await, 20);

        clock.advance(chrono::Duration::minutes(6));
        let user = Uuid::new_v4();
        reconciler.toggle_favorite(user, &place("node/1")).await.unwrap();
        assert_eq!(reconciler.tracked_users().await, 1);
        assert!(assert_ok!(reconciler.is_saved(user, "node/1").await));
    }

    /// Delegates to a memory store until writes are switched off
    struct FlakyStore {
        inner: MemoryFavoritesStore,
        down: AtomicBool,
    }

    impl FlakyStore {
        fn check(&self) -> Result<(), StoreError> {
            if self.down.load(Ordering::SeqCst) {
                Err(StoreError::Backend("connection reset".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl FavoritesStore for FlakyStore {
        async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteRecord>, StoreError> {
            self.inner.list_favorites(user_id).await
        }

        async fn insert_favorite(&self, record: &FavoriteRecord) -> Result<(), StoreError> {
            self.check()?;
            self.inner.insert_favorite(record).await
        }

        async fn delete_favorite(&self, user_id: Uuid, place_id: &str) -> Result<(), StoreError> {
            self.check()?;
            self.inner.delete_favorite(user_id, place_id).await
        }
    }

    #[tokio::test]
    async fn test_store_failure_leaves_local_state_unchanged() {
        let store = Arc::new(FlakyStore {
            inner: MemoryFavoritesStore::new(),
            down: AtomicBool::new(false),
        });
        let reconciler = new_reconciler(store.clone());
        let user = Uuid::new_v4();

        reconciler.toggle_favorite(user, &place("node/1")).await.unwrap();
        store.down.store(true, Ordering::SeqCst);

        let unsave = reconciler.toggle_favorite(user, &place("node/1")).await;
        assert!(matches!(unsave, Err(RouletteError::PersistenceFailure(_))));
        let save = reconciler.toggle_favorite(user, &place("node/2")).await;
        assert!(matches!(save, Err(RouletteError::PersistenceFailure(_))));

        let ids = reconciler.saved_ids(user).await.unwrap();
        assert!(ids.contains("node/1"));
        assert!(!ids.contains("node/2"));
    }
}
