// src/services/selection_engine.rs
// DOCUMENTATION: The roulette core
// PURPOSE: Build the bounded candidate pool and run quota-gated uniform spins

use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{filter_places, Clock};
use crate::db::QuotaStore;
use crate::errors::RouletteError;
use crate::models::{Actor, Place, Preference, QuotaResponse, QuotaState};

/// Maximum wheel segments per spin
pub const MAX_SEGMENTS: usize = 10;

/// Build the candidate pool for one round
///
/// 1. Preference-filtered places, or every discovered place if none match
/// 2. Minus favorited ids unless `include_visited`, restored if that empties it
/// 3. Stable prefix of at most `MAX_SEGMENTS`
pub fn build_pool(
    discovered: &[Place],
    preference: &Preference,
    favorite_ids: &HashSet<String>,
) -> Vec<Place> {
    let filtered = filter_places(discovered, preference);
    let base = if filtered.is_empty() {
        discovered.to_vec()
    } else {
        filtered
    };

    let pool = if preference.include_visited {
        base
    } else {
        let unsaved: Vec<Place> = base
            .iter()
            .filter(|p| !favorite_ids.contains(&p.id))
            .cloned()
            .collect();
        if unsaved.is_empty() {
            base
        } else {
            unsaved
        }
    };

    pool.into_iter().take(MAX_SEGMENTS).collect()
}

/// Uniform index in `[0, len)`; `len` must be non-zero
pub fn pick_index<R: Rng>(rng: &mut R, len: usize) -> usize {
    rng.gen_range(0..len)
}

/// Result of a revealed round
#[derive(Debug, Clone, Serialize)]
pub struct SpinOutcome {
    pub place: Place,
    /// Quota as durably recorded for this spin
    pub quota: QuotaResponse,
}

/// Phases of a round, logged as the spin advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinPhase {
    QuotaCheck,
    Committing,
    Selecting,
    Revealed,
}

/// Marks a user's spin as in flight until dropped
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<Uuid>>,
    user_id: Uuid,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(in_flight: &'a Mutex<HashSet<Uuid>>, user_id: Uuid) -> Option<Self> {
        let mut users = in_flight.lock().unwrap_or_else(|p| p.into_inner());
        if users.insert(user_id) {
            Some(Self { in_flight, user_id })
        } else {
            None
        }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut users = self.in_flight.lock().unwrap_or_else(|p| p.into_inner());
        users.remove(&self.user_id);
    }
}

/// Selection engine
/// DOCUMENTATION: One spin per user at a time. The quota write is a
/// compare-and-set against the state the caller read, and it happens before
/// the result is drawn, so a result is never revealed without a durably
/// recorded spin.
pub struct SelectionEngine {
    quota_store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
    daily_limit: u32,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl SelectionEngine {
    pub fn new(quota_store: Arc<dyn QuotaStore>, clock: Arc<dyn Clock>, daily_limit: u32) -> Self {
        Self {
            quota_store,
            clock,
            daily_limit,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Limit applied to an actor; None for privileged actors
    pub fn limit_for(&self, actor: &Actor) -> Option<u32> {
        (!actor.role.is_privileged()).then_some(self.daily_limit)
    }

    /// Run one round
    ///
    /// # Arguments
    /// * `actor` - Spinning user with role
    /// * `pool` - Candidates, normally from `build_pool`
    /// * `quota` - Quota state as read from the store
    ///
    /// # Returns
    /// The selected place and the recorded quota
    pub async fn spin(
        &self,
        actor: &Actor,
        pool: &[Place],
        quota: &QuotaState,
    ) -> Result<SpinOutcome, RouletteError> {
        if pool.is_empty() {
            log::info!("Spin for {} has no candidates", actor.user_id);
            return Err(RouletteError::NoCandidates);
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, actor.user_id).ok_or_else(|| {
            log::warn!("Rejected concurrent spin for {}", actor.user_id);
            RouletteError::SpinInProgress
        })?;

        let today = self.clock.today();
        let limit = self.limit_for(actor);

        log::debug!("Spin {}: {:?}", actor.user_id, SpinPhase::QuotaCheck);
        let effective = quota.effective_spins(today);
        if let Some(limit) = limit {
            if effective >= limit {
                log::info!(
                    "Spin blocked for {}: {} of {} spins used",
                    actor.user_id,
                    effective,
                    limit
                );
                return Err(RouletteError::QuotaExceeded { limit });
            }
        }

        log::debug!("Spin {}: {:?}", actor.user_id, SpinPhase::Committing);
        let next = quota.after_spin(today);
        let recorded = self
            .quota_store
            .compare_and_set_quota(actor.user_id, quota, &next)
            .await
            .map_err(|e| {
                log::error!("Spin aborted for {}, quota not recorded: {}", actor.user_id, e);
                RouletteError::from(e)
            })?;
        if !recorded {
            log::warn!("Spin aborted for {}: quota changed concurrently", actor.user_id);
            return Err(RouletteError::StaleQuota);
        }

        log::debug!("Spin {}: {:?}", actor.user_id, SpinPhase::Selecting);
        let index = pick_index(&mut rand::thread_rng(), pool.len());
        let place = pool[index].clone();

        log::debug!("Spin {}: {:?}", actor.user_id, SpinPhase::Revealed);
        log::info!(
            "Spin {} for {} landed on {} ({} of {} candidates)",
            next.spins_used_today,
            actor.user_id,
            place.id,
            index + 1,
            pool.len()
        );

        Ok(SpinOutcome {
            place,
            quota: QuotaResponse::new(&next, today, limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryProfileStore, StoreError};
    use crate::models::{Coordinates, Profile, Role};
    use crate::services::ManualClock;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::BTreeSet;
    use tokio::sync::Notify;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn yesterday() -> NaiveDate {
        today().pred_opt().unwrap()
    }

    fn place(id: usize) -> Place {
        Place {
            id: format!("node/{}", id),
            name: format!("Restaurant {}", id),
            cuisine: if id % 2 == 0 { "Italian" } else { "Mexican" }.to_string(),
            cuisine_tags: BTreeSet::new(),
            price: None,
            dietary_tags: BTreeSet::new(),
            open_now: true,
            coordinates: Coordinates { lat: 43.46, lng: -80.52 },
        }
    }

    fn places(n: usize) -> Vec<Place> {
        (1..=n).map(place).collect()
    }

    fn ids(places: &[Place]) -> Vec<String> {
        places.iter().map(|p| p.id.clone()).collect()
    }

    fn favorites(ids: &[usize]) -> HashSet<String> {
        ids.iter().map(|i| format!("node/{}", i)).collect()
    }

    fn actor(role: Role) -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            email: "spinner@example.com".to_string(),
            role,
        }
    }

    fn engine(store: Arc<dyn QuotaStore>) -> SelectionEngine {
        SelectionEngine::new(store, Arc::new(ManualClock::on(today())), 10)
    }

    async fn store_with(user_id: Uuid, quota: QuotaState) -> Arc<MemoryProfileStore> {
        let store = Arc::new(MemoryProfileStore::new());
        store
            .put_profile(
                user_id,
                Profile {
                    quota,
                    ..Default::default()
                },
            )
            .await;
        store
    }

    #[test]
    fn test_pool_excludes_favorites() {
        let pool = build_pool(&places(5), &Preference::default(), &favorites(&[1, 3, 5]));
        assert_eq!(ids(&pool), vec!["node/2", "node/4"]);
    }

    #[test]
    fn test_pool_restores_when_everything_is_saved() {
        let pool = build_pool(&places(5), &Preference::default(), &favorites(&[1, 2, 3, 4, 5]));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_pool_keeps_favorites_when_including_visited() {
        let preference = Preference {
            include_visited: true,
            ..Default::default()
        };
        let pool = build_pool(&places(5), &preference, &favorites(&[1, 3, 5]));
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_pool_falls_back_to_unfiltered_list() {
        let preference = Preference {
            cuisines: ["Korean".to_string()].into(),
            ..Default::default()
        };
        let pool = build_pool(&places(4), &preference, &HashSet::new());
        assert_eq!(pool.len(), 4);

        let preference = Preference {
            cuisines: ["Italian".to_string()].into(),
            ..Default::default()
        };
        let pool = build_pool(&places(4), &preference, &HashSet::new());
        assert_eq!(ids(&pool), vec!["node/2", "node/4"]);
    }

    #[test]
    fn test_pool_is_capped_with_stable_prefix() {
        let pool = build_pool(&places(25), &Preference::default(), &HashSet::new());
        assert_eq!(pool.len(), MAX_SEGMENTS);
        assert_eq!(ids(&pool), ids(&places(10)));
    }

    #[test]
    fn test_pool_of_nothing_is_empty() {
        assert!(build_pool(&[], &Preference::default(), &HashSet::new()).is_empty());
    }

    #[test]
    fn test_pick_index_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..500 {
            let index = pick_index(&mut rng, 5);
            assert!(index < 5);
            seen.insert(index);
        }
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_spin_resets_stale_day() {
        let actor = actor(Role::User);
        let stale = QuotaState {
            spins_used_today: 10,
            last_spin_date: Some(yesterday()),
        };
        let store = store_with(actor.user_id, stale).await;
        let engine = engine(store.clone());

        let pool = places(3);
        let outcome = engine.spin(&actor, &pool, &stale).await.unwrap();

        assert!(pool.contains(&outcome.place));
        assert_eq!(outcome.quota.spins_used_today, 1);
        assert_eq!(outcome.quota.remaining, Some(9));
        assert_eq!(
            store.load_quota(actor.user_id).await.unwrap(),
            QuotaState {
                spins_used_today: 1,
                last_spin_date: Some(today())
            }
        );
    }

    #[tokio::test]
    async fn test_spin_blocked_at_limit() {
        let actor = actor(Role::User);
        let exhausted = QuotaState {
            spins_used_today: 10,
            last_spin_date: Some(today()),
        };
        let store = store_with(actor.user_id, exhausted).await;
        let engine = engine(store.clone());

        let result = engine.spin(&actor, &places(3), &exhausted).await;
        assert!(matches!(result, Err(RouletteError::QuotaExceeded { limit: 10 })));
        assert_eq!(store.load_quota(actor.user_id).await.unwrap(), exhausted);
    }

    #[tokio::test]
    async fn test_admin_bypasses_limit() {
        let admin = actor(Role::Admin);
        let exhausted = QuotaState {
            spins_used_today: 25,
            last_spin_date: Some(today()),
        };
        let store = store_with(admin.user_id, exhausted).await;
        let engine = engine(store.clone());

        let outcome = engine.spin(&admin, &places(3), &exhausted).await.unwrap();
        assert_eq!(outcome.quota.spins_used_today, 26);
        assert_eq!(outcome.quota.remaining, None);
    }

    #[tokio::test]
    async fn test_empty_pool_consumes_no_quota() {
        let actor = actor(Role::User);
        let exhausted = QuotaState {
            spins_used_today: 10,
            last_spin_date: Some(today()),
        };
        let store = store_with(actor.user_id, exhausted).await;
        let engine = engine(store.clone());

        // No candidates is reported even when the quota is also exhausted
        let result = engine.spin(&actor, &[], &exhausted).await;
        assert!(matches!(result, Err(RouletteError::NoCandidates)));
        assert_eq!(store.load_quota(actor.user_id).await.unwrap(), exhausted);
    }

    #[tokio::test]
    async fn test_stale_quota_read_is_not_revealed() {
        let actor = actor(Role::User);
        let store = store_with(actor.user_id, QuotaState::default()).await;
        let engine = engine(store.clone());
        let pool = places(3);

        let snapshot = QuotaState::default();
        engine.spin(&actor, &pool, &snapshot).await.unwrap();

        // A second spin from the same stale snapshot must not reveal anything
        let result = engine.spin(&actor, &pool, &snapshot).await;
        assert!(matches!(result, Err(RouletteError::StaleQuota)));
        assert_eq!(store.load_quota(actor.user_id).await.unwrap().spins_used_today, 1);
    }

    struct FailingQuotaStore;

    #[async_trait]
    impl QuotaStore for FailingQuotaStore {
        async fn load_quota(&self, _user_id: Uuid) -> Result<QuotaState, StoreError> {
            Ok(QuotaState::default())
        }

        async fn compare_and_set_quota(
            &self,
            _user_id: Uuid,
            _expected: &QuotaState,
            _next: &QuotaState,
        ) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_aborts_spin() {
        let engine = engine(Arc::new(FailingQuotaStore));
        let result = engine
            .spin(&actor(Role::User), &places(3), &QuotaState::default())
            .await;
        assert!(matches!(result, Err(RouletteError::PersistenceFailure(_))));
    }

    /// Holds the compare-and-set open until released
    struct GatedQuotaStore {
        inner: MemoryProfileStore,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QuotaStore for GatedQuotaStore {
        async fn load_quota(&self, user_id: Uuid) -> Result<QuotaState, StoreError> {
            self.inner.load_quota(user_id).await
        }

        async fn compare_and_set_quota(
            &self,
            user_id: Uuid,
            expected: &QuotaState,
            next: &QuotaState,
        ) -> Result<bool, StoreError> {
            self.entered.notify_one();
            self.release.notified().await;
            self.inner.compare_and_set_quota(user_id, expected, next).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_spin_is_rejected_while_in_flight() {
        let store = Arc::new(GatedQuotaStore {
            inner: MemoryProfileStore::new(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let engine = Arc::new(engine(store.clone()));
        let actor = actor(Role::User);
        let pool = places(3);

        let first = {
            let engine = engine.clone();
            let actor = actor.clone();
            let pool = pool.clone();
            tokio::spawn(async move { engine.spin(&actor, &pool, &QuotaState::default()).await })
        };

        store.entered.notified().await;
        let second = engine.spin(&actor, &pool, &QuotaState::default()).await;
        assert!(matches!(second, Err(RouletteError::SpinInProgress)));

        store.release.notify_one();
        let first = first.await.unwrap();
        assert!(first.is_ok());

        // The in-flight marker is released afterwards
        let quota = store.load_quota(actor.user_id).await.unwrap();
        store.release.notify_one();
        assert!(engine.spin(&actor, &pool, &quota).await.is_ok());
    }
}
