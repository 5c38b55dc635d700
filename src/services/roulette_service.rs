// src/services/roulette_service.rs
// DOCUMENTATION: Engine facade used by the HTTP handlers
// PURPOSE: Wire location, profile, discovery, selection and favorites into
// the operations exposed to the presentation layer

use std::sync::Arc;

use super::geo::distance_km;
use super::{
    build_pool, filter_places, Clock, FavoritesReconciler, LocationMemory, PlaceProvider,
    ProfileService, SelectionEngine, SpinOutcome,
};
use crate::errors::RouletteError;
use crate::models::{
    Actor, Coordinates, FavoriteRecord, Identity, NearbyPlaceResponse, NearbySearchResponse,
    Place, Preference, QuotaResponse, QuotaState,
};

/// Roulette service
/// DOCUMENTATION: Holds every engine component; shared by handlers through
/// `web::Data`
pub struct RouletteService {
    provider: PlaceProvider,
    profiles: ProfileService,
    engine: SelectionEngine,
    favorites: FavoritesReconciler,
    location: LocationMemory,
    clock: Arc<dyn Clock>,
}

impl RouletteService {
    pub fn new(
        provider: PlaceProvider,
        profiles: ProfileService,
        engine: SelectionEngine,
        favorites: FavoritesReconciler,
        location: LocationMemory,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            provider,
            profiles,
            engine,
            favorites,
            location,
            clock,
        }
    }

    /// Reported coordinates, or the last ones this user reported
    pub fn resolve_location(
        &self,
        identity: &Identity,
        reported: Option<Coordinates>,
    ) -> Result<Coordinates, RouletteError> {
        self.location.resolve(identity.user_id, reported)
    }

    /// Identity plus the role stored on the profile row
    pub async fn actor_for(&self, identity: &Identity) -> Result<Actor, RouletteError> {
        let profile = self.profiles.load_profile(identity.user_id).await?;
        Ok(Actor::new(identity.clone(), profile.role))
    }

    /// Every discovered food venue within the preference radius
    pub async fn discover_nearby(&self, coords: Coordinates, preference: &Preference) -> Vec<Place> {
        self.provider
            .find_places_near(coords, preference.radius_meters())
            .await
    }

    /// Preference-filtered nearby places annotated with distance
    pub async fn nearby_with_distance(
        &self,
        identity: &Identity,
        reported: Option<Coordinates>,
    ) -> Result<NearbySearchResponse, RouletteError> {
        let coords = self.resolve_location(identity, reported)?;
        let preference = self.profiles.preference(identity.user_id).await?;

        let discovered = self.discover_nearby(coords, &preference).await;
        let places: Vec<NearbyPlaceResponse> = filter_places(&discovered, &preference)
            .into_iter()
            .map(|place| NearbyPlaceResponse {
                distance_km: distance_km(Some(coords), Some(place.coordinates)),
                place,
            })
            .collect();

        Ok(NearbySearchResponse {
            total: places.len(),
            places,
        })
    }

    /// Wheel segments for the user's next spin
    pub async fn candidate_pool(
        &self,
        identity: &Identity,
        reported: Option<Coordinates>,
    ) -> Result<Vec<Place>, RouletteError> {
        let coords = self.resolve_location(identity, reported)?;
        let preference = self.profiles.preference(identity.user_id).await?;
        let discovered = self.discover_nearby(coords, &preference).await;
        let saved = self.favorites.saved_ids(identity.user_id).await?;
        Ok(build_pool(&discovered, &preference, &saved))
    }

    /// Spin over an already built pool
    pub async fn spin(
        &self,
        actor: &Actor,
        pool: &[Place],
        quota: &QuotaState,
    ) -> Result<SpinOutcome, RouletteError> {
        self.engine.spin(actor, pool, quota).await
    }

    /// Build the pool from the user's surroundings and spin once
    pub async fn spin_nearby(
        &self,
        identity: &Identity,
        reported: Option<Coordinates>,
    ) -> Result<SpinOutcome, RouletteError> {
        let pool = self.candidate_pool(identity, reported).await?;
        let profile = self.profiles.load_profile(identity.user_id).await?;
        let actor = Actor::new(identity.clone(), profile.role);
        self.spin(&actor, &pool, &profile.quota).await
    }

    /// Effective quota and remaining spins for today
    pub async fn quota_status(&self, identity: &Identity) -> Result<QuotaResponse, RouletteError> {
        let profile = self.profiles.load_profile(identity.user_id).await?;
        let actor = Actor::new(identity.clone(), profile.role);
        Ok(QuotaResponse::new(
            &profile.quota,
            self.clock.today(),
            self.engine.limit_for(&actor),
        ))
    }

    pub async fn preferences(&self, identity: &Identity) -> Result<Preference, RouletteError> {
        self.profiles.preference(identity.user_id).await
    }

    pub async fn save_preferences(
        &self,
        identity: &Identity,
        preference: &Preference,
    ) -> Result<(), RouletteError> {
        self.profiles.save_preference(identity.user_id, preference).await
    }

    /// Returns the new saved state
    pub async fn toggle_favorite(&self, identity: &Identity, place: &Place) -> Result<bool, RouletteError> {
        self.favorites.toggle_favorite(identity.user_id, place).await
    }

    pub async fn favorites(&self, identity: &Identity) -> Result<Vec<FavoriteRecord>, RouletteError> {
        self.favorites.list(identity.user_id).await
    }

    pub async fn unsave(&self, identity: &Identity, place_id: &str) -> Result<(), RouletteError> {
        self.favorites.unsave(identity.user_id, place_id).await
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::db::QuotaStore;
    use crate::models::{Profile, Role};
    use std::collections::HashSet;
    use uuid::Uuid;

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            email: "diner@example.com".to_string(),
        }
    }

    fn waterloo() -> Coordinates {
        Coordinates { lat: 43.4643, lng: -80.5204 }
    }

    #[tokio::test]
    async fn test_waterloo_scenario() {
        let h = harness(waterloo_elements());
        let me = identity();
        let yesterday = today().pred_opt().unwrap();
        h.profiles
            .put_profile(
                me.user_id,
                Profile {
                    preference: Preference {
                        price: None,
                        radius_km: 5.0,
                        ..Default::default()
                    },
                    quota: QuotaState {
                        spins_used_today: 0,
                        last_spin_date: Some(yesterday),
                    },
                    ..Default::default()
                },
            )
            .await;

        let discovered = h.service.candidate_pool(&me, Some(waterloo())).await.unwrap();
        assert_eq!(discovered.len(), 7);
        let saved: Vec<Place> = discovered[..2].to_vec();
        for place in &saved {
            assert!(h.service.toggle_favorite(&me, place).await.unwrap());
        }

        let pool = h.service.candidate_pool(&me, Some(waterloo())).await.unwrap();
        assert_eq!(pool.len(), 5);
        assert!(pool.iter().all(|p| !saved.contains(p)));

        let outcome = h.service.spin_nearby(&me, Some(waterloo())).await.unwrap();
        assert!(pool.contains(&outcome.place));
        assert_eq!(
            h.profiles.load_quota(me.user_id).await.unwrap(),
            QuotaState {
                spins_used_today: 1,
                last_spin_date: Some(today())
            }
        );

        // One geodata query served every call above
        assert_eq!(h.source.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spin_without_location_is_unavailable() {
        let h = harness(waterloo_elements());
        let me = identity();
        let result = h.service.spin_nearby(&me, None).await;
        assert!(matches!(result, Err(RouletteError::LocationUnavailable(_))));

        // The caller's own remembered coordinates are reused afterwards
        h.service.candidate_pool(&me, Some(waterloo())).await.unwrap();
        assert!(h.service.spin_nearby(&me, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_remembered_location_is_not_shared_between_users() {
        let h = harness(waterloo_elements());
        let (alice, bob) = (identity(), identity());

        h.service.candidate_pool(&alice, Some(waterloo())).await.unwrap();

        let nearby = h.service.nearby_with_distance(&bob, None).await;
        assert!(matches!(nearby, Err(RouletteError::LocationUnavailable(_))));
        let spin = h.service.spin_nearby(&bob, None).await;
        assert!(matches!(spin, Err(RouletteError::LocationUnavailable(_))));
        assert!(h.service.nearby_with_distance(&alice, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_spin_with_nothing_nearby() {
        let h = harness(Vec::new());
        let result = h.service.spin_nearby(&identity(), Some(waterloo())).await;
        assert!(matches!(result, Err(RouletteError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_eleventh_spin_is_blocked() {
        let h = harness(waterloo_elements());
        let me = identity();
        for _ in 0..10 {
            h.service.spin_nearby(&me, Some(waterloo())).await.unwrap();
        }
        let result = h.service.spin_nearby(&me, Some(waterloo())).await;
        assert!(matches!(result, Err(RouletteError::QuotaExceeded { limit: 10 })));

        let quota = h.service.quota_status(&me).await.unwrap();
        assert_eq!(quota.spins_used_today, 10);
        assert_eq!(quota.remaining, Some(0));
    }

    #[tokio::test]
    async fn test_admin_quota_is_unlimited() {
        let h = harness(waterloo_elements());
        let me = identity();
        h.profiles.set_role(me.user_id, Role::Admin).await;

        let actor = h.service.actor_for(&me).await.unwrap();
        assert!(actor.role.is_privileged());
        for _ in 0..12 {
            h.service.spin_nearby(&me, Some(waterloo())).await.unwrap();
        }
        let quota = h.service.quota_status(&me).await.unwrap();
        assert_eq!(quota.spins_used_today, 12);
        assert_eq!(quota.remaining, None);
    }

    #[tokio::test]
    async fn test_nearby_is_filtered_and_annotated() {
        let h = harness(waterloo_elements());
        let me = identity();
        let preference = Preference {
            cuisines: ["mexican".to_string()].into(),
            price: None,
            ..Default::default()
        };
        h.service.save_preferences(&me, &preference).await.unwrap();

        let nearby = h.service.nearby_with_distance(&me, Some(waterloo())).await.unwrap();
        assert_eq!(nearby.total, 2);
        let names: HashSet<&str> = nearby.places.iter().map(|p| p.place.name.as_str()).collect();
        assert!(names.contains("Burrito Boyz") && names.contains("Mozys"));
        assert!(nearby.places.iter().all(|p| p.distance_km.is_some()));
    }

    #[tokio::test]
    async fn test_unsave_updates_favorites() {
        let h = harness(waterloo_elements());
        let me = identity();
        let pool = h.service.candidate_pool(&me, Some(waterloo())).await.unwrap();

        h.service.toggle_favorite(&me, &pool[0]).await.unwrap();
        assert_eq!(h.service.favorites(&me).await.unwrap().len(), 1);
        h.service.unsave(&me, &pool[0].id).await.unwrap();
        assert!(h.service.favorites(&me).await.unwrap().is_empty());
        assert_eq!(h.favorites.len().await, 0);
    }
}
