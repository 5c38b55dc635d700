// src/services/place_provider.rs
// DOCUMENTATION: Nearby restaurant discovery
// PURPOSE: Cached geodata query -> normalized, deduplicated Place list

use std::collections::HashSet;
use std::sync::Arc;

use super::geo::{cache_key_for, clamp_radius_m, dedup_key};
use super::{GeodataSource, TtlCache};
use crate::models::{Coordinates, Place};

/// Place provider
/// DOCUMENTATION: Fail-soft: a failed query is logged and surfaces as an empty
/// list. Only successful results are cached.
pub struct PlaceProvider {
    source: Arc<dyn GeodataSource>,
    cache: TtlCache,
}

impl PlaceProvider {
    /// `cache` should carry the place-query TTL policy
    pub fn new(source: Arc<dyn GeodataSource>, cache: TtlCache) -> Self {
        Self { source, cache }
    }

    /// Find food venues near a point
    ///
    /// # Arguments
    /// * `coords` - Search center
    /// * `radius_m` - Search radius in meters, clamped to the provider range
    ///
    /// # Returns
    /// Places with non-empty names and valid coordinates, deduplicated
    pub async fn find_places_near(&self, coords: Coordinates, radius_m: u32) -> Vec<Place> {
        let radius_m = clamp_radius_m(radius_m);
        let key = cache_key_for(coords, radius_m);

        if let Some(cached) = self.cache.get::<Vec<Place>>(&key) {
            return cached;
        }

        let elements = match self.source.fetch_elements(coords, radius_m).await {
            Ok(elements) => elements,
            Err(e) => {
                log::error!("Discovery failed near {},{}: {}", coords.lat, coords.lng, e);
                return Vec::new();
            }
        };

        let raw_count = elements.len();
        let places = dedupe(elements.iter().filter_map(|el| el.to_place()).collect());

        log::info!(
            "Discovered {} places near {},{} (radius {}m, {} raw elements)",
            places.len(),
            coords.lat,
            coords.lng,
            radius_m,
            raw_count
        );

        // an empty area is queried again on the next call
        if !places.is_empty() {
            self.cache.set(&key, &places);
        }
        places
    }
}

/// Drop later records describing the same physical place
/// First occurrence wins; input order is otherwise preserved
pub fn dedupe(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|p| seen.insert(dedup_key(&p.name, p.coordinates)))
        .collect()
}
