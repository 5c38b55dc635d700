// src/services/location.rs
// DOCUMENTATION: Last known location
// PURPOSE: Remember the most recent coordinates a client reported and fall back to them

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::CacheMedium;
use crate::errors::RouletteError;
use crate::models::Coordinates;

const LAST_COORDS_PREFIX: &str = "nomnom_last_coords";

fn last_coords_key(user_id: Uuid) -> String {
    format!("{}:{}", LAST_COORDS_PREFIX, user_id)
}

#[derive(Serialize, Deserialize)]
struct StoredCoords {
    lat: f64,
    lng: f64,
}

/// Last reported coordinates per user, kept verbatim in the cache medium
pub struct LocationMemory {
    medium: Arc<dyn CacheMedium>,
}

impl LocationMemory {
    pub fn new(medium: Arc<dyn CacheMedium>) -> Self {
        Self { medium }
    }

    pub fn remember(&self, user_id: Uuid, coords: Coordinates) {
        let stored = StoredCoords {
            lat: coords.lat,
            lng: coords.lng,
        };
        let payload = match serde_json::to_string(&stored) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Could not encode last location: {}", e);
                return;
            }
        };
        if let Err(e) = self.medium.write(&last_coords_key(user_id), payload) {
            log::warn!("Could not store last location: {}", e);
        }
    }

    pub fn last_known(&self, user_id: Uuid) -> Option<Coordinates> {
        let raw = self.medium.read(&last_coords_key(user_id))?;
        let stored: StoredCoords = serde_json::from_str(&raw).ok()?;
        Coordinates::new(stored.lat, stored.lng).ok()
    }

    /// Reported coordinates win and are remembered; otherwise the user's last known ones
    pub fn resolve(
        &self,
        user_id: Uuid,
        reported: Option<Coordinates>,
    ) -> Result<Coordinates, RouletteError> {
        match reported {
            Some(coords) => {
                self.remember(user_id, coords);
                Ok(coords)
            }
            None => self.last_known(user_id).ok_or_else(|| {
                RouletteError::LocationUnavailable(
                    "no coordinates supplied and none remembered".to_string(),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MemoryMedium;

    fn waterloo() -> Coordinates {
        Coordinates { lat: 43.4643, lng: -80.5204 }
    }

    #[test]
    fn test_resolve_falls_back_to_last_known() {
        let memory = LocationMemory::new(Arc::new(MemoryMedium::new()));
        let user = Uuid::new_v4();
        assert!(matches!(
            memory.resolve(user, None),
            Err(RouletteError::LocationUnavailable(_))
        ));

        assert_eq!(memory.resolve(user, Some(waterloo())).unwrap(), waterloo());
        assert_eq!(memory.resolve(user, None).unwrap(), waterloo());
    }

    #[test]
    fn test_location_is_remembered_per_user() {
        let memory = LocationMemory::new(Arc::new(MemoryMedium::new()));
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        memory.resolve(alice, Some(waterloo())).unwrap();
        assert!(matches!(
            memory.resolve(bob, None),
            Err(RouletteError::LocationUnavailable(_))
        ));
        assert!(memory.last_known(bob).is_none());
    }

    #[test]
    fn test_unreadable_entry_is_ignored() {
        let medium = Arc::new(MemoryMedium::new());
        let user = Uuid::new_v4();
        medium.write(&last_coords_key(user), "not json".to_string()).unwrap();
        let memory = LocationMemory::new(medium);
        assert!(memory.last_known(user).is_none());
    }

    #[test]
    fn test_full_medium_does_not_fail_resolve() {
        let memory = LocationMemory::new(Arc::new(MemoryMedium::with_capacity(4)));
        let user = Uuid::new_v4();
        assert_eq!(memory.resolve(user, Some(waterloo())).unwrap(), waterloo());
        assert!(memory.last_known(user).is_none());
    }
}
