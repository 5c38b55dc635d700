// src/models/favorite.rs
// DOCUMENTATION: Saved restaurants
// PURPOSE: Favorite rows keyed by (user_id, place_id) with fields captured at save time

use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::{Coordinates, Place, PriceTier};

/// A saved restaurant
/// DOCUMENTATION: Display fields are denormalized when the place is saved so
/// the saved list never needs to re-fetch geodata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub user_id: Uuid,
    pub place_id: String,
    pub name: String,
    pub cuisine: String,
    pub price: Option<PriceTier>,
    pub coordinates: Coordinates,
    pub saved_at: DateTime<Utc>,
}

impl FavoriteRecord {
    pub fn from_place(user_id: Uuid, place: &Place, saved_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            place_id: place.id.clone(),
            name: place.name.clone(),
            cuisine: place.cuisine.clone(),
            price: Some(place.price.unwrap_or_default()),
            coordinates: place.coordinates,
            saved_at,
        }
    }

    pub fn to_feature(&self) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), json!(self.name));
        properties.insert("cuisine".to_string(), json!(self.cuisine));
        properties.insert("price".to_string(), json!(self.price.map(|p| p.as_str())));
        properties.insert("saved_at".to_string(), json!(self.saved_at.to_rfc3339()));

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::Point(vec![
                self.coordinates.lng,
                self.coordinates.lat,
            ]))),
            id: Some(geojson::feature::Id::String(self.place_id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Saved list as a GeoJSON FeatureCollection for map views
pub fn favorites_feature_collection(records: &[FavoriteRecord]) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features: records.iter().map(FavoriteRecord::to_feature).collect(),
        foreign_members: None,
    }
}

/// Request DTO for POST /favorites/toggle
#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub place: Place,
}

/// Response DTO for favorite toggles
#[derive(Debug, Serialize)]
pub struct ToggleFavoriteResponse {
    pub place_id: String,
    pub saved: bool,
}
