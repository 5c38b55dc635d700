// src/models/place.rs
// DOCUMENTATION: Core data structures for restaurants
// PURPOSE: Canonical Place record shared by discovery, selection and favorites

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value as GeoValue};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::RouletteError;

/// WGS-84 coordinates in degrees
/// DOCUMENTATION: Immutable once read from a location source
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build validated coordinates
    /// Rejects non-finite values and anything outside the WGS-84 ranges
    pub fn new(lat: f64, lng: f64) -> Result<Self, RouletteError> {
        let coords = Self { lat, lng };
        if coords.is_valid() {
            Ok(coords)
        } else {
            Err(RouletteError::InvalidInput(format!(
                "coordinates out of range: lat={}, lng={}",
                lat, lng
            )))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl From<Coordinates> for geo_types::Point<f64> {
    fn from(coords: Coordinates) -> Self {
        geo_types::Point::new(coords.lng, coords.lat)
    }
}

/// Price tier, ordered from cheapest to most expensive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum PriceTier {
    #[serde(rename = "$")]
    Budget,
    #[serde(rename = "$$")]
    #[default]
    Moderate,
    #[serde(rename = "$$$")]
    Upscale,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Budget => "$",
            PriceTier::Moderate => "$$",
            PriceTier::Upscale => "$$$",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceTier {
    type Err = RouletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "$" => Ok(PriceTier::Budget),
            "$$" => Ok(PriceTier::Moderate),
            "$$$" => Ok(PriceTier::Upscale),
            other => Err(RouletteError::InvalidInput(format!(
                "unknown price tier: {}",
                other
            ))),
        }
    }
}

fn default_open_now() -> bool {
    true
}

/// Canonical restaurant record
/// DOCUMENTATION: Produced by the place provider from raw geodata elements.
/// Every Place carries valid coordinates; records without them never make it
/// past ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier, `{element_type}/{element_id}` (e.g. `node/123`)
    pub id: String,

    /// Non-empty display name
    pub name: String,

    /// Primary cuisine, title-cased ("Unknown" if nothing resolvable)
    pub cuisine: String,

    /// Every cuisine tag of the venue, lowercased
    #[serde(default)]
    pub cuisine_tags: BTreeSet<String>,

    /// Price tier; discovery defaults to `$$`
    #[serde(default)]
    pub price: Option<PriceTier>,

    /// Dietary tags such as `vegetarian` or `halal`
    #[serde(default)]
    pub dietary_tags: BTreeSet<String>,

    /// Best-effort openness; unknown is treated as open
    #[serde(default = "default_open_now")]
    pub open_now: bool,

    pub coordinates: Coordinates,
}

impl Place {
    /// Convert to a GeoJSON point feature for map views
    pub fn to_feature(&self, distance_km: Option<f64>) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("name".to_string(), json!(self.name));
        properties.insert("cuisine".to_string(), json!(self.cuisine));
        properties.insert(
            "price".to_string(),
            json!(self.price.map(|p| p.as_str())),
        );
        properties.insert("open_now".to_string(), json!(self.open_now));
        if let Some(distance) = distance_km {
            properties.insert("distance_km".to_string(), json!(distance));
        }

        Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::Point(vec![
                self.coordinates.lng,
                self.coordinates.lat,
            ]))),
            id: Some(geojson::feature::Id::String(self.id.clone())),
            properties: Some(properties),
            foreign_members: None,
        }
    }
}

/// Place annotated with its distance from the searcher
/// DOCUMENTATION: Response item for GET /restaurants/nearby
#[derive(Debug, Clone, Serialize)]
pub struct NearbyPlaceResponse {
    #[serde(flatten)]
    pub place: Place,

    /// Distance in kilometers (None when it cannot be computed)
    pub distance_km: Option<f64>,
}

/// Nearby search response
#[derive(Debug, Serialize)]
pub struct NearbySearchResponse {
    pub places: Vec<NearbyPlaceResponse>,
    pub total: usize,
}

impl NearbySearchResponse {
    /// Render the same places as a GeoJSON FeatureCollection
    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .places
                .iter()
                .map(|p| p.place.to_feature(p.distance_km))
                .collect(),
            foreign_members: None,
        }
    }
}

/// Query parameters carrying the caller's position
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationQuery {
    /// Validated coordinates, if the caller supplied both halves
    pub fn coordinates(&self) -> Result<Option<Coordinates>, RouletteError> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).map(Some),
            (None, None) => Ok(None),
            _ => Err(RouletteError::InvalidInput(
                "lat and lng must be provided together".to_string(),
            )),
        }
    }
}
