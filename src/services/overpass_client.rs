// src/services/overpass_client.rs
// DOCUMENTATION: Overpass API client
// PURPOSE: Query OpenStreetMap food venues around a point and map raw elements to Places

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroU32;
use std::time::Duration;

use crate::errors::RouletteError;
use crate::models::{Coordinates, Place, PriceTier};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// Source of raw geodata elements
/// DOCUMENTATION: One call is one network query
#[async_trait]
pub trait GeodataSource: Send + Sync {
    async fn fetch_elements(
        &self,
        coords: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<OverpassElement>, RouletteError>;
}

/// Response from the Overpass interpreter
#[derive(Debug, Deserialize, Serialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<OverpassElement>,
    /// Runtime errors are reported here with a 200 status
    pub remark: Option<String>,
}

/// Individual element (node, way or relation)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverpassElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub id: i64,
    /// Set on nodes
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Set on ways and relations when queried with `out center`
    pub center: Option<OverpassCenter>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OverpassCenter {
    pub lat: f64,
    pub lon: f64,
}

/// Overpass API client
/// DOCUMENTATION: Outbound requests go through a rate limiter and a hard timeout
pub struct OverpassClient {
    client: Client,
    base_url: String,
    amenities: Vec<String>,
    timeout_secs: u64,
    limiter: DefaultDirectRateLimiter,
}

impl OverpassClient {
    /// Create new Overpass client
    ///
    /// # Arguments
    /// * `base_url` - Interpreter endpoint
    /// * `amenities` - OSM `amenity` values treated as food venues
    /// * `timeout_secs` - Hard bound on a single query
    /// * `requests_per_minute` - Outbound rate limit
    pub fn new(
        base_url: String,
        amenities: Vec<String>,
        timeout_secs: u64,
        requests_per_minute: u32,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("nomnom-roulette/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);

        Self {
            client,
            base_url,
            amenities,
            timeout_secs,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }

    /// Build the Overpass QL query
    /// DOCUMENTATION: nodes, ways and relations whose amenity is a food category,
    /// with center points for non-point geometry
    pub fn build_query(&self, coords: Coordinates, radius_m: u32) -> String {
        let amenity_pattern = self
            .amenities
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect::<Vec<_>>()
            .join("|");

        format!(
            "[out:json][timeout:{timeout}];\n\
             (\n  \
               nwr[\"amenity\"~\"^({pattern})$\"](around:{radius},{lat},{lng});\n\
             );\n\
             out center;",
            timeout = self.timeout_secs,
            pattern = amenity_pattern,
            radius = radius_m,
            lat = coords.lat,
            lng = coords.lng,
        )
    }
}

#[async_trait]
impl GeodataSource for OverpassClient {
    async fn fetch_elements(
        &self,
        coords: Coordinates,
        radius_m: u32,
    ) -> Result<Vec<OverpassElement>, RouletteError> {
        let query = self.build_query(coords, radius_m);

        self.limiter.until_ready().await;

        log::debug!(
            "Overpass nearby search: lat={}, lng={}, radius={}",
            coords.lat,
            coords.lng,
            radius_m
        );

        let response = self
            .client
            .post(&self.base_url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|e| {
                log::error!("Overpass request failed: {}", e);
                RouletteError::DiscoveryFailure(format!("Request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            log::error!("Overpass error {}: {}", status, body);
            return Err(RouletteError::DiscoveryFailure(format!(
                "API error {}",
                status
            )));
        }

        let api_response: OverpassResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse Overpass response: {}", e);
            RouletteError::DiscoveryFailure(format!("Parse error: {}", e))
        })?;

        if let Some(remark) = api_response.remark.as_deref() {
            if remark.contains("error") {
                log::error!("Overpass runtime error: {}", remark);
                return Err(RouletteError::DiscoveryFailure(remark.to_string()));
            }
        }

        log::info!(
            "Overpass search returned {} elements",
            api_response.elements.len()
        );
        Ok(api_response.elements)
    }
}

impl OverpassElement {
    /// Resolve the element position: node coordinates, else the way/relation center
    pub fn coordinates(&self) -> Option<Coordinates> {
        let (lat, lng) = match (self.lat, self.lon, &self.center) {
            (Some(lat), Some(lon), _) => (lat, lon),
            (_, _, Some(center)) => (center.lat, center.lon),
            _ => return None,
        };
        Coordinates::new(lat, lng).ok()
    }

    /// Convert an element to a canonical Place
    /// DOCUMENTATION: None when the element has no usable name or position
    pub fn to_place(&self) -> Option<Place> {
        let name = self.tags.get("name").map(|n| n.trim()).filter(|n| !n.is_empty())?;
        let coordinates = self.coordinates()?;

        let cuisine_tags: BTreeSet<String> = self
            .tags
            .get("cuisine")
            .map(|raw| {
                raw.split(';')
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Some(Place {
            id: format!("{}/{}", self.element_type, self.id),
            name: name.to_string(),
            cuisine: self.primary_cuisine(),
            cuisine_tags,
            price: Some(PriceTier::default()),
            dietary_tags: self.dietary_tags(),
            open_now: self.open_now(),
            coordinates,
        })
    }

    /// First cuisine entry, else the venue category, else "Unknown"
    fn primary_cuisine(&self) -> String {
        let first_cuisine = self
            .tags
            .get("cuisine")
            .and_then(|raw| raw.split(';').map(str::trim).find(|c| !c.is_empty()));

        first_cuisine
            .or_else(|| self.tags.get("amenity").map(|a| a.trim()).filter(|a| !a.is_empty()))
            .map(title_case)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// `diet:*` tags whose value is "yes" or "only"
    fn dietary_tags(&self) -> BTreeSet<String> {
        self.tags
            .iter()
            .filter_map(|(key, value)| {
                let diet = key.strip_prefix("diet:")?;
                let value = value.trim().to_ascii_lowercase();
                (value == "yes" || value == "only").then(|| diet.to_lowercase())
            })
            .collect()
    }

    /// Best effort: only an explicit "off"/"closed" reads as closed
    fn open_now(&self) -> bool {
        !matches!(
            self.tags
                .get("opening_hours")
                .map(|h| h.trim().to_ascii_lowercase())
                .as_deref(),
            Some("off") | Some("closed")
        )
    }
}

/// "fast_food" -> "Fast Food", "italian" -> "Italian"
pub fn title_case(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
