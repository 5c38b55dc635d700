// src/models/preference.rs
// DOCUMENTATION: Per-user food preferences
// PURPOSE: Strongly typed Preference plus the comma-joined wire codec used by the profile store

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use validator::Validate;

use super::PriceTier;

pub const MIN_RADIUS_KM: f64 = 0.1;
pub const MAX_RADIUS_KM: f64 = 25.0;
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Stored price tier for "no price filter"; a NULL column means the default tier
pub const ANY_PRICE: &str = "any";

/// Food preferences for one user
/// DOCUMENTATION: Empty `cuisines` means no cuisine filter.
/// `include_visited` keeps favorited places eligible for spins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preference {
    #[serde(default)]
    pub cuisines: BTreeSet<String>,

    #[serde(default)]
    pub dietary: BTreeSet<String>,

    #[serde(default)]
    pub price: Option<PriceTier>,

    pub radius_km: f64,

    #[serde(default)]
    pub open_now_only: bool,

    #[serde(default)]
    pub include_visited: bool,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            cuisines: BTreeSet::new(),
            dietary: BTreeSet::new(),
            price: Some(PriceTier::Moderate),
            radius_km: DEFAULT_RADIUS_KM,
            open_now_only: false,
            include_visited: false,
        }
    }
}

impl Preference {
    /// Radius bounded to the supported range; non-finite values fall back to the default
    pub fn clamped_radius_km(&self) -> f64 {
        if self.radius_km.is_finite() {
            self.radius_km.clamp(MIN_RADIUS_KM, MAX_RADIUS_KM)
        } else {
            DEFAULT_RADIUS_KM
        }
    }

    pub fn radius_meters(&self) -> u32 {
        (self.clamped_radius_km() * 1000.0).round() as u32
    }
}

/// Wire shape of the preference columns of a profile row
/// DOCUMENTATION: Set-valued fields travel as comma-joined strings.
/// Parse and serialize only through `into_preference` / `from_preference`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceRow {
    pub preferred_cuisines: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub price_tier: Option<String>,
    pub radius_km: Option<f64>,
    pub open_now_only: Option<bool>,
    pub include_visited: Option<bool>,
}

impl PreferenceRow {
    pub fn into_preference(self) -> Preference {
        let price = match self.price_tier.as_deref().map(str::trim) {
            None | Some("") => Some(PriceTier::Moderate),
            Some(raw) if raw.eq_ignore_ascii_case(ANY_PRICE) => None,
            Some(raw) => match raw.parse() {
                Ok(tier) => Some(tier),
                Err(_) => {
                    log::warn!("Ignoring unknown price tier in profile: {}", raw);
                    None
                }
            },
        };

        let preference = Preference {
            cuisines: split_list(self.preferred_cuisines.as_deref()),
            dietary: split_list(self.dietary_restrictions.as_deref()),
            price,
            radius_km: self.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
            open_now_only: self.open_now_only.unwrap_or(false),
            include_visited: self.include_visited.unwrap_or(false),
        };

        Preference {
            radius_km: preference.clamped_radius_km(),
            ..preference
        }
    }

    pub fn from_preference(preference: &Preference) -> Self {
        Self {
            preferred_cuisines: Some(join_list(&preference.cuisines)),
            dietary_restrictions: Some(join_list(&preference.dietary)),
            price_tier: Some(
                preference
                    .price
                    .map_or(ANY_PRICE, |p| p.as_str())
                    .to_string(),
            ),
            radius_km: Some(preference.clamped_radius_km()),
            open_now_only: Some(preference.open_now_only),
            include_visited: Some(preference.include_visited),
        }
    }
}

/// Split a comma-joined list, trimming entries and dropping empties
pub fn split_list(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn join_list(items: &BTreeSet<String>) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Request DTO for PUT /preferences
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePreferenceRequest {
    #[serde(default)]
    pub cuisines: Vec<String>,

    #[serde(default)]
    pub dietary: Vec<String>,

    #[serde(default)]
    pub price: Option<PriceTier>,

    #[validate(range(min = 0.1, max = 25.0))]
    pub radius_km: f64,

    #[serde(default)]
    pub open_now_only: bool,

    #[serde(default)]
    pub include_visited: bool,
}

impl UpdatePreferenceRequest {
    pub fn into_preference(self) -> Preference {
        let clean = |items: Vec<String>| -> BTreeSet<String> {
            items
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Preference {
            cuisines: clean(self.cuisines),
            dietary: clean(self.dietary),
            price: self.price,
            radius_km: self.radius_km,
            open_now_only: self.open_now_only,
            include_visited: self.include_visited,
        }
    }
}
