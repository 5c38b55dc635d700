// src/services/preference_filter.rs
// DOCUMENTATION: Preference matching
// PURPOSE: Pure, order-preserving filter of places against a user's preferences

use crate::models::{Place, Preference};

/// Normalized cuisine key
/// Cuisine comparison is case-insensitive and whitespace-trimmed everywhere
pub fn cuisine_key(cuisine: &str) -> String {
    cuisine.trim().to_lowercase()
}

/// Whether a place satisfies a preference
/// Absence on either side of the price check is permissive; unknown openness
/// counts as open
pub fn matches(place: &Place, preference: &Preference) -> bool {
    let cuisine_ok = preference.cuisines.is_empty() || {
        let wanted = cuisine_key(&place.cuisine);
        preference.cuisines.iter().any(|c| cuisine_key(c) == wanted)
    };

    let price_ok = match (preference.price, place.price) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    };

    let open_ok = !preference.open_now_only || place.open_now;

    cuisine_ok && price_ok && open_ok
}

/// Places matching `preference`, in input order
pub fn filter_places(places: &[Place], preference: &Preference) -> Vec<Place> {
    places
        .iter()
        .filter(|p| matches(p, preference))
        .cloned()
        .collect()
}
