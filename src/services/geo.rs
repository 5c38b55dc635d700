// src/services/geo.rs
// DOCUMENTATION: Pure geographic helpers
// PURPOSE: Haversine distance, radius clamping and rounding for cache and dedup keys

use geo_types::Point;

use crate::models::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Provider-imposed search radius range in meters
pub const MIN_RADIUS_M: u32 = 100;
pub const MAX_RADIUS_M: u32 = 25_000;

/// Decimal places kept in cache keys (~111 m)
const CACHE_KEY_DECIMALS: i32 = 3;

/// Decimal places kept in dedup keys (~1 m)
const DEDUP_DECIMALS: i32 = 5;

/// Great-circle distance in kilometers
/// Uses Haversine formula; None when either side is unknown
pub fn distance_km(a: Option<Coordinates>, b: Option<Coordinates>) -> Option<f64> {
    let (a, b): (Point<f64>, Point<f64>) = match (a, b) {
        (Some(a), Some(b)) => (a.into(), b.into()),
        _ => return None,
    };

    let d_lat = (b.y() - a.y()).to_radians();
    let d_lon = (b.x() - a.x()).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.y().to_radians().cos() * b.y().to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    // rounding can push h just past 1.0 for antipodal points
    let c = 2.0 * h.min(1.0).sqrt().asin();

    Some(EARTH_RADIUS_KM * c)
}

pub fn clamp_radius_m(radius_m: u32) -> u32 {
    radius_m.clamp(MIN_RADIUS_M, MAX_RADIUS_M)
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Cache key for a nearby query
/// Coordinates are coarsened on purpose so GPS jitter lands on the same entry
pub fn cache_key_for(coords: Coordinates, radius_m: u32) -> String {
    format!(
        "rest:{:.prec$},{:.prec$},{}",
        round_to(coords.lat, CACHE_KEY_DECIMALS),
        round_to(coords.lng, CACHE_KEY_DECIMALS),
        radius_m,
        prec = CACHE_KEY_DECIMALS as usize
    )
}

/// Identity of a physical venue: lowercase name plus ~1 m position
pub fn dedup_key(name: &str, coords: Coordinates) -> String {
    format!(
        "{}|{:.prec$}|{:.prec$}",
        name.trim().to_lowercase(),
        round_to(coords.lat, DEDUP_DECIMALS),
        round_to(coords.lng, DEDUP_DECIMALS),
        prec = DEDUP_DECIMALS as usize
    )
}
