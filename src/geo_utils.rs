//! Geographic utilities (distance and search-envelope calculations).
//!
//! All spatial comparisons in the engine go through [`haversine_distance`]
//! so Association, Breakup, and Join agree on one metric.

use geo::{HaversineDistance, Point};

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Great-circle distance in meters between two (latitude, longitude) pairs.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    Point::new(lon1, lat1).haversine_distance(&Point::new(lon2, lat2))
}

/// Axis-aligned degree envelope around a position, wide enough to contain
/// every point within `radius_meters`.
///
/// The longitude margin widens with latitude so the envelope stays
/// conservative away from the equator. Returns
/// `(min_lat, min_lon, max_lat, max_lon)`.
pub fn search_envelope(lat: f64, lon: f64, radius_meters: f64) -> (f64, f64, f64, f64) {
    // 5% slack so boundary-distance candidates survive the prefilter
    let lat_margin = radius_meters / METERS_PER_DEGREE * 1.05;
    let cos_lat = lat.to_radians().cos().abs().max(0.01);
    let lon_margin = radius_meters / (METERS_PER_DEGREE * cos_lat) * 1.05;
    // An envelope reaching the antimeridian widens to the full longitude
    // range so candidates on the far side still prefilter; the exact
    // distance check discards the extras.
    let (min_lon, max_lon) = if lon - lon_margin < -180.0 || lon + lon_margin > 180.0 {
        (-180.0, 180.0)
    } else {
        (lon - lon_margin, lon + lon_margin)
    };
    (lat - lat_margin, min_lon, lat + lat_margin, max_lon)
}
