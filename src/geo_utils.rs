//! Geographic utilities: great-circle distance, path length, bounds and
//! small local offsets used to place shape templates on the map.

use crate::{Bounds, GpsPoint};

/// Mean Earth radius in meters used by every distance computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Meters per degree of latitude on the sphere above.
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Great-circle distance between two points in meters (haversine formula).
///
/// Symmetric, and exactly `0.0` for identical points.
///
/// # Example
/// ```
/// use runsketch::GpsPoint;
/// use runsketch::geo_utils::haversine_distance;
///
/// let london = GpsPoint::new(51.5074, -0.1278);
/// let paris = GpsPoint::new(48.8566, 2.3522);
/// let d = haversine_distance(&london, &paris);
/// assert!((d - 343_500.0).abs() < 1_000.0);
/// ```
pub fn haversine_distance(a: &GpsPoint, b: &GpsPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    // Rounding can push h a hair above 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * c
}

/// Total length of a polyline in meters.
///
/// Zero for empty and single-point inputs.
pub fn polyline_length(points: &[GpsPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Convert a distance in meters to (latitude, longitude) degree deltas at
/// the given latitude.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> (f64, f64) {
    let dlat = meters / METERS_PER_DEGREE;
    let cos_lat = latitude.to_radians().cos().abs().max(1e-6);
    let dlng = meters / (METERS_PER_DEGREE * cos_lat);
    (dlat, dlng)
}

/// Move a point by `east` and `north` meters using a local flat-earth
/// approximation. Good enough for drawings a few kilometers across.
pub fn offset_point(origin: &GpsPoint, east: f64, north: f64) -> GpsPoint {
    let (dlat, _) = meters_to_degrees(north, origin.latitude);
    let (_, dlng) = meters_to_degrees(east, origin.latitude);
    GpsPoint::new(origin.latitude + dlat, origin.longitude + dlng)
}

/// Bounding box of a set of points.
pub fn compute_bounds(points: &[GpsPoint]) -> Option<Bounds> {
    Bounds::from_points(points)
}

/// Arithmetic mean of the points' coordinates.
pub fn compute_center(points: &[GpsPoint]) -> Option<GpsPoint> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (lat, lng) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lng), p| (lat + p.latitude, lng + p.longitude));
    Some(GpsPoint::new(lat / n, lng / n))
}
