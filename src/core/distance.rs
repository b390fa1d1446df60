use geo::Point;

use crate::models::Location;

/// Earth's radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate the Haversine distance between two points in meters
///
/// # Arguments
/// * `from` - First point, x = longitude and y = latitude in degrees
/// * `to` - Second point, same convention
///
/// # Returns
/// Great-circle distance in meters
#[inline]
pub fn haversine_distance(from: Point<f64>, to: Point<f64>) -> f64 {
    let phi1 = from.y().to_radians();
    let phi2 = to.y().to_radians();
    let delta_phi = (to.y() - from.y()).to_radians();
    let delta_lambda = (to.x() - from.x()).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two optional locations, `None` when either is unknown
#[inline]
pub fn distance_between(a: Option<&Location>, b: Option<&Location>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(haversine_distance(a.point(), b.point())),
        _ => None,
    }
}
