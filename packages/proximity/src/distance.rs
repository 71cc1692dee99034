//! Great-circle distance on a spherical Earth.

use homie_proximity_models::Coordinate;

/// Mean Earth radius used for every distance in the system, in miles.
///
/// Event stores report distances as central angles that are multiplied by
/// this same constant, so the two must stay in sync.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Haversine distance between `a` and `b`, in miles.
///
/// Symmetric, zero for identical points, and finite for any finite input.
/// Coordinates are not range-checked.
#[must_use]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

    // Rounding can push `h` a hair outside [0, 1] for antipodal points.
    2.0 * h.clamp(0.0, 1.0).sqrt().asin() * EARTH_RADIUS_MILES
}

/// Converts a great-circle distance in miles to a central angle in radians.
#[must_use]
pub fn miles_to_radians(miles: f64) -> f64 {
    miles / EARTH_RADIUS_MILES
}

/// Converts a central angle in radians to a great-circle distance in miles.
#[must_use]
pub fn radians_to_miles(radians: f64) -> f64 {
    radians * EARTH_RADIUS_MILES
}
