//! Great-circle distance and coordinate validation

use haversine::{Location as HaversineLocation, Units, distance};

use crate::models::Coordinates;

/// Great-circle distance in kilometers (Earth radius 6371 km)
#[must_use]
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let from_haversine = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to_haversine = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    distance(from_haversine, to_haversine, Units::Kilometers)
}

/// Whether `lat` is within [-90, 90] and `lon` within [-180, 180].
/// NaN and infinities are rejected.
#[must_use]
pub fn is_valid_coordinates(lat: f64, lon: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}

/// Validate untyped coordinate input, e.g. fields of a JSON request body.
/// Anything that is not a JSON number is rejected.
#[must_use]
pub fn parse_coordinates(lat: &serde_json::Value, lon: &serde_json::Value) -> Option<Coordinates> {
    Coordinates::new(lat.as_f64()?, lon.as_f64()?)
}

/// Round to two decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
