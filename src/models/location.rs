//! Coordinate model for resolved city positions

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    /// Latitude in decimal degrees, within [-90, 90]
    pub latitude: f64,
    /// Longitude in decimal degrees, within [-180, 180]
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting values outside the valid Earth ranges
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let coordinates = Self {
            latitude,
            longitude,
        };
        coordinates.is_valid().then_some(coordinates)
    }

    /// Whether both components are finite and inside their ranges
    #[must_use]
    pub fn is_valid(&self) -> bool {
        crate::geo::is_valid_coordinates(self.latitude, self.longitude)
    }

    /// Format as a coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}
