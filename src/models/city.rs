//! City record held by the store, and its flat row shape used for JSON and CSV

use serde::{Deserialize, Serialize};

use super::{Coordinates, Weather};

/// Normalize a city name into its store key
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A single city, optionally enriched with coordinates and weather.
///
/// `weather` is only ever set together with or after `coordinates`.
#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub name: String,
    pub coordinates: Option<Coordinates>,
    pub weather: Option<Weather>,
}

impl CityRecord {
    /// Bare record with a normalized name and nothing resolved yet
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize_name(name),
            coordinates: None,
            weather: None,
        }
    }

    #[must_use]
    pub fn enriched(name: &str, coordinates: Coordinates, weather: Weather) -> Self {
        Self {
            name: normalize_name(name),
            coordinates: Some(coordinates),
            weather: Some(weather),
        }
    }

    /// Both coordinates and weather are present
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.coordinates.is_some() && self.weather.is_some()
    }
}

/// Flat tabular view of a record: `city_name, lat, lon, weather, temperature`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRow {
    pub city_name: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
}

impl From<&CityRecord> for CityRow {
    fn from(record: &CityRecord) -> Self {
        Self {
            city_name: record.name.clone(),
            lat: record.coordinates.map(|c| c.latitude),
            lon: record.coordinates.map(|c| c.longitude),
            weather: record.weather.as_ref().map(|w| w.description.clone()),
            temperature: record.weather.as_ref().map(|w| w.temperature),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Tel Aviv", "tel aviv")]
    #[case("PARIS", "paris")]
    #[case("  New York ", "new york")]
    #[case("london", "london")]
    fn test_normalize_name(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_name(input), expected);
        assert_eq!(normalize_name(input), normalize_name(&input.to_lowercase()));
    }

    #[test]
    fn test_is_enriched() {
        let coordinates = Coordinates::new(48.8566, 2.3522).unwrap();
        assert!(!CityRecord::new("Paris").is_enriched());
        let enriched = CityRecord::enriched("Paris", coordinates, Weather::new("mist", 9.0));
        assert!(enriched.is_enriched());

        let mut partial = CityRecord::new("Paris");
        partial.coordinates = Some(coordinates);
        assert!(!partial.is_enriched());
    }

    #[test]
    fn test_row_from_bare_record() {
        let row = CityRow::from(&CityRecord::new("Paris"));
        assert_eq!(row.city_name, "paris");
        assert!(row.lat.is_none());
        assert!(row.lon.is_none());
        assert!(row.weather.is_none());
        assert!(row.temperature.is_none());
    }

    #[test]
    fn test_row_from_enriched_record() {
        let record = CityRecord::enriched(
            "Paris",
            Coordinates::new(48.8566, 2.3522).unwrap(),
            Weather::new("light rain", 14.2),
        );
        let row = CityRow::from(&record);
        assert_eq!(row.lat, Some(48.8566));
        assert_eq!(row.lon, Some(2.3522));
        assert_eq!(row.weather.as_deref(), Some("light rain"));
        assert_eq!(row.temperature, Some(14.2));
    }
}
