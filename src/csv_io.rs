//! CSV import and export of the city table

use crate::models::{CityRecord, CityRow};
use crate::{CityWeatherError, Result};

/// Column holding the city names on import
pub const NAME_COLUMN: &str = "city_name";

/// Read the `city_name` column from CSV bytes. Other columns are ignored and
/// blank names are skipped.
pub fn parse_city_names(bytes: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let column = reader
        .headers()?
        .iter()
        .position(|header| header == NAME_COLUMN)
        .ok_or_else(|| CityWeatherError::input(format!("Missing '{NAME_COLUMN}' column in CSV.")))?;

    let mut names = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(name) = row.get(column).filter(|name| !name.is_empty()) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// Serialize records as CSV with a `city_name,lat,lon,weather,temperature` header
pub fn write_city_rows(records: &[CityRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(CityRow::from(record))?;
    }
    writer.flush()?;
    writer.into_inner().map_err(|e| CityWeatherError::Io {
        source: std::io::Error::new(e.error().kind(), e.error().to_string()),
    })
}
