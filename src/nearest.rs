//! Nearest-city query with on-demand weather backfill

use serde::Serialize;
use tracing::{debug, instrument};

use crate::geo::round2;
use crate::models::Coordinates;
use crate::resolvers::WeatherResolver;
use crate::store::SharedStore;
use crate::Result;

/// Closest stored city to a query point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestCity {
    pub city_name: String,
    /// Great-circle distance, rounded to 2 decimals
    pub distance_km: f64,
    pub weather: Option<String>,
    pub temperature: Option<f64>,
}

/// Find the stored city closest to `query`.
///
/// When the closest record has no weather yet and a resolver is given, weather is
/// fetched for that record only and written back to the store. A failed or
/// skipped fetch leaves the weather fields empty rather than failing the query.
/// The store lock is not held across the fetch.
#[instrument(skip(store, weather_resolver))]
pub async fn find_closest_city(
    store: &SharedStore,
    query: Coordinates,
    weather_resolver: Option<&dyn WeatherResolver>,
) -> Result<NearestCity> {
    let closest = store.read().await.closest(query)?;

    let weather = match (closest.weather, weather_resolver) {
        (Some(weather), _) => Some(weather),
        (None, Some(resolver)) => {
            debug!("Fetching missing weather for '{}'", closest.name);
            let fetched = resolver.resolve(closest.coordinates).await;
            if let Some(weather) = &fetched {
                store
                    .write()
                    .await
                    .backfill_weather(&closest.name, closest.coordinates, weather.clone());
            }
            fetched
        }
        (None, None) => None,
    };

    Ok(NearestCity {
        city_name: closest.name,
        distance_km: round2(closest.distance_km),
        temperature: weather.as_ref().map(|w| w.temperature),
        weather: weather.map(|w| w.description),
    })
}
