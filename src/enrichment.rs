//! Enrichment pipeline
//!
//! Each city runs through the same two-step state machine: resolve coordinates,
//! then resolve weather at those coordinates. Cities are processed concurrently
//! and independently; a failure for one city is reported as data and never
//! cancels the others.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::models::{Coordinates, Weather};
use crate::resolvers::{CoordinateResolver, WeatherResolver};

pub const COORDINATES_NOT_FOUND: &str = "coordinates not found";
pub const WEATHER_NOT_FOUND: &str = "weather not found";

/// Outcome of enriching a single city
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentResult {
    Success {
        name: String,
        coordinates: Coordinates,
        weather: Weather,
    },
    CoordinateFailure {
        name: String,
    },
    WeatherFailure {
        name: String,
        coordinates: Coordinates,
    },
}

impl EnrichmentResult {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Success { name, .. }
            | Self::CoordinateFailure { name }
            | Self::WeatherFailure { name, .. } => name,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Success { coordinates, .. } | Self::WeatherFailure { coordinates, .. } => {
                Some(*coordinates)
            }
            Self::CoordinateFailure { .. } => None,
        }
    }

    #[must_use]
    pub fn weather(&self) -> Option<&Weather> {
        match self {
            Self::Success { weather, .. } => Some(weather),
            _ => None,
        }
    }

    /// Failure marker, `None` on success
    #[must_use]
    pub fn error(&self) -> Option<&'static str> {
        match self {
            Self::Success { .. } => None,
            Self::CoordinateFailure { .. } => Some(COORDINATES_NOT_FOUND),
            Self::WeatherFailure { .. } => Some(WEATHER_NOT_FOUND),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Aggregate counts over a batch of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichmentSummary {
    pub enriched_count: usize,
    pub failed_count: usize,
    /// Failed city names in batch order
    pub failed_cities: Vec<String>,
}

impl EnrichmentSummary {
    #[must_use]
    pub fn from_results(results: &[EnrichmentResult]) -> Self {
        let failed_cities: Vec<String> = results
            .iter()
            .filter(|result| !result.is_success())
            .map(|result| result.name().to_string())
            .collect();

        Self {
            enriched_count: results.len() - failed_cities.len(),
            failed_count: failed_cities.len(),
            failed_cities,
        }
    }
}

/// Orchestrates coordinate then weather resolution for cities.
///
/// Resolvers are injected, so the pipeline owns no global state and tests can
/// substitute doubles. Concurrency limits live in the resolvers themselves.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    coordinates: Arc<dyn CoordinateResolver>,
    weather: Arc<dyn WeatherResolver>,
}

impl EnrichmentPipeline {
    #[must_use]
    pub fn new(
        coordinates: Arc<dyn CoordinateResolver>,
        weather: Arc<dyn WeatherResolver>,
    ) -> Self {
        Self {
            coordinates,
            weather,
        }
    }

    /// The weather resolver, shared with the nearest-city backfill
    #[must_use]
    pub fn weather_resolver(&self) -> &dyn WeatherResolver {
        self.weather.as_ref()
    }

    /// Enrich one city. Absence from either resolver becomes a failure variant.
    pub async fn enrich_one(&self, name: &str) -> EnrichmentResult {
        let Some(coordinates) = self.coordinates.resolve(name).await else {
            warn!("Coordinates not found for '{}'", name);
            return EnrichmentResult::CoordinateFailure {
                name: name.to_string(),
            };
        };

        let Some(weather) = self.weather.resolve(coordinates).await else {
            warn!("Weather not found for '{}'", name);
            return EnrichmentResult::WeatherFailure {
                name: name.to_string(),
                coordinates,
            };
        };

        debug!("Enriched '{}'", name);
        EnrichmentResult::Success {
            name: name.to_string(),
            coordinates,
            weather,
        }
    }

    /// Enrich every name concurrently. Returns once all have completed, in input order.
    #[instrument(skip_all, fields(cities = names.len()))]
    pub async fn enrich_batch(&self, names: &[String]) -> Vec<EnrichmentResult> {
        let results = join_all(names.iter().map(|name| self.enrich_one(name))).await;

        let summary = EnrichmentSummary::from_results(&results);
        info!(
            "Enrichment finished: {} enriched, {} failed",
            summary.enriched_count, summary.failed_count
        );
        results
    }
}
