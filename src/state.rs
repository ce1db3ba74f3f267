//! Service context shared by all request handlers

use std::sync::Arc;

use tracing::info;

use crate::Result;
use crate::config::CityWeatherConfig;
use crate::enrichment::EnrichmentPipeline;
use crate::resolvers::{
    Bounded, CoordinateResolver, OpenCageClient, OpenWeatherClient, WeatherResolver,
};
use crate::store::{CityStore, SharedStore};

/// Owns the city store and the enrichment pipeline (and through it, both resolvers)
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub pipeline: Arc<EnrichmentPipeline>,
}

impl AppState {
    /// Empty, uninitialized store around the given pipeline
    #[must_use]
    pub fn new(pipeline: EnrichmentPipeline) -> Self {
        Self {
            store: CityStore::new().shared(),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the HTTP resolvers, each behind its own permit pool
    pub fn from_config(config: &CityWeatherConfig) -> Result<Self> {
        let geocoder: Arc<dyn CoordinateResolver> = Arc::new(Bounded::new(
            OpenCageClient::from_config(&config.geocoding)?,
            config.geocoding.max_concurrent_requests,
        ));
        let weather: Arc<dyn WeatherResolver> = Arc::new(Bounded::new(
            OpenWeatherClient::from_config(&config.weather)?,
            config.weather.max_concurrent_requests,
        ));

        info!(
            "Resolvers ready (geocoding: {} in flight, weather: {} in flight)",
            config.geocoding.max_concurrent_requests, config.weather.max_concurrent_requests
        );
        Ok(Self::new(EnrichmentPipeline::new(geocoder, weather)))
    }
}
