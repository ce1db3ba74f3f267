//! Geocoding client for the OpenCage API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use super::CoordinateResolver;
use crate::config::GeocodingConfig;
use crate::models::Coordinates;
use crate::{CityWeatherError, Result};

const USER_AGENT: &str = concat!("city-weather/", env!("CARGO_PKG_VERSION"));

/// Resolves city names to coordinates through OpenCage forward geocoding
pub struct OpenCageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenCageClient {
    /// Create a new geocoding client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CityWeatherError::api(format!("Failed to create geocoding client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &GeocodingConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CityWeatherError::config("Missing OpenCage API key"))?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_seconds.into()),
        )
    }

    fn request_url(&self, city_name: &str) -> String {
        format!(
            "{}?q={}&key={}&limit=1&no_annotations=1",
            self.base_url,
            urlencoding::encode(city_name),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl CoordinateResolver for OpenCageClient {
    #[instrument(name = "geocode", skip(self))]
    async fn resolve(&self, city_name: &str) -> Option<Coordinates> {
        let response = match self.client.get(self.request_url(city_name)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Geocoding request failed for {}: {}", city_name, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Geocoding returned status {} for {}",
                response.status(),
                city_name
            );
            return None;
        }

        let body: opencage::GeocodingResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to parse geocoding response for {}: {}", city_name, e);
                return None;
            }
        };

        let Some(best) = body.results.into_iter().next() else {
            info!("No results found for city: {}", city_name);
            return None;
        };

        let coordinates = Coordinates::new(best.geometry.lat, best.geometry.lng);
        debug!("Resolved {} to {:?}", city_name, coordinates);
        coordinates
    }
}

/// OpenCage API response structures
mod opencage {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResponse {
        #[serde(default)]
        pub results: Vec<GeocodingResult>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodingResult {
        pub geometry: Geometry,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub lat: f64,
        pub lng: f64,
    }
}
