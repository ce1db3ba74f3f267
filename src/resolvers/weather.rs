//! Current weather client for the OpenWeatherMap API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::WeatherResolver;
use crate::config::WeatherConfig;
use crate::models::{Coordinates, Weather};
use crate::{CityWeatherError, Result};

const USER_AGENT: &str = concat!("city-weather/", env!("CARGO_PKG_VERSION"));

/// Fetches current conditions (metric units) for a coordinate pair
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new weather client
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CityWeatherError::api(format!("Failed to create weather client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CityWeatherError::config("Missing OpenWeatherMap API key"))?;
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_seconds.into()),
        )
    }

    fn request_url(&self, at: Coordinates) -> String {
        format!(
            "{}?lat={}&lon={}&appid={}&units=metric",
            self.base_url,
            at.latitude,
            at.longitude,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl WeatherResolver for OpenWeatherClient {
    #[instrument(name = "current_weather", skip(self))]
    async fn resolve(&self, at: Coordinates) -> Option<Weather> {
        let response = match self.client.get(self.request_url(at)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Weather request failed for ({}): {}",
                    at.format_coordinates(),
                    e
                );
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                "Weather API returned status {} for ({})",
                response.status(),
                at.format_coordinates()
            );
            return None;
        }

        let body: openweather::CurrentWeatherResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to parse weather response: {}", e);
                return None;
            }
        };

        let weather = body.into_weather();
        if weather.is_none() {
            debug!("No weather data in response for ({})", at.format_coordinates());
        }
        weather
    }
}

/// OpenWeatherMap API response structures
mod openweather {
    use serde::Deserialize;

    use crate::models::Weather;

    #[derive(Debug, Deserialize)]
    pub struct CurrentWeatherResponse {
        #[serde(default)]
        pub weather: Vec<Condition>,
        pub main: Option<MainReadings>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Condition {
        pub description: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct MainReadings {
        pub temp: f64,
    }

    impl CurrentWeatherResponse {
        /// Both a description and a temperature are required
        pub fn into_weather(self) -> Option<Weather> {
            let condition = self.weather.into_iter().next()?;
            let main = self.main?;
            Some(Weather::new(condition.description, main.temp))
        }
    }
}
