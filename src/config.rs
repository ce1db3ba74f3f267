//! Configuration management for the city weather service
//!
//! Handles loading configuration from a TOML file and environment variables,
//! and provides validation for all configuration settings.

use crate::CityWeatherError;
use crate::resolvers::DEFAULT_MAX_CONCURRENT_REQUESTS;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `CITYWEATHER_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "CITYWEATHER";
/// Fallback variables for the API keys
pub const OPENCAGE_KEY_VAR: &str = "OPENCAGE_API_KEY";
pub const OPENWEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CityWeatherConfig {
    /// Geocoding API configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenCage geocoding API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u32,
    /// Maximum in-flight geocoding requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

/// OpenWeatherMap API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u32,
    /// Maximum in-flight weather requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for a whole request, including enrichment of a batch
    #[serde(default = "default_server_request_timeout")]
    pub request_timeout_seconds: u32,
    /// Maximum accepted upload size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_geocoding_base_url() -> String {
    "https://api.opencagedata.com/geocode/v1/json".to_string()
}

fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5/weather".to_string()
}

fn default_request_timeout() -> u32 {
    10
}

fn default_max_concurrent_requests() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5005
}

fn default_server_request_timeout() -> u32 {
    60
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_geocoding_base_url(),
            timeout_seconds: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_request_timeout(),
            max_concurrent_requests: default_max_concurrent_requests(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_server_request_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CityWeatherConfig {
    /// Load configuration from `config.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path
    pub fn load_from_path(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.map_or_else(Self::default_config_path, Path::to_path_buf);

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment variable overrides with CITYWEATHER_ prefix
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CityWeatherConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_key_fallbacks();
        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Default configuration file in the working directory
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Read API keys from the provider-specific variables when not configured
    pub fn apply_key_fallbacks(&mut self) {
        if self.geocoding.api_key.is_none() {
            self.geocoding.api_key = read_env_key(OPENCAGE_KEY_VAR);
        }
        if self.weather.api_key.is_none() {
            self.weather.api_key = read_env_key(OPENWEATHER_KEY_VAR);
        }
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_request_timeout();
        }
        if self.geocoding.max_concurrent_requests == 0 {
            self.geocoding.max_concurrent_requests = default_max_concurrent_requests();
        }
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_request_timeout();
        }
        if self.weather.max_concurrent_requests == 0 {
            self.weather.max_concurrent_requests = default_max_concurrent_requests();
        }
        if self.server.host.is_empty() {
            self.server.host = default_host();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_server_request_timeout();
        }
        if self.server.max_upload_bytes == 0 {
            self.server.max_upload_bytes = default_max_upload_bytes();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Both external APIs require a key
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("OpenCage", OPENCAGE_KEY_VAR, &self.geocoding.api_key),
            ("OpenWeatherMap", OPENWEATHER_KEY_VAR, &self.weather.api_key),
        ];
        for (service, variable, key) in keys {
            match key.as_deref() {
                None | Some("") => {
                    return Err(CityWeatherError::config(format!(
                        "Missing {service} API key. Set {variable} or configure it in the config file."
                    ))
                    .into());
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.geocoding.timeout_seconds > 300 || self.weather.timeout_seconds > 300 {
            return Err(CityWeatherError::config("API timeout cannot exceed 300 seconds").into());
        }

        for max in [
            self.geocoding.max_concurrent_requests,
            self.weather.max_concurrent_requests,
        ] {
            if !(1..=100).contains(&max) {
                return Err(CityWeatherError::config(
                    "Max concurrent requests must be between 1 and 100",
                )
                .into());
            }
        }

        if self.server.request_timeout_seconds > 3600 {
            return Err(CityWeatherError::config(
                "Server request timeout cannot exceed 3600 seconds",
            )
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CityWeatherError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [&self.geocoding.base_url, &self.weather.base_url] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CityWeatherError::config(format!(
                    "API base URL must be a valid HTTP or HTTPS URL, got '{url}'"
                ))
                .into());
            }
        }

        Ok(())
    }
}

fn read_env_key(variable: &str) -> Option<String> {
    std::env::var(variable).ok().filter(|key| !key.is_empty())
}
