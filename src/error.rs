//! Error types and handling for the city weather service

use thiserror::Error;

/// Main error type for the city weather service
#[derive(Error, Debug)]
pub enum CityWeatherError {
    /// Malformed or missing required input
    #[error("Invalid input: {message}")]
    Input { message: String },

    /// Operation targets a city that does not exist
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Store is uninitialized, empty or not yet enriched
    #[error("No data: {message}")]
    State { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// API client construction or communication errors
    #[error("API error: {message}")]
    Api { message: String },

    /// Tabular import/export errors
    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl CityWeatherError {
    /// Create a new input error
    pub fn input<S: Into<String>>(message: S) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found<S: Into<String>>(message: S) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a new state error
    pub fn state<S: Into<String>>(message: S) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            CityWeatherError::Input { message }
            | CityWeatherError::NotFound { message }
            | CityWeatherError::State { message } => message.clone(),
            CityWeatherError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            CityWeatherError::Api { .. } => {
                "Unable to connect to external services.".to_string()
            }
            CityWeatherError::Csv { source } => format!("Invalid CSV data: {source}"),
            CityWeatherError::Io { .. } => "File operation failed.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let input_err = CityWeatherError::input("missing 'city_name' column");
        assert!(matches!(input_err, CityWeatherError::Input { .. }));

        let not_found_err = CityWeatherError::not_found("paris");
        assert!(matches!(not_found_err, CityWeatherError::NotFound { .. }));

        let state_err = CityWeatherError::state("no cities loaded");
        assert!(matches!(state_err, CityWeatherError::State { .. }));
    }

    #[test]
    fn test_user_messages() {
        let state_err = CityWeatherError::state("No cities loaded");
        assert_eq!(state_err.user_message(), "No cities loaded");

        let config_err = CityWeatherError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = CityWeatherError::api("test");
        assert!(api_err.user_message().contains("Unable to connect"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: CityWeatherError = io_err.into();
        assert!(matches!(err, CityWeatherError::Io { .. }));
    }
}
