//! Current weather snapshot attached to an enriched city

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Weather {
    /// Human-readable description of weather conditions
    pub description: String,
    /// Temperature in Celsius
    pub temperature: f64,
}

impl Weather {
    #[must_use]
    pub fn new(description: impl Into<String>, temperature: f64) -> Self {
        Self {
            description: description.into(),
            temperature,
        }
    }
}
