//! City weather service
//!
//! Maintains an in-memory table of city names, enriches each with coordinates
//! and current weather from external APIs, and answers nearest-city queries.

pub mod api;
pub mod config;
pub mod csv_io;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod logging;
pub mod models;
pub mod nearest;
pub mod resolvers;
pub mod state;
pub mod store;
pub mod web;

// Re-export core types for public API
pub use config::CityWeatherConfig;
pub use enrichment::{EnrichmentPipeline, EnrichmentResult, EnrichmentSummary};
pub use error::CityWeatherError;
pub use models::{CityRecord, Coordinates, Weather};
pub use nearest::{NearestCity, find_closest_city};
pub use resolvers::{
    Bounded, CoordinateResolver, OpenCageClient, OpenWeatherClient, WeatherResolver,
};
pub use state::AppState;
pub use store::{CityStore, SharedStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, CityWeatherError>;
