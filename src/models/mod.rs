//! Data models for the city weather service
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Weather: Current weather snapshot
//! - City: Stored city records and their flat row shape

pub mod city;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use city::{CityRecord, CityRow, normalize_name};
pub use location::Coordinates;
pub use weather::Weather;
