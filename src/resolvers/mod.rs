//! External data resolvers
//!
//! A resolver wraps one external data source and answers with `Option` instead of
//! an error: transport failures, non-2xx statuses, timeouts and empty results all
//! come back as `None`. Concurrency limits are applied by wrapping a resolver in
//! [`Bounded`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;

use crate::models::{Coordinates, Weather};

pub mod bounded;
pub mod geocoding;
pub mod weather;

pub use bounded::Bounded;
pub use geocoding::OpenCageClient;
pub use weather::OpenWeatherClient;

/// Default number of in-flight calls allowed per resolver
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 15;

/// Maps a city name to its coordinates
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    async fn resolve(&self, city_name: &str) -> Option<Coordinates>;

    /// Resolve every name concurrently, keyed by the input name
    async fn resolve_many(&self, names: &[String]) -> HashMap<String, Option<Coordinates>> {
        let lookups = names
            .iter()
            .map(|name| async move { (name.clone(), self.resolve(name).await) });
        join_all(lookups).await.into_iter().collect()
    }
}

/// Maps coordinates to the current weather there
#[async_trait]
pub trait WeatherResolver: Send + Sync {
    async fn resolve(&self, at: Coordinates) -> Option<Weather>;

    /// Resolve every point concurrently, keeping positions.
    /// Missing or invalid points yield `None` without a call.
    async fn resolve_many(&self, points: &[Option<Coordinates>]) -> Vec<Option<Weather>> {
        let lookups = points.iter().map(|point| async move {
            match point.filter(Coordinates::is_valid) {
                Some(at) => self.resolve(at).await,
                None => None,
            }
        });
        join_all(lookups).await
    }
}

#[async_trait]
impl<T: CoordinateResolver + ?Sized> CoordinateResolver for Arc<T> {
    async fn resolve(&self, city_name: &str) -> Option<Coordinates> {
        self.as_ref().resolve(city_name).await
    }
}

#[async_trait]
impl<T: WeatherResolver + ?Sized> WeatherResolver for Arc<T> {
    async fn resolve(&self, at: Coordinates) -> Option<Weather> {
        self.as_ref().resolve(at).await
    }
}
