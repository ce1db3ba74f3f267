use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{CoordinateResolver, WeatherResolver};
use crate::models::{Coordinates, Weather};

/// Admission control around a resolver: at most `max_in_flight` calls run at once.
///
/// Each wrapper owns its own permit pool, so a geocoder and a weather client
/// wrapped separately never share capacity.
pub struct Bounded<R> {
    inner: R,
    permits: Semaphore,
    max_in_flight: usize,
}

impl<R> Bounded<R> {
    #[must_use]
    pub fn new(inner: R, max_in_flight: usize) -> Self {
        Self {
            inner,
            permits: Semaphore::new(max_in_flight),
            max_in_flight,
        }
    }

    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    #[must_use]
    pub fn inner(&self) -> &R {
        &self.inner
    }
}

#[async_trait]
impl<R: CoordinateResolver> CoordinateResolver for Bounded<R> {
    async fn resolve(&self, city_name: &str) -> Option<Coordinates> {
        let _permit = self.permits.acquire().await.ok()?;
        self.inner.resolve(city_name).await
    }
}

#[async_trait]
impl<R: WeatherResolver> WeatherResolver for Bounded<R> {
    async fn resolve(&self, at: Coordinates) -> Option<Weather> {
        let _permit = self.permits.acquire().await.ok()?;
        self.inner.resolve(at).await
    }
}
