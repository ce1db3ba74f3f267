//! Shared resolver doubles and request helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use city_weather::config::ServerConfig;
use city_weather::{
    AppState, CoordinateResolver, Coordinates, EnrichmentPipeline, Weather, WeatherResolver, web,
};
use serde_json::Value;
use tower::ServiceExt;

/// Tracks how many calls are running at once and the highest value seen
#[derive(Debug, Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Geocoder answering from a fixed table; unknown names are not found
#[derive(Debug, Default)]
pub struct FixtureGeocoder {
    pub delay: Option<Duration>,
    pub in_flight: InFlight,
}

impl FixtureGeocoder {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

pub fn fixture_coordinates(city_name: &str) -> Option<Coordinates> {
    match city_name {
        "paris" => Coordinates::new(48.8566, 2.3522),
        "new york" => Coordinates::new(40.7128, -74.0060),
        "tel aviv" => Coordinates::new(32.0853, 34.7818),
        "london" => Coordinates::new(51.5074, -0.1278),
        "jerusalem" => Coordinates::new(31.7683, 35.2137),
        name if name.starts_with("city ") => Coordinates::new(10.0, 10.0),
        _ => None,
    }
}

#[async_trait]
impl CoordinateResolver for FixtureGeocoder {
    async fn resolve(&self, city_name: &str) -> Option<Coordinates> {
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.exit();
        fixture_coordinates(city_name)
    }
}

/// Weather double; `fail_all` makes every lookup come back empty
#[derive(Debug, Default)]
pub struct FixtureWeather {
    pub fail_all: bool,
    pub delay: Option<Duration>,
    pub in_flight: InFlight,
}

impl FixtureWeather {
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }
}

#[async_trait]
impl WeatherResolver for FixtureWeather {
    async fn resolve(&self, at: Coordinates) -> Option<Weather> {
        self.in_flight.enter();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.exit();
        if self.fail_all {
            return None;
        }
        let description = if at.latitude > 45.0 { "light rain" } else { "clear sky" };
        Some(Weather::new(description, (at.latitude / 2.0).round()))
    }
}

pub fn test_app(geocoder: FixtureGeocoder, weather: FixtureWeather) -> Router {
    test_app_with(geocoder, weather, &ServerConfig::default())
}

pub fn test_app_with(
    geocoder: FixtureGeocoder,
    weather: FixtureWeather,
    config: &ServerConfig,
) -> Router {
    let pipeline = EnrichmentPipeline::new(Arc::new(geocoder), Arc::new(weather));
    web::app(AppState::new(pipeline), config)
}

/// App whose request timeout is a single second
pub fn short_timeout_app(geocoder: FixtureGeocoder) -> Router {
    let config = ServerConfig {
        request_timeout_seconds: 1,
        ..ServerConfig::default()
    };
    test_app_with(geocoder, FixtureWeather::default(), &config)
}

pub fn default_app() -> Router {
    test_app(FixtureGeocoder::default(), FixtureWeather::default())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "city-weather-test-boundary";

/// Multipart upload with a single field
pub fn post_multipart(uri: &str, field: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    let disposition = format!("form-data; name=\"{field}\"; filename=\"{filename}\"");
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn upload_csv(contents: &[u8]) -> Request<Body> {
    post_multipart("/upload-cities", "file", "cities.csv", contents)
}
