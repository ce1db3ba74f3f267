//! Integration tests for the OpenCage and OpenWeatherMap clients using wiremock.

use std::time::Duration;

use city_weather::{
    CoordinateResolver, Coordinates, OpenCageClient, OpenWeatherClient, Weather, WeatherResolver,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn geocoder(server: &MockServer) -> OpenCageClient {
    OpenCageClient::new(format!("{}/geocode", server.uri()), "test-key", TIMEOUT).unwrap()
}

fn weather_client(server: &MockServer) -> OpenWeatherClient {
    OpenWeatherClient::new(format!("{}/weather", server.uri()), "test-key", TIMEOUT).unwrap()
}

fn paris() -> Coordinates {
    Coordinates::new(48.8566, 2.3522).unwrap()
}

#[tokio::test]
async fn test_geocode_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode"))
        .and(query_param("q", "tel aviv"))
        .and(query_param("key", "test-key"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "geometry": { "lat": 32.0853, "lng": 34.7818 } },
                { "geometry": { "lat": 0.0, "lng": 0.0 } }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coordinates = geocoder(&mock_server).resolve("tel aviv").await;
    assert_eq!(coordinates, Coordinates::new(32.0853, 34.7818));
}

#[tokio::test]
async fn test_geocode_no_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(&mock_server)
        .await;

    assert!(geocoder(&mock_server).resolve("tal avivi").await.is_none());
}

#[tokio::test]
async fn test_geocode_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    assert!(geocoder(&mock_server).resolve("paris").await.is_none());
}

#[tokio::test]
async fn test_geocode_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    assert!(geocoder(&mock_server).resolve("paris").await.is_none());
}

#[tokio::test]
async fn test_geocode_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geocode"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [{ "geometry": { "lat": 1.0, "lng": 1.0 } }] }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let client = OpenCageClient::new(
        format!("{}/geocode", mock_server.uri()),
        "test-key",
        Duration::from_millis(50),
    )
    .unwrap();
    assert!(client.resolve("paris").await.is_none());
}

#[tokio::test]
async fn test_weather_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.8566"))
        .and(query_param("lon", "2.3522"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{ "main": "Rain", "description": "light rain" }],
            "main": { "temp": 11.5, "humidity": 80 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let weather = weather_client(&mock_server).resolve(paris()).await;
    assert_eq!(weather, Some(Weather::new("light rain", 11.5)));
}

#[tokio::test]
async fn test_weather_missing_conditions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [],
            "main": { "temp": 11.5 }
        })))
        .mount(&mock_server)
        .await;

    assert!(weather_client(&mock_server).resolve(paris()).await.is_none());
}

#[tokio::test]
async fn test_weather_missing_temperature() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{ "description": "clear sky" }]
        })))
        .mount(&mock_server)
        .await;

    assert!(weather_client(&mock_server).resolve(paris()).await.is_none());
}

#[tokio::test]
async fn test_weather_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "cod": 401,
            "message": "Invalid API key"
        })))
        .mount(&mock_server)
        .await;

    assert!(weather_client(&mock_server).resolve(paris()).await.is_none());
}

#[tokio::test]
async fn test_weather_resolve_many_skips_missing_points() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{ "description": "clear sky" }],
            "main": { "temp": 20.0 }
        })))
        .expect(2)
        .mount(&mock_server)
        .await;

    let points = vec![Some(paris()), None, Coordinates::new(32.0853, 34.7818)];
    let results = weather_client(&mock_server).resolve_many(&points).await;

    assert_eq!(results.len(), 3);
    assert!(results[0].is_some());
    assert!(results[1].is_none());
    assert!(results[2].is_some());
}
