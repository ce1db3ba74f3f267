use std::sync::Arc;

use axum::{
    Router,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::task::JoinError;
use tracing::{debug, error, warn};

use crate::{
    CityWeatherError, csv_io,
    enrichment::EnrichmentSummary,
    geo,
    models::{CityRecord, CityRow, normalize_name},
    nearest::{NearestCity, find_closest_city},
    state::AppState,
};

/// Error body `{"error": "..."}` with its status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<CityWeatherError> for ApiError {
    fn from(err: CityWeatherError) -> Self {
        let status = match &err {
            CityWeatherError::Input { .. } | CityWeatherError::Csv { .. } => {
                StatusCode::BAD_REQUEST
            }
            CityWeatherError::NotFound { .. } => StatusCode::NOT_FOUND,
            CityWeatherError::State { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            CityWeatherError::Config { .. }
            | CityWeatherError::Api { .. }
            | CityWeatherError::Io { .. } => {
                error!("Request failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, err.user_message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
pub struct EnrichResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: EnrichmentSummary,
}

#[derive(Serialize)]
pub struct AddCityResponse {
    pub message: String,
    pub total_cities: usize,
    pub new: bool,
    /// Whether the stored record carries coordinates and weather
    pub enriched: bool,
}

#[derive(Serialize)]
pub struct CitiesResponse {
    pub cities: Vec<CityRow>,
    pub count: usize,
}

/// Routes answered within the request timeout
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/upload-cities", post(upload_cities))
        .route("/add-city", post(add_city))
        .route("/closest-city", post(closest_city))
        .route("/delete-city/{city_name}", delete(delete_city))
        .route("/get-all-cities", get(get_all_cities))
        .route("/export-cities", get(export_cities))
}

/// Batch routes; these run to completion and are not subject to the request timeout
pub fn batch_routes() -> Router<AppState> {
    Router::new().route("/enrich-data", post(enrich_all))
}

async fn index() -> Json<Value> {
    Json(json!({ "message": "City Weather API is running" }))
}

async fn upload_cities(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Value>> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;
            file = Some(bytes);
            break;
        }
    }

    let bytes = file.ok_or_else(|| ApiError::bad_request("Missing file"))?;
    let names = csv_io::parse_city_names(&bytes)?;
    let count = state.store.write().await.load_batch(names);

    Ok(Json(json!({
        "message": format!("{count} cities loaded successfully."),
        "count": count,
    })))
}

async fn enrich_all(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<EnrichResponse>)> {
    let (names, since) = {
        let store = state.store.read().await;
        (store.names()?, store.version())
    };

    // Detached so a dropped request cannot cancel the batch or its write-back
    let store = Arc::clone(&state.store);
    let pipeline = Arc::clone(&state.pipeline);
    let batch = tokio::spawn(async move {
        let results = pipeline.enrich_batch(&names).await;
        let applied = store.write().await.apply_batch_enrichment(since, &results);
        debug!("Batch enrichment written back: {:?}", applied);
        results
    });
    let results = batch.await.map_err(task_failed)?;
    let summary = EnrichmentSummary::from_results(&results);

    if summary.enriched_count == 0 && summary.failed_count > 0 {
        return Err(ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to enrich any cities.",
        ));
    }

    let status = if summary.failed_count == 0 {
        StatusCode::OK
    } else {
        StatusCode::MULTI_STATUS
    };
    Ok((
        status,
        Json(EnrichResponse {
            message: "Coordinates and weather enrichment completed.".to_string(),
            summary,
        }),
    ))
}

/// Add one city and enrich it.
///
/// The bare record is stored before enrichment starts, so a concurrent add of the
/// same name answers `new: false, enriched: false` while the first one is pending.
/// If that enrichment fails the record is rolled back. Enrichment and its
/// write-back run detached and finish even when the request is dropped.
async fn add_city(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AddCityResponse>)> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let city_name = body
        .get("city_name")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("Missing 'city_name' in request body"))?;

    let (added, total, enriched) = {
        let mut store = state.store.write().await;
        let added = store.add_one(city_name)?;
        let enriched = store.get(city_name).is_some_and(CityRecord::is_enriched);
        (added, store.len(), enriched)
    };

    if !added {
        return Ok((
            StatusCode::OK,
            Json(AddCityResponse {
                message: format!("City '{city_name}' already exists."),
                total_cities: total,
                new: false,
                enriched,
            }),
        ));
    }

    let store = Arc::clone(&state.store);
    let pipeline = Arc::clone(&state.pipeline);
    let key = normalize_name(city_name);
    let enrichment = tokio::spawn(async move {
        let result = pipeline.enrich_one(&key).await;
        let mut store = store.write().await;
        if !result.is_success() {
            if let Err(e) = store.remove(&key) {
                warn!("Rollback of '{}' found nothing to remove: {}", key, e);
            }
            return Ok::<_, CityWeatherError>(None);
        }
        store.apply_enrichment_to_one(&result)?;
        Ok(Some(store.len()))
    });

    let Some(total) = enrichment.await.map_err(task_failed)?? else {
        return Err(ApiError::new(
            StatusCode::FAILED_DEPENDENCY,
            format!("Failed to enrich city '{city_name}'. City was not saved."),
        ));
    };

    Ok((
        StatusCode::CREATED,
        Json(AddCityResponse {
            message: format!("City '{city_name}' added and enriched successfully."),
            total_cities: total,
            new: true,
            enriched: true,
        }),
    ))
}

fn task_failed(err: JoinError) -> ApiError {
    error!("Enrichment task failed: {}", err);
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Enrichment task failed.")
}

async fn closest_city(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<NearestCity>> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let (Some(lat), Some(lon)) = (body.get("lat"), body.get("lon")) else {
        return Err(ApiError::bad_request("Missing 'lat' or 'lon' in request body"));
    };
    let query = geo::parse_coordinates(lat, lon)
        .ok_or_else(|| ApiError::bad_request("Invalid 'lon' or 'lat' value"))?;

    let nearest = find_closest_city(
        &state.store,
        query,
        Some(state.pipeline.weather_resolver()),
    )
    .await?;
    Ok(Json(nearest))
}

async fn delete_city(
    State(state): State<AppState>,
    Path(city_name): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.write().await;
    if store.is_empty() {
        return Err(CityWeatherError::state("No cities loaded").into());
    }
    store.remove(&city_name)?;

    Ok(Json(json!({
        "message": format!("City '{city_name}' removed successfully."),
        "total_cities": store.len(),
    })))
}

async fn get_all_cities(State(state): State<AppState>) -> ApiResult<Json<CitiesResponse>> {
    let store = state.store.read().await;
    let cities: Vec<CityRow> = store.list()?.iter().map(CityRow::from).collect();
    Ok(Json(CitiesResponse {
        count: cities.len(),
        cities,
    }))
}

async fn export_cities(State(state): State<AppState>) -> ApiResult<Response> {
    let store = state.store.read().await;
    let records = store
        .list()
        .map_err(|_| ApiError::new(StatusCode::NOT_FOUND, "No data available to export"))?;
    let csv = csv_io::write_city_rows(records)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"cities.csv\""),
        ],
        csv,
    )
        .into_response())
}
