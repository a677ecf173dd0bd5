//! REST API endpoints.
//!
//! Every JSON endpoint wraps its payload in the response envelope
//! `{success, data?, message?, error?, timestamp}` with `timestamp` as
//! server time in epoch milliseconds. Errors use the same envelope with
//! `success: false`: bad arguments map to 400, unknown sensors to 404 and
//! store failures to 500.
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use dhtnet_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use time::macros::format_description;

use dhtnet_core::{
    HistorySelector, QueryError, format_statistics, get_history as run_history_query, overview,
    sensor_dashboard,
};
use dhtnet_types::AnnotatedReading;

use crate::state::AppState;

/// Default row cap for history requests that do not specify one.
const DEFAULT_HISTORY_LIMIT: u32 = 100;
/// Default row cap for exports; matches the store-side scan ceiling.
const DEFAULT_EXPORT_LIMIT: u32 = 1000;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/sensors", get(list_sensors))
        .route("/api/sensors/health", get(health))
        .route("/api/sensors/dashboard/overview", get(get_overview))
        .route("/api/sensors/{id}/current", get(get_current))
        .route("/api/sensors/{id}/history", get(get_sensor_history))
        .route("/api/sensors/{id}/statistics", get(get_statistics))
        .route("/api/sensors/{id}/dashboard", get(get_dashboard))
        .route("/api/sensors/{id}/export", get(export_history))
        .route("/api/devices", get(list_devices))
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// The response envelope every JSON endpoint uses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server time in epoch milliseconds.
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
            timestamp: now_ms(),
        })
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::InvalidArgument(msg) => AppError::BadRequest(msg),
            QueryError::NotFound(id) => AppError::NotFound(format!("sensor '{id}' not found")),
            QueryError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

impl From<dhtnet_store::Error> for AppError {
    fn from(e: dhtnet_store::Error) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ApiResponse::<serde_json::Value> {
            success: false,
            data: None,
            message: None,
            error: Some(message),
            timestamp: now_ms(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
async fn health() -> Json<ApiResponse<serde_json::Value>> {
    ApiResponse::ok(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Latest reading of every active sensor, keyed by sensor id.
async fn list_sensors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let sensors = overview(&state.store).await?;
    Ok(ApiResponse::ok(json!({
        "count": sensors.len(),
        "sensors": sensors,
    })))
}

/// Latest reading for one sensor, annotated with the timestamp verdict.
async fn get_current(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnnotatedReading>>, AppError> {
    match state.store.get_current(&id).await? {
        Some(reading) => Ok(ApiResponse::ok(AnnotatedReading::new(None, reading))),
        None => Err(AppError::NotFound(format!(
            "no current reading for sensor '{id}'"
        ))),
    }
}

/// Query parameters accepted by the history and export endpoints.
///
/// Either an epoch-millisecond window (`startTime`/`endTime`), a calendar
/// window (`startDate`/`endDate`, both required, `YYYY-MM-DD` UTC), or
/// neither (latest readings).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryParams {
    start_time: Option<i64>,
    end_time: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<u32>,
}

fn parse_date(field: &str, value: &str) -> Result<time::Date, AppError> {
    let format = format_description!("[year]-[month]-[day]");
    time::Date::parse(value, &format)
        .map_err(|_| AppError::BadRequest(format!("invalid {field} '{value}': expected YYYY-MM-DD")))
}

fn selector_from(params: &HistoryParams, default_limit: u32) -> Result<HistorySelector, AppError> {
    match (&params.start_date, &params.end_date) {
        (Some(start), Some(end)) => Ok(HistorySelector::DateRange {
            start: parse_date("startDate", start)?,
            end: parse_date("endDate", end)?,
        }),
        (None, None) => {
            let limit = params.limit.unwrap_or(default_limit);
            if params.start_time.is_none() && params.end_time.is_none() {
                Ok(HistorySelector::Latest { limit })
            } else {
                Ok(HistorySelector::Range {
                    start_ms: params.start_time,
                    end_ms: params.end_time,
                    limit,
                })
            }
        }
        _ => Err(AppError::BadRequest(
            "startDate and endDate must be provided together".to_string(),
        )),
    }
}

/// Historical readings for one sensor.
async fn get_sensor_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    // The rejection is mapped by hand so a malformed query string still
    // answers in the response envelope.
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let selector = selector_from(&params, DEFAULT_HISTORY_LIMIT)?;
    let readings = run_history_query(&state.store, &id, selector).await?;
    Ok(ApiResponse::ok(json!({
        "count": readings.len(),
        "readings": readings,
    })))
}

/// Firmware statistics for one sensor, with formatted renderings attached.
async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<dhtnet_core::FormattedStatistics>>, AppError> {
    match state.store.get_statistics(&id).await? {
        Some(stats) => Ok(ApiResponse::ok(format_statistics(stats))),
        None => Err(AppError::NotFound(format!(
            "no statistics for sensor '{id}'"
        ))),
    }
}

/// Aggregated dashboard for one sensor.
async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<dhtnet_core::SensorDashboard>>, AppError> {
    let dashboard = sensor_dashboard(&state.store, &id).await?;
    Ok(ApiResponse::ok(dashboard))
}

/// Composed fleet overview: every sensor's current snapshot plus a total.
async fn get_overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let sensors = overview(&state.store).await?;
    Ok(ApiResponse::ok(json!({
        "totalSensors": sensors.len(),
        "sensors": sensors,
    })))
}

/// List registered actuators.
async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let devices = state.store.list_devices().await?;
    Ok(ApiResponse::ok(json!({
        "count": devices.len(),
        "devices": devices,
    })))
}

// Not flattened over HistoryParams: query-string deserialization cannot
// see through serde(flatten) for numeric fields.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportParams {
    format: Option<String>,
    start_time: Option<i64>,
    end_time: Option<i64>,
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<u32>,
}

impl ExportParams {
    fn history(&self) -> HistoryParams {
        HistoryParams {
            start_time: self.start_time,
            end_time: self.end_time,
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            limit: self.limit,
        }
    }
}

const CSV_HEADER: &str =
    "ID,Temperature (°C),Humidity (%),Timestamp,Reading Number,Formatted Time\n";

fn render_csv(readings: &[AnnotatedReading]) -> Result<String, AppError> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::NonNumeric)
        .has_headers(false)
        .from_writer(Vec::new());

    for annotated in readings {
        writer
            .write_record(&[
                annotated.id.clone().unwrap_or_default(),
                annotated.reading.temperature.to_string(),
                annotated.reading.humidity.to_string(),
                annotated.reading.timestamp.to_string(),
                annotated.reading.reading_number.to_string(),
                annotated.formatted_time.clone(),
            ])
            .map_err(|e| AppError::Internal(e.to_string()))?;
    }

    let rows = writer
        .into_inner()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let rows = String::from_utf8(rows).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(format!("{CSV_HEADER}{rows}"))
}

/// Export a sensor's history as JSON or CSV.
async fn export_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let format = params.format.as_deref().unwrap_or("json");
    if format != "json" && format != "csv" {
        return Err(AppError::BadRequest(format!(
            "unsupported export format '{format}': expected 'json' or 'csv'"
        )));
    }

    let selector = selector_from(&params.history(), DEFAULT_EXPORT_LIMIT)?;
    let readings = run_history_query(&state.store, &id, selector).await?;

    let date_format = format_description!("[year]-[month]-[day]");
    let today = OffsetDateTime::now_utc()
        .date()
        .format(&date_format)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if format == "csv" {
        let body = render_csv(&readings)?;
        let headers = [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"sensor_{id}_{today}.csv\""),
            ),
        ];
        return Ok((headers, body).into_response());
    }

    let exported_at = now_ms();
    Ok(ApiResponse::ok(json!({
        "exportInfo": {
            "sensorId": id,
            "format": "json",
            "exportedAt": exported_at,
            "recordCount": readings.len(),
        },
        "readings": readings,
    }))
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use dhtnet_store::MemoryStore;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn reading_json(ts: i64) -> serde_json::Value {
        json!({
            "temperature": 21.5,
            "humidity": 48.0,
            "timestamp": ts,
            "reading_number": 3
        })
    }

    fn create_test_state() -> Arc<AppState> {
        let memory = MemoryStore::new();
        memory.put("sensor1/current", reading_json(1_700_000_100));
        memory.put("sensor1/history/k1", reading_json(1_700_000_000));
        memory.put("sensor1/history/k2", reading_json(1_700_000_050_000));
        memory.put("sensor1/history/k3", reading_json(42_000));
        memory.put(
            "sensor1/statistics",
            json!({
                "min_temperature": 18.0,
                "max_temperature": 28.0,
                "avg_temperature": 22.0,
                "min_humidity": 30.0,
                "max_humidity": 60.0,
                "avg_humidity": 45.0,
                "total_readings": 3,
                "session_duration": 3_661_000,
                "last_update": 1_700_000_100
            }),
        );
        memory.put(
            "devices/dev-1",
            json!({
                "id": "dev-1",
                "name": "Greenhouse fan",
                "type": "fan",
                "status": "on",
                "sensor_id": "sensor1"
            }),
        );
        AppState::new(Arc::new(memory))
    }

    async fn get_response(uri: &str) -> axum::response::Response {
        let app = router().with_state(create_test_state());
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = get_response("/api/sensors/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["timestamp"].is_i64());
    }

    #[tokio::test]
    async fn lists_sensors_with_current_readings() {
        let response = get_response("/api/sensors").await;
        let json = body_json(response).await;
        assert_eq!(json["data"]["count"], 1);
        assert_eq!(json["data"]["sensors"]["sensor1"]["temperature"], 21.5);
        assert_eq!(json["data"]["sensors"]["sensor1"]["valid"], true);
    }

    #[tokio::test]
    async fn current_is_annotated() {
        let response = get_response("/api/sensors/sensor1/current").await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["temperature"], 21.5);
        assert_eq!(json["data"]["valid"], true);
        assert_eq!(json["data"]["classification"], "seconds");
        assert!(json["data"]["formattedTime"].as_str().unwrap().contains("UTC"));
    }

    #[tokio::test]
    async fn unknown_sensor_is_404_with_envelope() {
        let response = get_response("/api/sensors/ghost/current").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("ghost"));
    }

    #[tokio::test]
    async fn history_latest_flags_bad_clocks() {
        let response = get_response("/api/sensors/sensor1/history").await;
        let json = body_json(response).await;

        assert_eq!(json["data"]["count"], 3);
        let readings = json["data"]["readings"].as_array().unwrap();
        // Non-canonical record sorts first and never renders as 1970.
        assert_eq!(readings[0]["valid"], false);
        assert!(!readings[0]["formattedTime"].as_str().unwrap().contains("1970"));
        assert_eq!(readings[1]["canonicalMs"], 1_700_000_000_000_i64);
    }

    #[tokio::test]
    async fn history_range_spans_both_encodings() {
        let response = get_response(
            "/api/sensors/sensor1/history?startTime=1699999000000&endTime=1700001000000",
        )
        .await;
        let json = body_json(response).await;
        // k1 (seconds) and k2 (millis) fall in the window; k3 is uptime and
        // stays flagged.
        assert_eq!(json["data"]["count"], 2);
    }

    #[tokio::test]
    async fn malformed_query_params_keep_the_envelope() {
        for uri in [
            "/api/sensors/sensor1/history?limit=abc",
            "/api/sensors/sensor1/history?startTime=yesterday",
            "/api/sensors/sensor1/export?limit=abc",
        ] {
            let response = get_response(uri).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let json = body_json(response).await;
            assert_eq!(json["success"], false);
            assert!(json["error"].is_string());
            assert!(json["timestamp"].is_i64());
        }
    }

    #[tokio::test]
    async fn history_zero_limit_is_400() {
        let response = get_response("/api/sensors/sensor1/history?limit=0").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn history_date_range_validates_pairing() {
        let response = get_response("/api/sensors/sensor1/history?startDate=2023-11-14").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_response("/api/sensors/sensor1/history?startDate=bogus&endDate=2023-11-14").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get_response(
            "/api/sensors/sensor1/history?startDate=2023-11-14&endDate=2023-11-14",
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        // Both the seconds- and the millis-encoded reading land on that day.
        assert_eq!(json["data"]["count"], 2);
    }

    #[tokio::test]
    async fn statistics_carry_formatted_fields() {
        let response = get_response("/api/sensors/sensor1/statistics").await;
        let json = body_json(response).await;

        assert_eq!(json["data"]["sessionDurationFormatted"], "1h 1m 1s");
        assert_eq!(json["data"]["lastUpdateValid"], true);
        assert_eq!(json["data"]["total_readings"], 3);
    }

    #[tokio::test]
    async fn dashboard_assembles_fields() {
        let response = get_response("/api/sensors/sensor1/dashboard").await;
        let json = body_json(response).await;

        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["current"]["temperature"], 21.5);
        assert!(json["data"]["statistics"]["lastUpdateFormatted"].is_string());
        assert_eq!(json["data"]["history"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn overview_maps_fleet() {
        let response = get_response("/api/sensors/dashboard/overview").await;
        let json = body_json(response).await;

        assert_eq!(json["data"]["totalSensors"], 1);
        assert_eq!(json["data"]["sensors"]["sensor1"]["temperature"], 21.5);
    }

    #[tokio::test]
    async fn devices_are_listed() {
        let response = get_response("/api/devices").await;
        let json = body_json(response).await;

        assert_eq!(json["data"]["count"], 1);
        assert_eq!(json["data"]["devices"][0]["type"], "fan");
    }

    #[tokio::test]
    async fn csv_export_sets_headers_and_quotes_strings() {
        let response = get_response("/api/sensors/sensor1/export?format=csv").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/csv")
        );
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"sensor_sensor1_"));

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = body.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ID,Temperature (°C),Humidity (%),Timestamp,Reading Number,Formatted Time"
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("\"k3\""));
        assert!(first.contains("21.5"));
    }

    #[tokio::test]
    async fn json_export_carries_export_info() {
        let response = get_response("/api/sensors/sensor1/export").await;
        let json = body_json(response).await;

        assert_eq!(json["data"]["exportInfo"]["format"], "json");
        assert_eq!(json["data"]["exportInfo"]["recordCount"], 3);
        assert_eq!(json["data"]["readings"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_export_format_is_400() {
        let response = get_response("/api/sensors/sensor1/export?format=xml").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
