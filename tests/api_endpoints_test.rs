// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP API tests through Rocket's local client
//!
//! The reading store is an in-memory SQLite database seeded with fixed
//! timestamps; the sensor is either a simulator on an ephemeral port or a
//! port nothing listens on.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rocket::config::LogLevel;
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use rust_sensor_monitor::modbus::{self, SharedSensor, SimulatedSensor};
use rust_sensor_monitor::sensor::{SensorClient, SensorController};
use rust_sensor_monitor::storage::{
    ReadingStore, SqliteReadingStore, StorageError, DEFAULT_SENSOR_ID,
};
use rust_sensor_monitor::timeseries::service::TemperatureService;
use rust_sensor_monitor::timeseries::{Reading, StatsSummary, TimeRange};
use rust_sensor_monitor::visualization::{build_rocket, ApiSettings};

const FROM: &str = "2025-01-01T00:00:00.000Z";
const TO: &str = "2025-01-01T01:00:00.000Z";

fn at(instant: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(instant)
        .unwrap()
        .with_timezone(&Utc)
}

/// Store holding three readings in the first two minutes of 2025
async fn seeded_store() -> Arc<dyn ReadingStore> {
    let store = SqliteReadingStore::open_in_memory(DEFAULT_SENSOR_ID).unwrap();
    store.initialize_default_sensor().await.unwrap();
    for (instant, value) in [
        ("2025-01-01T00:00:30Z", 10.0),
        ("2025-01-01T00:00:45Z", 20.0),
        ("2025-01-01T00:01:10Z", 30.0),
    ] {
        store
            .insert_reading(Reading::new(at(instant), value))
            .await
            .unwrap();
    }
    Arc::new(store)
}

/// Store whose every query fails
struct BrokenStore;

#[async_trait]
impl ReadingStore for BrokenStore {
    async fn insert_reading(&self, _reading: Reading) -> Result<(), StorageError> {
        Err(StorageError::InvalidTimestamp(-1))
    }

    async fn get_readings(
        &self,
        _range: &TimeRange,
        _limit: usize,
    ) -> Result<Vec<Reading>, StorageError> {
        Err(StorageError::InvalidTimestamp(-1))
    }

    async fn get_recent_readings(&self, _limit: usize) -> Result<Vec<Reading>, StorageError> {
        Err(StorageError::InvalidTimestamp(-1))
    }

    async fn get_stats(&self, _range: &TimeRange) -> Result<StatsSummary, StorageError> {
        Err(StorageError::InvalidTimestamp(-1))
    }

    async fn test_connection(&self) -> bool {
        false
    }
}

async fn start_sensor(sensor: SharedSensor) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(modbus::serve(listener, sensor));
    addr
}

/// Address on which nothing listens
async fn dead_sensor() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

async fn client_for(store: Arc<dyn ReadingStore>, sensor_addr: SocketAddr) -> Client {
    let figment = rocket::Config::figment()
        .merge(("port", 0))
        .merge(("log_level", LogLevel::Off));
    let controller = SensorController::new(Arc::new(SensorClient::new(
        sensor_addr,
        1,
        Duration::from_millis(500),
    )));
    let rocket = build_rocket(
        figment,
        TemperatureService::new(store),
        controller,
        ApiSettings {
            service_name: "test-monitor".to_string(),
        },
        "*",
    );
    Client::tracked(rocket)
        .await
        .expect("valid rocket instance")
}

async fn get_json(client: &Client, uri: &str) -> (Status, Value) {
    let response = client.get(uri.to_string()).dispatch().await;
    let status = response.status();
    let body = response.into_json::<Value>().await.expect("JSON body");
    (status, body)
}

#[rocket::async_test]
async fn test_raw_readings_in_explicit_range() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, &format!("/api/temperatures?from={FROM}&to={TO}")).await;

    assert_eq!(status, Status::Ok);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["timestamp"], "2025-01-01T00:00:30.000Z");
    assert_eq!(data[0]["value"], 10.0);
    assert_eq!(data[2]["value"], 30.0);
    assert_eq!(body["meta"]["from"], FROM);
    assert_eq!(body["meta"]["to"], TO);
    assert_eq!(body["meta"]["timescale"], "custom");
    assert_eq!(body["meta"]["aggregation"], "raw");
    assert_eq!(body["meta"]["totalPoints"], 3);
    assert_eq!(body["meta"]["aggregatedPoints"], 3);
}

#[rocket::async_test]
async fn test_minute_buckets() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(
        &client,
        &format!("/api/temperatures?from={FROM}&to={TO}&aggregation=1min"),
    )
    .await;

    assert_eq!(status, Status::Ok);
    assert_eq!(
        body["data"],
        json!([
            { "timestamp": "2025-01-01T00:00:00.000Z", "value": 15.0 },
            { "timestamp": "2025-01-01T00:01:00.000Z", "value": 30.0 },
        ])
    );
    assert_eq!(body["meta"]["aggregation"], "1min");
    assert_eq!(body["meta"]["totalPoints"], 3);
    assert_eq!(body["meta"]["aggregatedPoints"], 2);
}

#[rocket::async_test]
async fn test_limit_keeps_most_recent_readings() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(
        &client,
        &format!("/api/temperatures?from={FROM}&to={TO}&limit=2"),
    )
    .await;

    assert_eq!(status, Status::Ok);
    let values: Vec<f64> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|point| point["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![20.0, 30.0]);
}

#[rocket::async_test]
async fn test_timescale_window_excludes_old_readings() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, "/api/temperatures?timescale=1h").await;

    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["meta"]["timescale"], "1h");
    assert_eq!(body["meta"]["totalPoints"], 0);
}

#[rocket::async_test]
async fn test_stats_over_explicit_range() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) =
        get_json(&client, &format!("/api/temperatures/stats?from={FROM}&to={TO}")).await;

    assert_eq!(status, Status::Ok);
    let stats = &body["stats"];
    assert_eq!(stats["totalReadings"], 3);
    assert_relative_eq!(stats["averageTemperature"].as_f64().unwrap(), 20.0);
    assert_relative_eq!(stats["minTemperature"].as_f64().unwrap(), 10.0);
    assert_relative_eq!(stats["maxTemperature"].as_f64().unwrap(), 30.0);
    assert_relative_eq!(stats["temperatureRange"].as_f64().unwrap(), 20.0);
    assert_relative_eq!(
        stats["standardDeviation"].as_f64().unwrap(),
        8.16496580927726,
        epsilon = 1e-9
    );
    assert_eq!(stats["firstReading"], "2025-01-01T00:00:30.000Z");
    assert_eq!(stats["lastReading"], "2025-01-01T00:01:10.000Z");
    assert_eq!(body["meta"]["timescale"], "custom");
}

#[rocket::async_test]
async fn test_stats_of_empty_range_fall_back_to_bounds() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(
        &client,
        "/api/temperatures/stats?from=2024-01-01T00:00:00.000Z&to=2024-01-02T00:00:00.000Z",
    )
    .await;

    assert_eq!(status, Status::Ok);
    let stats = &body["stats"];
    assert_eq!(stats["totalReadings"], 0);
    assert_eq!(stats["averageTemperature"], 0.0);
    assert_eq!(stats["standardDeviation"], 0.0);
    assert_eq!(stats["firstReading"], "2024-01-01T00:00:00.000Z");
    assert_eq!(stats["lastReading"], "2024-01-02T00:00:00.000Z");
}

#[rocket::async_test]
async fn test_recent_readings_are_chronological() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, "/api/temperatures/recent?limit=2").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"][0]["value"], 20.0);
    assert_eq!(body["data"][1]["value"], 30.0);
    assert_eq!(body["meta"]["timescale"], "recent");
    assert_eq!(body["meta"]["from"], "2025-01-01T00:00:45.000Z");
    assert_eq!(body["meta"]["to"], "2025-01-01T00:01:10.000Z");

    // Invalid limits fall back to the default
    let (status, body) = get_json(&client, "/api/temperatures/recent?limit=abc").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[rocket::async_test]
async fn test_store_failure_returns_error_envelope() {
    let client = client_for(Arc::new(BrokenStore), dead_sensor().await).await;

    let (status, body) = get_json(&client, "/api/temperatures?timescale=6h").await;
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(
        body,
        json!({ "success": false, "error": "Failed to fetch temperature data from database" })
    );

    let (status, body) = get_json(&client, "/api/temperatures/stats").await;
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(
        body["error"],
        "Failed to fetch temperature statistics from database"
    );

    let (status, body) = get_json(&client, "/api/temperatures/recent").await;
    assert_eq!(status, Status::InternalServerError);
    assert_eq!(
        body["error"],
        "Failed to fetch recent temperature data from database"
    );
}

#[rocket::async_test]
async fn test_unknown_route_returns_json_404() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, "/api/nope").await;
    assert_eq!(status, Status::NotFound);
    assert_eq!(
        body,
        json!({ "success": false, "error": "Route /api/nope not found" })
    );
}

#[rocket::async_test]
async fn test_cors_headers_and_preflight() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let response = client.get("/api/temperatures/recent").dispatch().await;
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Origin"),
        Some("*")
    );

    let response = client.options("/sensor/control").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    assert!(response
        .headers()
        .get_one("Access-Control-Allow-Methods")
        .unwrap()
        .contains("POST"));
}

#[rocket::async_test]
async fn test_sensor_status_when_sensor_is_up() {
    let sensor_addr = start_sensor(SimulatedSensor::new(1500, 7).shared()).await;
    let client = client_for(seeded_store().await, sensor_addr).await;

    let (status, body) = get_json(&client, "/sensor/status").await;

    assert_eq!(status, Status::Ok);
    assert_eq!(body["period"], 1500);
    assert_eq!(body["amplitude"], 7);
    assert_eq!(body["running"], true);
    assert_eq!(body["baseTemperature"], 25.0);
    assert_eq!(body["sensorConnection"]["isConnected"], true);
    assert_eq!(body["sensorConnection"]["lastFailureTime"], Value::Null);
}

#[rocket::async_test]
async fn test_sensor_status_when_sensor_is_down() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, "/sensor/status").await;

    assert_eq!(status, Status::Ok);
    assert_eq!(body["period"], 0);
    assert_eq!(body["amplitude"], 0);
    assert_eq!(body["running"], false);
    assert_eq!(body["baseTemperature"], 25.0);
    assert_eq!(body["sensorConnection"]["isConnected"], false);
    assert!(body["sensorConnection"]["lastFailureTime"].is_string());
    assert!(body["sensorConnection"]["lastFailureMessage"].is_string());
}

#[rocket::async_test]
async fn test_sensor_control_writes_registers() {
    let sensor = SimulatedSensor::default().shared();
    let sensor_addr = start_sensor(sensor.clone()).await;
    let client = client_for(seeded_store().await, sensor_addr).await;

    let response = client
        .post("/sensor/control")
        .header(ContentType::JSON)
        .body(r#"{"period": 2000, "amplitude": 99, "status": false}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::Ok);
    let body = response.into_json::<Value>().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": true, "message": "Control commands sent successfully" })
    );

    // amplitude 99 is out of range and dropped before reaching the sensor
    let state = sensor.lock().unwrap().clone();
    assert_eq!(state.period(), 2000);
    assert_eq!(state.amplitude(), 10);
    assert!(!state.is_running());
}

#[rocket::async_test]
async fn test_sensor_control_without_valid_parameter() {
    let sensor_addr = start_sensor(SimulatedSensor::default().shared()).await;
    let client = client_for(seeded_store().await, sensor_addr).await;

    let response = client
        .post("/sensor/control")
        .header(ContentType::JSON)
        .body(r#"{"period": 5, "unknown": 1}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = response.into_json::<Value>().await.unwrap();
    assert_eq!(
        body,
        json!({ "success": false, "error": "No valid control parameters provided" })
    );
}

#[rocket::async_test]
async fn test_sensor_control_when_sensor_is_down() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let response = client
        .post("/sensor/control")
        .header(ContentType::JSON)
        .body(r#"{"status": "true"}"#)
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::InternalServerError);
    let body = response.into_json::<Value>().await.unwrap();
    assert_eq!(body["error"], "Failed to control sensor");
}

#[rocket::async_test]
async fn test_malformed_control_body() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let response = client
        .post("/sensor/control")
        .header(ContentType::JSON)
        .body("{ not json")
        .dispatch()
        .await;

    assert_eq!(response.status(), Status::BadRequest);
    let body = response.into_json::<Value>().await.unwrap();
    assert_eq!(body["success"], false);
}

#[rocket::async_test]
async fn test_health_reports_dependencies() {
    let sensor_addr = start_sensor(SimulatedSensor::default().shared()).await;
    let client = client_for(seeded_store().await, sensor_addr).await;

    let (status, body) = get_json(&client, "/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "test-monitor");
    assert_eq!(body["services"]["database"], "connected");
    assert_eq!(body["services"]["sensorControl"], "connected");

    let client = client_for(Arc::new(BrokenStore), dead_sensor().await).await;
    let (status, body) = get_json(&client, "/health").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["services"]["database"], "disconnected");
    assert_eq!(body["services"]["sensorControl"], "disconnected");
}

#[rocket::async_test]
async fn test_openapi_document_lists_routes() {
    let client = client_for(seeded_store().await, dead_sensor().await).await;

    let (status, body) = get_json(&client, "/openapi.json").await;
    assert_eq!(status, Status::Ok);
    let paths = body["paths"].as_object().unwrap();
    for path in [
        "/api/temperatures",
        "/api/temperatures/stats",
        "/api/temperatures/recent",
        "/sensor/status",
        "/sensor/control",
        "/health",
    ] {
        assert!(paths.contains_key(path), "missing {path}");
    }
}
