// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Temperature time-series endpoints
//!
//! Query parameters are collected as plain strings and handed to the
//! validator, so malformed values degrade to defaults instead of 4xx errors.

use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, State};
use rocket_okapi::openapi;
use serde_json::{Map, Value};

use super::error::{api_error, ApiError};
use crate::timeseries::service::{
    StatsResponse, TemperatureResponse, TemperatureService, DEFAULT_RECENT_LIMIT,
};
use crate::timeseries::validation::parse_limit;

/// Rebuild the raw query object from the optional string parameters.
fn raw_query(pairs: &[(&str, Option<String>)]) -> Value {
    let map: Map<String, Value> = pairs
        .iter()
        .filter_map(|(key, value)| {
            value
                .as_ref()
                .map(|value| (key.to_string(), Value::String(value.clone())))
        })
        .collect();
    Value::Object(map)
}

/// Get temperature readings
///
/// **Endpoint:** `GET /api/temperatures`
///
/// Either `from` and `to` (ISO-8601) or a `timescale` token
/// (`1h`, `6h`, `1d`, `7d`, `30d` and long forms) select the window; the
/// default is the last hour. `aggregation` is one of `raw` (default),
/// `1min`, `5min`, `15min`, `1hour`. `limit` caps the number of raw readings
/// fetched (1 to 10000, default 1000); the most recent ones are kept.
#[openapi(tag = "Temperatures")]
#[get("/api/temperatures?<from>&<to>&<timescale>&<aggregation>&<limit>")]
pub async fn get_temperatures(
    service: &State<TemperatureService>,
    from: Option<String>,
    to: Option<String>,
    timescale: Option<String>,
    aggregation: Option<String>,
    limit: Option<String>,
) -> Result<Json<TemperatureResponse>, ApiError> {
    let params = raw_query(&[
        ("from", from),
        ("to", to),
        ("timescale", timescale),
        ("aggregation", aggregation),
        ("limit", limit),
    ]);

    service
        .get_temperature_data(&params)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Temperature data query failed: {e}");
            api_error(
                Status::InternalServerError,
                "Failed to fetch temperature data from database",
            )
        })
}

/// Get temperature statistics
///
/// **Endpoint:** `GET /api/temperatures/stats`
///
/// Count, mean, min, max, population standard deviation, range and the
/// first/last reading timestamps over the selected window. An empty window
/// yields zeros and the window bounds as first/last reading.
#[openapi(tag = "Temperatures")]
#[get("/api/temperatures/stats?<from>&<to>&<timescale>")]
pub async fn get_temperature_stats(
    service: &State<TemperatureService>,
    from: Option<String>,
    to: Option<String>,
    timescale: Option<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    let params = raw_query(&[("from", from), ("to", to), ("timescale", timescale)]);

    service
        .get_temperature_stats(&params)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Temperature statistics query failed: {e}");
            api_error(
                Status::InternalServerError,
                "Failed to fetch temperature statistics from database",
            )
        })
}

/// Get the most recent readings
///
/// **Endpoint:** `GET /api/temperatures/recent`
///
/// Latest `limit` readings (default 100) in chronological order.
#[openapi(tag = "Temperatures")]
#[get("/api/temperatures/recent?<limit>")]
pub async fn get_recent_temperatures(
    service: &State<TemperatureService>,
    limit: Option<String>,
) -> Result<Json<TemperatureResponse>, ApiError> {
    let limit = parse_limit(limit.as_deref(), DEFAULT_RECENT_LIMIT);

    service
        .get_recent_temperatures(limit)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Recent temperature query failed: {e}");
            api_error(
                Status::InternalServerError,
                "Failed to fetch recent temperature data from database",
            )
        })
}
