// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{get, State};
use rocket_okapi::openapi;
use rocket_okapi::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ApiSettings;
use crate::sensor::SensorController;
use crate::timeseries::service::TemperatureService;
use crate::timeseries::types::format_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServicesHealth {
    pub database: String,
    pub sensor_control: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub timestamp: String,
    pub services: ServicesHealth,
}

fn connectivity(ok: bool) -> String {
    if ok { "connected" } else { "disconnected" }.to_string()
}

/// Liveness probe
///
/// **Endpoint:** `GET /health`
///
/// Always 200 while the process serves requests; `services` reports whether
/// the database and the sensor currently answer.
#[openapi(tag = "Health")]
#[get("/health")]
pub async fn health(
    settings: &State<ApiSettings>,
    service: &State<TemperatureService>,
    controller: &State<SensorController>,
) -> Json<HealthResponse> {
    let database = service.store().test_connection().await;
    let sensor = controller.client().test_connection().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        service: settings.service_name.clone(),
        timestamp: format_timestamp(&Utc::now()),
        services: ServicesHealth {
            database: connectivity(database),
            sensor_control: connectivity(sensor),
        },
    })
}
