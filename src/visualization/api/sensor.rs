// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{get, post, State};
use rocket_okapi::openapi;
use rocket_okapi::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{api_error, ApiError};
use crate::sensor::{SensorController, SensorError, SensorStatus};
use crate::timeseries::validation::validate_control_params;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ControlResponse {
    pub success: bool,
    pub message: String,
}

/// Get sensor status
///
/// **Endpoint:** `GET /sensor/status`
///
/// Always answers 200. When the sensor cannot be read, the settings are
/// zeroed and `sensorConnection` carries the failure.
#[openapi(tag = "Sensor")]
#[get("/sensor/status")]
pub async fn get_sensor_status(controller: &State<SensorController>) -> Json<SensorStatus> {
    Json(controller.status().await)
}

/// Control the sensor
///
/// **Endpoint:** `POST /sensor/control`
///
/// Body fields are all optional: `period` (ms, 100 to 10000), `amplitude`
/// (°C, 0 to 50) and `status` (boolean or `"true"`). Out-of-range or mistyped
/// fields are ignored; a body with no usable field is rejected with 400.
#[openapi(tag = "Sensor")]
#[post("/sensor/control", format = "json", data = "<body>")]
pub async fn control_sensor(
    controller: &State<SensorController>,
    body: Json<Value>,
) -> Result<Json<ControlResponse>, ApiError> {
    let params = validate_control_params(&body);

    match controller.control(&params).await {
        Ok(()) => Ok(Json(ControlResponse {
            success: true,
            message: "Control commands sent successfully".to_string(),
        })),
        Err(e @ SensorError::NoValidParameters) => Err(api_error(Status::BadRequest, e.to_string())),
        Err(e) => {
            error!("Error controlling sensor: {e}");
            Err(api_error(Status::InternalServerError, "Failed to control sensor"))
        }
    }
}
