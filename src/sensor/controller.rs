// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use log::{error, info};
use rocket_okapi::JsonSchema;
use serde::{Deserialize, Serialize};

use super::client::SensorClient;
use super::health::ConnectionHealth;
use super::SensorError;
use crate::modbus::simulation::BASE_TEMPERATURE;
use crate::modbus::{AMPLITUDE_REGISTER, PERIOD_REGISTER, RUNNING_REGISTER};
use crate::timeseries::types::format_timestamp;
use crate::timeseries::validation::ControlParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorConnection {
    pub is_connected: bool,
    pub last_failure_time: Option<String>,
    pub last_failure_message: Option<String>,
}

impl From<&ConnectionHealth> for SensorConnection {
    fn from(health: &ConnectionHealth) -> Self {
        Self {
            is_connected: health.is_connected,
            last_failure_time: health.last_failure_time.as_ref().map(format_timestamp),
            last_failure_message: health.last_failure_message.clone(),
        }
    }
}

/// Body of `GET /sensor/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SensorStatus {
    pub period: u16,
    pub amplitude: u16,
    pub running: bool,
    pub base_temperature: f64,
    pub timestamp: String,
    pub sensor_connection: SensorConnection,
}

/// Front-end to the sensor used by the HTTP layer.
///
/// Owns the connection health. Only [`SensorController::status`] updates it.
pub struct SensorController {
    client: Arc<SensorClient>,
    health: Mutex<ConnectionHealth>,
}

impl SensorController {
    pub fn new(client: Arc<SensorClient>) -> Self {
        Self {
            client,
            health: Mutex::new(ConnectionHealth::default()),
        }
    }

    pub fn client(&self) -> &Arc<SensorClient> {
        &self.client
    }

    /// Current health snapshot
    pub fn health(&self) -> ConnectionHealth {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Read the sensor settings and record the outcome.
    ///
    /// Never fails: an unreachable sensor yields a fallback body with zeroed
    /// settings and the failure recorded in `sensorConnection`.
    pub async fn status(&self) -> SensorStatus {
        let result = self.client.read_status().await;
        let now = Utc::now();

        let health = {
            let mut health = self.health.lock().unwrap_or_else(PoisonError::into_inner);
            match &result {
                Ok(_) => health.record_success(),
                Err(e) => {
                    error!("Error getting sensor status: {e}");
                    health.record_failure(now, e.to_string());
                }
            }
            SensorConnection::from(&*health)
        };

        match result {
            Ok(readout) => SensorStatus {
                period: readout.period,
                amplitude: readout.amplitude,
                running: readout.running,
                base_temperature: readout.base_temperature,
                timestamp: format_timestamp(&now),
                sensor_connection: health,
            },
            Err(_) => SensorStatus {
                period: 0,
                amplitude: 0,
                running: false,
                base_temperature: BASE_TEMPERATURE,
                timestamp: format_timestamp(&now),
                sensor_connection: health,
            },
        }
    }

    /// Write the validated control parameters to the sensor registers.
    pub async fn control(&self, params: &ControlParams) -> Result<(), SensorError> {
        if params.is_empty() {
            return Err(SensorError::NoValidParameters);
        }

        if let Some(period) = params.period {
            self.client.write_register(PERIOD_REGISTER, period).await?;
        }
        if let Some(amplitude) = params.amplitude {
            self.client.write_register(AMPLITUDE_REGISTER, amplitude).await?;
        }
        if let Some(status) = params.status {
            self.client
                .write_register(RUNNING_REGISTER, u16::from(status))
                .await?;
        }

        info!("Control commands sent: {params:?}");
        Ok(())
    }
}
