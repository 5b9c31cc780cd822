// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use serde::{Deserialize, Serialize};

use crate::storage::DEFAULT_SENSOR_ID;

/// SQLite reading store location and the sensor the readings belong to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_sensor_id")]
    pub sensor_id: String,
}

fn default_database_path() -> String {
    "sensor_readings.db".to_string()
}

fn default_sensor_id() -> String {
    DEFAULT_SENSOR_ID.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            sensor_id: default_sensor_id(),
        }
    }
}
