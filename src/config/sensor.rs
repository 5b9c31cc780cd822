// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Modbus TCP endpoint of the sensor polled by the collector and driven by
/// `/sensor/control`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Modbus unit identifier.
    #[serde(default = "default_slave_id")]
    pub slave_id: u8,

    /// Per-request timeout, connection included.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5020
}

fn default_slave_id() -> u8 {
    1
}

fn default_timeout_ms() -> u64 {
    5000
}

impl SensorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            slave_id: default_slave_id(),
            timeout_ms: default_timeout_ms(),
        }
    }
}
