// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Hosted sensor simulator configuration
//!
//! The simulator is a Modbus TCP server exposing the register map described
//! in [`crate::modbus`].

use serde::{Deserialize, Serialize};

use crate::modbus::simulation::{DEFAULT_AMPLITUDE, DEFAULT_PERIOD};

/// Configuration of the simulated sensor and its Modbus TCP server.
///
/// # Example
///
/// ```
/// use rust_sensor_monitor::config::ModbusConfig;
///
/// let modbus_config = ModbusConfig {
///     port: 1502,
///     address: "0.0.0.0".to_string(),
///     ..Default::default()
/// };
/// assert!(modbus_config.enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModbusConfig {
    /// Run the simulator inside the daemon.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// TCP port the Modbus server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address of the Modbus server.
    #[serde(default = "default_address")]
    pub address: String,

    /// Simulation tick in milliseconds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Oscillation period at startup, in ms.
    #[serde(default = "default_initial_period")]
    pub initial_period: u16,

    /// Oscillation amplitude at startup, in °C.
    #[serde(default = "default_initial_amplitude")]
    pub initial_amplitude: u16,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    5020
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_update_interval_ms() -> u64 {
    100
}

fn default_initial_period() -> u16 {
    DEFAULT_PERIOD
}

fn default_initial_amplitude() -> u16 {
    DEFAULT_AMPLITUDE
}

impl Default for ModbusConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            update_interval_ms: default_update_interval_ms(),
            initial_period: default_initial_period(),
            initial_amplitude: default_initial_amplitude(),
        }
    }
}
