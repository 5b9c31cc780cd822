// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Simulated Modbus temperature sensor
//!
//! ## Register Map
//!
//! ### Holding Registers
//!
//! | Register Address | Description | Unit | Access | Range |
//! |-----------------|-------------|------|--------|-------|
//! | 0 | Temperature | °C ×10, signed | read only | - |
//! | 1 | Oscillation period | ms | read/write | 100-10000 |
//! | 2 | Oscillation amplitude | °C | read/write | 0-50 |
//! | 3 | Running flag | - | read/write | 0 = stopped, >0 = running |
//!
//! ### Input Registers
//!
//! - Register 0: temperature, same encoding as holding register 0
//!
//! Writes are clamped into range. Any other address answers with
//! `IllegalDataAddress`.

pub mod modbus_server;
pub mod simulation;

pub use modbus_server::{serve, SensorModbusServer};
pub use simulation::{run_simulation, SharedSensor, SimulatedSensor};

pub const TEMPERATURE_REGISTER: u16 = 0;
pub const PERIOD_REGISTER: u16 = 1;
pub const AMPLITUDE_REGISTER: u16 = 2;
pub const RUNNING_REGISTER: u16 = 3;
pub const REGISTER_COUNT: u16 = 4;

/// Encode a temperature as signed tenths of a degree.
pub fn encode_temperature(celsius: f64) -> u16 {
    let tenths = (celsius * 10.0).round().clamp(f64::from(i16::MIN), f64::from(i16::MAX));
    (tenths as i16) as u16
}

/// Decode a temperature register.
pub fn decode_temperature(raw: u16) -> f64 {
    f64::from(raw as i16) / 10.0
}
