// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).
//!
//! Visualization module
//!
//! Rocket web server exposing the temperature history, the sensor
//! status/control endpoints and the health probe to the dashboard.

pub mod api;
pub mod cors;
pub mod server;

pub use api::ApiSettings;
pub use server::{build_rocket, figment_from_config};
