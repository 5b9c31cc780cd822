// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Rust sensor monitor library
//!
//! Simulated Modbus temperature sensor, polling collector, SQLite reading
//! store and the time-series HTTP API serving the dashboard.
//!
//! The query pipeline lives in [`timeseries`]: a request is validated,
//! resolved to a [`timeseries::TimeRange`], fetched from a
//! [`storage::ReadingStore`], reordered chronologically and optionally
//! bucketed by [`timeseries::aggregate`].

pub mod acquisition;
pub mod config;
pub mod daemon;
pub mod modbus;
pub mod sensor;
pub mod storage;
pub mod timeseries;
pub mod visualization;
