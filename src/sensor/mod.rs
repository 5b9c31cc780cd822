// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Sensor access over Modbus/TCP
//!
//! - [`SensorClient`]: register reads and writes with automatic reconnection
//! - [`SensorController`]: status and control operations used by the API,
//!   tracking [`ConnectionHealth`]

pub mod client;
pub mod controller;
pub mod health;

pub use client::{SensorClient, SensorReadout};
pub use controller::{SensorConnection, SensorController, SensorStatus};
pub use health::ConnectionHealth;

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio_modbus::ExceptionCode;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("failed to connect to sensor at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Modbus transport error: {0}")]
    Transport(#[from] tokio_modbus::Error),

    #[error("sensor answered with Modbus exception {0:?}")]
    Exception(ExceptionCode),

    #[error("sensor did not answer within {0:?}")]
    Timeout(Duration),

    #[error("expected {expected} registers, got {got}")]
    ShortResponse { expected: u16, got: usize },

    #[error("No valid control parameters provided")]
    NoValidParameters,
}
