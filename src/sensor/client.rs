// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus/TCP client for the temperature sensor
//!
//! The client keeps one connection open between calls. Any transport error
//! or timeout drops it and the next call reconnects.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::sync::Mutex;
use tokio::time;
use tokio_modbus::client::Context;
use tokio_modbus::prelude::*;

use super::SensorError;
use crate::acquisition::TemperatureSource;
use crate::modbus::{
    decode_temperature, AMPLITUDE_REGISTER, PERIOD_REGISTER, REGISTER_COUNT, RUNNING_REGISTER,
    TEMPERATURE_REGISTER,
};
use crate::modbus::simulation::BASE_TEMPERATURE;

/// Register block decoded into sensor settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReadout {
    pub temperature: f64,
    pub period: u16,
    pub amplitude: u16,
    pub running: bool,
    pub base_temperature: f64,
}

enum RegisterOp {
    Read { addr: u16, count: u16 },
    Write { addr: u16, value: u16 },
}

pub struct SensorClient {
    addr: SocketAddr,
    slave: Slave,
    timeout: Duration,
    ctx: Mutex<Option<Context>>,
}

impl SensorClient {
    pub fn new(addr: SocketAddr, slave_id: u8, timeout: Duration) -> Self {
        Self {
            addr,
            slave: Slave(slave_id),
            timeout,
            ctx: Mutex::new(None),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    async fn connect(&self) -> Result<Context, SensorError> {
        debug!("Connecting to Modbus sensor at {}", self.addr);
        match time::timeout(self.timeout, tcp::connect_slave(self.addr, self.slave)).await {
            Err(_) => Err(SensorError::Timeout(self.timeout)),
            Ok(Err(source)) => Err(SensorError::Connect {
                addr: self.addr,
                source,
            }),
            Ok(Ok(ctx)) => Ok(ctx),
        }
    }

    async fn execute(&self, op: RegisterOp) -> Result<Vec<u16>, SensorError> {
        let mut slot = self.ctx.lock().await;
        let mut ctx = match slot.take() {
            Some(ctx) => ctx,
            None => self.connect().await?,
        };

        let outcome = match op {
            RegisterOp::Read { addr, count } => {
                time::timeout(self.timeout, ctx.read_holding_registers(addr, count)).await
            }
            RegisterOp::Write { addr, value } => {
                time::timeout(self.timeout, ctx.write_single_register(addr, value))
                    .await
                    .map(|res| res.map(|res| res.map(|()| Vec::new())))
            }
        };

        match outcome {
            Err(_) => {
                warn!("Modbus request to {} timed out, dropping connection", self.addr);
                Err(SensorError::Timeout(self.timeout))
            }
            Ok(Err(e)) => {
                warn!("Modbus transport error with {}: {e}", self.addr);
                Err(SensorError::Transport(e))
            }
            Ok(Ok(response)) => {
                // The link is healthy even when the device answers with an exception
                *slot = Some(ctx);
                response.map_err(SensorError::Exception)
            }
        }
    }

    pub async fn read_registers(&self, addr: u16, count: u16) -> Result<Vec<u16>, SensorError> {
        let values = self.execute(RegisterOp::Read { addr, count }).await?;
        if values.len() != usize::from(count) {
            return Err(SensorError::ShortResponse {
                expected: count,
                got: values.len(),
            });
        }
        Ok(values)
    }

    pub async fn write_register(&self, addr: u16, value: u16) -> Result<(), SensorError> {
        self.execute(RegisterOp::Write { addr, value }).await?;
        debug!("Wrote register {addr}: {value}");
        Ok(())
    }

    /// Current temperature in °C
    pub async fn read_temperature(&self) -> Result<f64, SensorError> {
        let values = self.read_registers(TEMPERATURE_REGISTER, 1).await?;
        Ok(decode_temperature(values[0]))
    }

    /// Read the whole register block.
    pub async fn read_status(&self) -> Result<SensorReadout, SensorError> {
        let values = self.read_registers(TEMPERATURE_REGISTER, REGISTER_COUNT).await?;
        Ok(SensorReadout {
            temperature: decode_temperature(values[usize::from(TEMPERATURE_REGISTER)]),
            period: values[usize::from(PERIOD_REGISTER)],
            amplitude: values[usize::from(AMPLITUDE_REGISTER)],
            running: values[usize::from(RUNNING_REGISTER)] > 0,
            base_temperature: BASE_TEMPERATURE,
        })
    }

    /// Whether the sensor currently answers a single-register read
    pub async fn test_connection(&self) -> bool {
        match self.read_registers(TEMPERATURE_REGISTER, 1).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Sensor connection test failed: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl TemperatureSource for SensorClient {
    async fn read_temperature(&self) -> Result<f64, SensorError> {
        SensorClient::read_temperature(self).await
    }
}
