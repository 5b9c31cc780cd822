// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Modbus server exposing the simulated sensor
//!
//! For avoiding confusion with the Modbus master/slave terminology, this module uses
//! the terms "server" and "client" instead. The server is the simulated sensor,
//! the client is the collector polling it.

use std::{future, sync::PoisonError};

use log::{debug, error, info};
use tokio::net::TcpListener;
use tokio_modbus::{
    prelude::*,
    server::tcp::{accept_tcp_connection, Server},
};

use super::simulation::SharedSensor;
use super::TEMPERATURE_REGISTER;

/// Modbus service over a shared [`SimulatedSensor`](super::simulation::SimulatedSensor).
///
/// One instance is created per client connection; all of them share the
/// same sensor state.
pub struct SensorModbusServer {
    sensor: SharedSensor,
}

impl tokio_modbus::server::Service for SensorModbusServer {
    type Request = Request<'static>;
    type Response = Response;
    type Exception = ExceptionCode;
    type Future = future::Ready<Result<Self::Response, Self::Exception>>;

    /// Handles function codes 0x03, 0x04, 0x06 and 0x10.
    fn call(&self, req: Self::Request) -> Self::Future {
        debug!("Received Modbus request: {:?}", req);
        let mut rng = rand::rng();
        let mut sensor = self.sensor.lock().unwrap_or_else(PoisonError::into_inner);

        let res = match req {
            Request::ReadHoldingRegisters(addr, cnt) => sensor
                .read_registers(addr, cnt, &mut rng)
                .map(Response::ReadHoldingRegisters),
            Request::ReadInputRegisters(addr, cnt) => {
                if addr == TEMPERATURE_REGISTER && cnt == 1 {
                    sensor
                        .read_registers(addr, cnt, &mut rng)
                        .map(Response::ReadInputRegisters)
                } else {
                    Err(ExceptionCode::IllegalDataAddress)
                }
            }
            Request::WriteSingleRegister(addr, value) => sensor
                .write_register(addr, value)
                .map(|_| Response::WriteSingleRegister(addr, value)),
            Request::WriteMultipleRegisters(addr, values) => sensor
                .write_registers(addr, &values)
                .map(|_| Response::WriteMultipleRegisters(addr, values.len() as u16)),
            _ => {
                error!(
                    "Exception::IllegalFunction - Unimplemented function code in request: {req:?}"
                );
                Err(ExceptionCode::IllegalFunction)
            }
        };

        if let Err(e) = &res {
            error!("Modbus request error: {:?}", e);
        }

        future::ready(res)
    }
}

impl SensorModbusServer {
    pub fn new(sensor: SharedSensor) -> Self {
        Self { sensor }
    }
}

/// Serve the sensor on an already bound listener until the task is aborted.
pub async fn serve(listener: TcpListener, sensor: SharedSensor) -> anyhow::Result<()> {
    info!("Modbus server listening on {}", listener.local_addr()?);
    let server = Server::new(listener);

    let on_connected = move |stream, socket_addr| {
        let sensor = sensor.clone();
        async move {
            debug!("Modbus client connected from {socket_addr}");
            accept_tcp_connection(stream, socket_addr, move |_socket_addr| {
                Ok(Some(SensorModbusServer::new(sensor.clone())))
            })
        }
    };

    let on_process_error = |err| {
        error!("Modbus server error: {err}");
    };

    server.serve(&on_connected, on_process_error).await?;
    Ok(())
}
