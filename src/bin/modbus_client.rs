// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use anyhow::{Context, Result};
use clap::Parser;
use tokio::time::Duration;

use rust_sensor_monitor::modbus::{
    decode_temperature, AMPLITUDE_REGISTER, PERIOD_REGISTER, REGISTER_COUNT, RUNNING_REGISTER,
    TEMPERATURE_REGISTER,
};
use rust_sensor_monitor::sensor::SensorClient;

/// Modbus client for inspecting and driving the temperature sensor
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Modbus server address
    #[clap(long, default_value = "127.0.0.1")]
    address: String,

    /// Modbus server port
    #[clap(long, default_value = "5020")]
    port: u16,

    /// Modbus unit identifier
    #[clap(long, default_value = "1")]
    slave_id: u8,

    /// Write the oscillation period (ms) before reading
    #[clap(long)]
    period: Option<u16>,

    /// Write the oscillation amplitude (°C) before reading
    #[clap(long)]
    amplitude: Option<u16>,

    /// Start (true) or stop (false) the oscillation before reading
    #[clap(long)]
    running: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    let args = Args::parse();

    let target = format!("{}:{}", args.address, args.port);
    let socket_addr = tokio::net::lookup_host(&target)
        .await
        .with_context(|| format!("Failed to resolve {target}"))?
        .next()
        .with_context(|| format!("No address found for {target}"))?;
    println!("Connecting to Modbus server at {}", socket_addr);

    let client = SensorClient::new(socket_addr, args.slave_id, Duration::from_secs(1));

    if let Some(period) = args.period {
        client.write_register(PERIOD_REGISTER, period).await?;
        println!("Period set to {} ms", period);
    }
    if let Some(amplitude) = args.amplitude {
        client.write_register(AMPLITUDE_REGISTER, amplitude).await?;
        println!("Amplitude set to {} °C", amplitude);
    }
    if let Some(running) = args.running {
        client
            .write_register(RUNNING_REGISTER, u16::from(running))
            .await?;
        println!("Oscillation {}", if running { "started" } else { "stopped" });
    }

    let response = client
        .read_registers(TEMPERATURE_REGISTER, REGISTER_COUNT)
        .await?;
    println!("Raw register values: {:?}", response);

    for (register, value) in (TEMPERATURE_REGISTER..).zip(response.iter()) {
        match register {
            TEMPERATURE_REGISTER => println!(
                "Register 0: Temperature = {:.1} °C",
                decode_temperature(*value)
            ),
            PERIOD_REGISTER => println!("Register 1: Period = {} ms", value),
            AMPLITUDE_REGISTER => println!("Register 2: Amplitude = {} °C", value),
            RUNNING_REGISTER => println!(
                "Register 3: Running = {} ({})",
                value,
                if *value > 0 { "running" } else { "stopped" }
            ),
            _ => println!("Register {}: Value = {}", register, value),
        }
    }

    Ok(())
}
