// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration utilities
//!
//! Schema access and the validation rules the JSON schema cannot express.

use anyhow::{Context, Result};
use base64::Engine;
use log::debug;

use super::Config;

/// JSON schema of the YAML configuration file (draft 2020-12)
pub const CONFIG_SCHEMA: &str = include_str!("../../resources/config.schema.json");

/// Output the embedded JSON schema to the console.
///
/// Called for `--show-config-schema`.
///
/// ```bash
/// ./rust_sensor_monitor --show-config-schema > config_schema.json
/// ```
pub fn output_config_schema() -> Result<()> {
    let schema: serde_json::Value =
        serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
    let formatted_schema =
        serde_json::to_string_pretty(&schema).context("Failed to format JSON schema")?;
    println!("{}", formatted_schema);
    Ok(())
}

/// Check if a string is a valid bind address
///
/// Accepts IPv4/IPv6 literals and `localhost`.
pub fn is_valid_ip_address(addr: &str) -> bool {
    if addr.parse::<std::net::IpAddr>().is_ok() {
        return true;
    }

    matches!(addr, "localhost")
}

/// Validates the configuration against rules that aren't covered by the JSON schema.
///
/// - the web server certificate and key are both present or both absent,
///   and both are valid base64
/// - the web and Modbus listen addresses are IP literals or `localhost`,
///   the sensor address is any non-empty host
/// - the collector and simulator intervals are greater than zero
/// - the hosted simulator does not listen on the web server socket
pub fn validate_specific_rules(config: &Config) -> Result<()> {
    debug!("Performing additional validation checks");

    match (&config.visualization.cert, &config.visualization.key) {
        (Some(cert), Some(key)) => {
            base64::engine::general_purpose::STANDARD
                .decode(cert)
                .context("SSL certificate is not valid base64")?;
            base64::engine::general_purpose::STANDARD
                .decode(key)
                .context("SSL key is not valid base64")?;
        }
        (Some(_), None) => anyhow::bail!("SSL certificate provided without a key"),
        (None, Some(_)) => anyhow::bail!("SSL key provided without a certificate"),
        (None, None) => {}
    }

    for (section, address) in [
        ("visualization", &config.visualization.address),
        ("modbus", &config.modbus.address),
    ] {
        if !is_valid_ip_address(address) {
            anyhow::bail!("Invalid {} address: {}", section, address);
        }
    }

    // Host names are resolved when the daemon starts
    if config.sensor.address.trim().is_empty() {
        anyhow::bail!("Sensor address must not be empty");
    }

    if config.visualization.port < 1 || config.visualization.port > 65534 {
        anyhow::bail!("Invalid port number: {}", config.visualization.port);
    }

    if config.acquisition.interval_ms == 0 {
        anyhow::bail!("Acquisition interval must be greater than zero");
    }

    if config.modbus.update_interval_ms == 0 {
        anyhow::bail!("Simulator update interval must be greater than zero");
    }

    if config.visualization.enabled
        && config.modbus.enabled
        && config.modbus.port == config.visualization.port
        && config.modbus.address == config.visualization.address
    {
        anyhow::bail!(
            "Modbus server and web server cannot both listen on {}:{}",
            config.modbus.address,
            config.modbus.port
        );
    }

    Ok(())
}
