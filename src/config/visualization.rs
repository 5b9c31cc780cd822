// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Web server configuration

use serde::{Deserialize, Serialize};

/// Settings of the HTTP API server.
///
/// # Example
///
/// ```
/// use rust_sensor_monitor::config::VisualizationConfig;
///
/// let config = VisualizationConfig {
///     port: 8080,
///     ..Default::default()
/// };
/// assert_eq!(config.cors_origin, "*");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationConfig {
    /// Start the HTTP server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// TCP port the server listens on (1-65534).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address, IPv4/IPv6 or `localhost`.
    #[serde(default = "default_address")]
    pub address: String,

    /// Server identifier, sent as the `Server` header and reported by `/health`.
    #[serde(default = "default_name")]
    pub name: String,

    /// Value of `Access-Control-Allow-Origin`.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    /// Base64-encoded PEM certificate. TLS requires both `cert` and `key`.
    #[serde(default)]
    pub cert: Option<String>,

    /// Base64-encoded PEM private key.
    #[serde(default)]
    pub key: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_port() -> u16 {
    4000
}

fn default_address() -> String {
    "127.0.0.1".to_string()
}

fn default_name() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            port: default_port(),
            address: default_address(),
            name: default_name(),
            cors_origin: default_cors_origin(),
            cert: None,
            key: None,
        }
    }
}
