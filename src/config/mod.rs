// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Configuration management for the sensor monitor
//!
//! The configuration is backed by a YAML file and validated against an
//! embedded JSON schema before being deserialized.
//!
//! ## Configuration Structure
//!
//! - `visualization`: HTTP API server
//! - `modbus`: hosted sensor simulator (Modbus TCP server)
//! - `sensor`: Modbus TCP endpoint the collector and the controller talk to
//! - `acquisition`: background polling collector
//! - `storage`: SQLite reading store
//!
//! ## Usage
//!
//! ```no_run
//! use rust_sensor_monitor::config::Config;
//! use std::path::Path;
//!
//! // Load config from file, creates a default if not found
//! let mut config = Config::from_file(Path::new("config.yaml")).unwrap();
//!
//! // Apply command line overrides if needed
//! config.apply_args(
//!     Some(8081),                  // Web port
//!     Some("0.0.0.0".to_string()), // Web address
//!     Some(false),                 // Disable the hosted simulator
//!     None,                        // Modbus port
//!     Some("10.0.0.12".to_string()), // Sensor address
//!     Some(502),                   // Sensor port
//!     None,                        // Database path
//!     Some(500),                   // Poll interval in ms
//! );
//!
//! println!("Server port: {}", config.visualization.port);
//! ```

pub mod acquisition;
pub mod modbus;
pub mod sensor;
pub mod storage;
pub mod utils;
pub mod visualization;

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use acquisition::AcquisitionConfig;
pub use modbus::ModbusConfig;
pub use sensor::SensorConfig;
pub use storage::StorageConfig;
pub use utils::{is_valid_ip_address, output_config_schema, CONFIG_SCHEMA};
pub use visualization::VisualizationConfig;

/// Root configuration structure.
///
/// Every section falls back to its defaults when absent from the file, so an
/// empty YAML document is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP API server settings.
    #[serde(default)]
    pub visualization: VisualizationConfig,

    /// Hosted simulator settings.
    #[serde(default)]
    pub modbus: ModbusConfig,

    /// Sensor endpoint settings.
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Collector settings.
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Helper method to create a sample config file when validation fails
    fn create_sample_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let sample_path = path.with_extension("sample.yaml");
        debug!("Creating sample configuration file at {:?}", sample_path);

        if let Some(parent) = sample_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!("Creating parent directory: {:?}", parent);
                fs::create_dir_all(parent).with_context(|| {
                    format!(
                        "Failed to create parent directory for sample config at {:?}",
                        parent
                    )
                })?;
            }
        }

        Self::default()
            .save_to_file(&sample_path)
            .with_context(|| format!("Failed to save sample config to {:?}", sample_path))?;

        error!(
            "Sample configuration file created at {:?}\nPlease edit and rename it",
            sample_path
        );
        Ok(())
    }

    /// Load configuration from a file
    ///
    /// A missing file is created with the default configuration. When the
    /// file fails validation a `<name>.sample.yaml` holding the defaults is
    /// written next to it and an error is returned.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(
                "Configuration file not found at {:?}, creating default",
                path
            );
            let default_config = Self::default();
            default_config.save_to_file(path)?;
            return Ok(default_config);
        }

        debug!("Loading configuration from {:?}", path);
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file at {:?}", path))?;

        let config = match Self::from_yaml_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                error!("Configuration error in {}: {:#}", path.display(), err);
                if let Err(e) = Self::create_sample_config(path) {
                    error!("Failed to create sample config: {:#}", e);
                }
                return Err(err.context(format!(
                    "Invalid configuration file {}",
                    path.display()
                )));
            }
        };

        Ok(config)
    }

    /// Parse, schema-validate and check a YAML document
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let yaml_value: serde_yml::Value =
            serde_yml::from_str(contents).context("Failed to parse YAML configuration")?;

        // An empty document is a null value; treat it as an empty mapping
        let json_value = match serde_json::to_value(&yaml_value)
            .context("Failed to convert YAML to JSON for validation")?
        {
            serde_json::Value::Null => serde_json::Value::Object(Default::default()),
            value => value,
        };

        let schema: serde_json::Value =
            serde_json::from_str(CONFIG_SCHEMA).context("Failed to parse JSON schema")?;
        let validator = jsonschema::draft202012::options()
            .should_validate_formats(true)
            .build(&schema)
            .context("Failed to build JSON schema validator")?;

        debug!("Validating configuration against schema");
        if let Err(error) = validator.validate(&json_value) {
            anyhow::bail!("Configuration validation failed: {}", error);
        }

        let config: Config = serde_json::from_value(json_value)
            .context("Failed to deserialize configuration")?;

        utils::validate_specific_rules(&config)?;

        Ok(config)
    }

    /// Save the configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml =
            serde_yml::to_string(self).context("Failed to serialize configuration to YAML")?;

        let mut file = File::create(path.as_ref())
            .with_context(|| format!("Failed to create config file at {:?}", path.as_ref()))?;

        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Apply command line arguments to override configuration values.
    ///
    /// Only the provided values override the loaded configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn apply_args(
        &mut self,
        web_port: Option<u16>,
        web_address: Option<String>,
        modbus_enabled: Option<bool>,
        modbus_port: Option<u16>,
        sensor_address: Option<String>,
        sensor_port: Option<u16>,
        database: Option<String>,
        interval_ms: Option<u64>,
    ) {
        if let Some(web_port) = web_port {
            debug!("Overriding port from command line: {}", web_port);
            self.visualization.port = web_port;
        }

        if let Some(web_address) = web_address {
            debug!("Overriding address from command line: {}", web_address);
            self.visualization.address = web_address;
        }

        if let Some(enabled) = modbus_enabled {
            debug!("Overriding Modbus enabled from command line: {}", enabled);
            self.modbus.enabled = enabled;
        }
        if let Some(port) = modbus_port {
            debug!("Overriding Modbus port from command line: {}", port);
            self.modbus.port = port;
        }

        if let Some(address) = sensor_address {
            debug!("Overriding sensor address from command line: {}", address);
            self.sensor.address = address;
        }
        if let Some(port) = sensor_port {
            debug!("Overriding sensor port from command line: {}", port);
            self.sensor.port = port;
        }

        if let Some(database) = database {
            debug!("Overriding database path from command line: {}", database);
            self.storage.database_path = database;
        }

        if let Some(interval_ms) = interval_ms {
            debug!("Overriding poll interval from command line: {}", interval_ms);
            self.acquisition.interval_ms = interval_ms;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = Config::from_yaml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = Config::from_yaml_str("sensor:\n  port: 1502\n").unwrap();
        assert_eq!(config.sensor.port, 1502);
        assert_eq!(config.sensor.slave_id, 1);
        assert_eq!(config.visualization, VisualizationConfig::default());
    }

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let yaml = serde_yml::to_string(&Config::default()).unwrap();
        assert_eq!(Config::from_yaml_str(&yaml).unwrap(), Config::default());
    }

    #[test]
    fn test_sensor_host_name_is_accepted() {
        let config = Config::from_yaml_str("sensor:\n  address: modbus-sensor-simulator\n").unwrap();
        assert_eq!(config.sensor.address, "modbus-sensor-simulator");
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = Config::from_yaml_str("visualization:\n  hmac_secret: x\n").unwrap_err();
        assert!(err.to_string().contains("validation failed"));
    }

    #[test]
    fn test_apply_args_overrides_only_given_values() {
        let mut config = Config::default();
        config.apply_args(
            Some(8081),
            None,
            Some(false),
            None,
            Some("10.0.0.2".to_string()),
            None,
            Some("/tmp/readings.db".to_string()),
            Some(250),
        );

        assert_eq!(config.visualization.port, 8081);
        assert_eq!(config.visualization.address, "127.0.0.1");
        assert!(!config.modbus.enabled);
        assert_eq!(config.modbus.port, 5020);
        assert_eq!(config.sensor.address, "10.0.0.2");
        assert_eq!(config.storage.database_path, "/tmp/readings.db");
        assert_eq!(config.acquisition.interval_ms, 250);
    }
}
