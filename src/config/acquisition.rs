// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Polling collector configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings of the background temperature collector.
///
/// Every `interval_ms` the collector reads register 0 of the configured
/// sensor and appends the value to the reading store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Run the collector inside the daemon.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Delay between two polls, in milliseconds. Must be greater than zero.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_ms() -> u64 {
    1000
}

impl AcquisitionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_ms: default_interval_ms(),
        }
    }
}
