// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use chrono::{DateTime, Utc};

/// Outcome of the latest sensor status read.
///
/// A success only flips `is_connected` back on; the last failure is kept so
/// API consumers can see that the link recently dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionHealth {
    pub is_connected: bool,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_failure_message: Option<String>,
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self {
            is_connected: true,
            last_failure_time: None,
            last_failure_message: None,
        }
    }
}

impl ConnectionHealth {
    pub fn record_success(&mut self) {
        self.is_connected = true;
    }

    pub fn record_failure(&mut self, at: DateTime<Utc>, message: impl Into<String>) {
        self.is_connected = false;
        self.last_failure_time = Some(at);
        self.last_failure_message = Some(message.into());
    }
}
