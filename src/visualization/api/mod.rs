// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! HTTP API handlers

pub mod error;
pub mod health;
pub mod sensor;
pub mod temperatures;

/// Static settings shared with the handlers
#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Reported as `service` by `/health`
    pub service_name: String,
}
