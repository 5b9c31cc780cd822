// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Data acquisition
//!
//! The collector polls a [`TemperatureSource`] at a fixed interval and
//! appends every value to the reading store. A poll runs to completion
//! before the next sleep starts, so at most one poll is ever in flight and a
//! slow poll delays the next one instead of piling up. Failures are logged
//! and the loop carries on; gaps in the stored series are the only symptom.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info};
use thiserror::Error;
use tokio::time;

use crate::sensor::SensorError;
use crate::storage::{ReadingStore, StorageError};
use crate::timeseries::types::{format_timestamp, Reading};

/// Anything that can produce a temperature on demand
#[async_trait]
pub trait TemperatureSource: Send + Sync {
    async fn read_temperature(&self) -> Result<f64, SensorError>;
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to read sensor: {0}")]
    Sensor(#[from] SensorError),
    #[error("failed to store reading: {0}")]
    Storage(#[from] StorageError),
}

pub struct TemperatureCollector {
    source: Arc<dyn TemperatureSource>,
    store: Arc<dyn ReadingStore>,
    interval: Duration,
}

impl TemperatureCollector {
    pub fn new(
        source: Arc<dyn TemperatureSource>,
        store: Arc<dyn ReadingStore>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            store,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read one value and append it to the store.
    pub async fn poll_once(&self) -> Result<Reading, PollError> {
        let value = self.source.read_temperature().await?;
        let reading = self.store.store_reading(value).await?;
        debug!(
            "[{}] Temperature: {:.1}°C",
            format_timestamp(&reading.timestamp),
            reading.value
        );
        Ok(reading)
    }

    /// Poll until `running` is cleared, checked at the top of every iteration.
    pub async fn run(&self, running: Arc<AtomicBool>) {
        info!(
            "Starting data collection polling every {} ms",
            self.interval.as_millis()
        );

        while running.load(Ordering::SeqCst) {
            if let Err(e) = self.poll_once().await {
                error!("Error collecting data from polling sensor: {e}");
            }

            time::sleep(self.interval).await;
        }

        info!("Data collection stopped");
    }
}
