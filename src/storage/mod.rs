// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Reading store
//!
//! Append-only log of timestamped temperature readings for the configured
//! sensor. Range lookups return the most recent readings first; callers
//! feeding the aggregation engine must reverse them.

mod sqlite;

pub use sqlite::SqliteReadingStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::timeseries::statistics::StatsSummary;
use crate::timeseries::types::{Reading, TimeRange};

/// Default sensor registered at startup
pub const DEFAULT_SENSOR_ID: &str = "550e8400-e29b-41d4-a716-446655440000";
pub const DEFAULT_SENSOR_NAME: &str = "Temperature Sensor 1";
pub const DEFAULT_SENSOR_DESCRIPTION: &str = "Simulated Modbus temperature sensor";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Persistence backend for sensor readings
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append an explicitly timestamped reading.
    async fn insert_reading(&self, reading: Reading) -> Result<(), StorageError>;

    /// Append a reading stamped with the server clock.
    async fn store_reading(&self, value: f64) -> Result<Reading, StorageError> {
        let reading = Reading::now(value);
        self.insert_reading(reading).await?;
        Ok(reading)
    }

    /// Readings with `from <= timestamp <= to`, most recent first, at most `limit`.
    async fn get_readings(&self, range: &TimeRange, limit: usize)
        -> Result<Vec<Reading>, StorageError>;

    /// Latest `limit` readings regardless of time, most recent first.
    async fn get_recent_readings(&self, limit: usize) -> Result<Vec<Reading>, StorageError>;

    /// Summary statistics over every reading in range.
    async fn get_stats(&self, range: &TimeRange) -> Result<StatsSummary, StorageError>;

    /// Cheap liveness probe
    async fn test_connection(&self) -> bool;
}
