// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! SQLite implementation of [`ReadingStore`]
//!
//! Timestamps are stored as epoch milliseconds. Every query runs on the
//! blocking thread pool while holding the connection mutex.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    ReadingStore, StorageError, DEFAULT_SENSOR_DESCRIPTION, DEFAULT_SENSOR_ID, DEFAULT_SENSOR_NAME,
};
use crate::timeseries::statistics::{StatsSummary, ValueAggregates};
use crate::timeseries::types::{Reading, TimeRange};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sensors (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT
    );

    CREATE TABLE IF NOT EXISTS sensor_readings (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        sensor_id TEXT NOT NULL REFERENCES sensors(id),
        temperature_celsius REAL NOT NULL,
        timestamp INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_readings_sensor_time
        ON sensor_readings(sensor_id, timestamp);
"#;

pub struct SqliteReadingStore {
    conn: Arc<Mutex<Connection>>,
    sensor_id: Arc<str>,
}

impl SqliteReadingStore {
    /// Open (or create) the database at `path` for the given sensor.
    pub fn open<P: AsRef<Path>>(path: P, sensor_id: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        info!("Opened reading store at {}", path.as_ref().display());
        Self::with_connection(conn, sensor_id)
    }

    /// Private in-memory database, used by tests and benchmarks
    pub fn open_in_memory(sensor_id: &str) -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, sensor_id)
    }

    fn with_connection(conn: Connection, sensor_id: &str) -> Result<Self, StorageError> {
        conn.execute_batch(SCHEMA)?;
        if register_sensor(&conn, sensor_id)? > 0 {
            info!("Registered sensor {}", sensor_id);
        }
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            sensor_id: Arc::from(sensor_id),
        })
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Make sure the sensor row exists.
    ///
    /// Opening the store already registers the sensor, so this only reports
    /// the registration state.
    pub async fn initialize_default_sensor(&self) -> Result<(), StorageError> {
        let inserted = self
            .with_conn(|conn, sensor_id| register_sensor(conn, sensor_id))
            .await?;

        if inserted > 0 {
            info!("Registered sensor {}", self.sensor_id);
        } else {
            debug!("Sensor {} already registered", self.sensor_id);
        }
        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> Result<T, StorageError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let sensor_id = Arc::clone(&self.sensor_id);
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            f(&conn, &sensor_id)
        })
        .await?
    }
}

/// Insert the sensor row if missing; readings reference it.
///
/// The default sensor id gets the default name and description.
fn register_sensor(conn: &Connection, sensor_id: &str) -> Result<usize, StorageError> {
    let (name, description) = if sensor_id == DEFAULT_SENSOR_ID {
        (DEFAULT_SENSOR_NAME, DEFAULT_SENSOR_DESCRIPTION)
    } else {
        (sensor_id, "")
    };
    Ok(conn.execute(
        "INSERT OR IGNORE INTO sensors (id, name, description) VALUES (?1, ?2, ?3)",
        params![sensor_id, name, description],
    )?)
}

fn to_instant(millis: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(millis).ok_or(StorageError::InvalidTimestamp(millis))
}

fn collect_readings(
    rows: impl Iterator<Item = rusqlite::Result<(i64, f64)>>,
) -> Result<Vec<Reading>, StorageError> {
    rows.map(|row| {
        let (millis, value) = row?;
        Ok(Reading::new(to_instant(millis)?, value))
    })
    .collect()
}

#[async_trait]
impl ReadingStore for SqliteReadingStore {
    async fn insert_reading(&self, reading: Reading) -> Result<(), StorageError> {
        self.with_conn(move |conn, sensor_id| {
            conn.execute(
                "INSERT INTO sensor_readings (sensor_id, temperature_celsius, timestamp)
                 VALUES (?1, ?2, ?3)",
                params![sensor_id, reading.value, reading.timestamp.timestamp_millis()],
            )?;
            Ok(())
        })
        .await
    }

    async fn get_readings(
        &self,
        range: &TimeRange,
        limit: usize,
    ) -> Result<Vec<Reading>, StorageError> {
        let from = range.from.timestamp_millis();
        let to = range.to.timestamp_millis();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn, sensor_id| {
            let mut stmt = conn.prepare_cached(
                "SELECT timestamp, temperature_celsius FROM sensor_readings
                 WHERE sensor_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
                 ORDER BY timestamp DESC
                 LIMIT ?4",
            )?;
            let rows = stmt.query_map(params![sensor_id, from, to, limit], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?;
            collect_readings(rows)
        })
        .await
    }

    async fn get_recent_readings(&self, limit: usize) -> Result<Vec<Reading>, StorageError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.with_conn(move |conn, sensor_id| {
            let mut stmt = conn.prepare_cached(
                "SELECT timestamp, temperature_celsius FROM sensor_readings
                 WHERE sensor_id = ?1
                 ORDER BY timestamp DESC
                 LIMIT ?2",
            )?;
            let rows =
                stmt.query_map(params![sensor_id, limit], |row| Ok((row.get(0)?, row.get(1)?)))?;
            collect_readings(rows)
        })
        .await
    }

    async fn get_stats(&self, range: &TimeRange) -> Result<StatsSummary, StorageError> {
        let query_range = *range;
        let from = range.from.timestamp_millis();
        let to = range.to.timestamp_millis();

        let aggregates = self
            .with_conn(move |conn, sensor_id| {
                let (count, mean, min, max, first, last): (
                    i64,
                    Option<f64>,
                    Option<f64>,
                    Option<f64>,
                    Option<i64>,
                    Option<i64>,
                ) = conn.query_row(
                    "SELECT COUNT(*), AVG(temperature_celsius),
                            MIN(temperature_celsius), MAX(temperature_celsius),
                            MIN(timestamp), MAX(timestamp)
                     FROM sensor_readings
                     WHERE sensor_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
                    params![sensor_id, from, to],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                        ))
                    },
                )?;

                // SQLite has no STDDEV; second pass over the same rows
                let variance = match mean {
                    Some(mean) => conn
                        .query_row(
                            "SELECT AVG((temperature_celsius - ?4) * (temperature_celsius - ?4))
                             FROM sensor_readings
                             WHERE sensor_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3",
                            params![sensor_id, from, to, mean],
                            |row| row.get::<_, Option<f64>>(0),
                        )
                        .optional()?
                        .flatten(),
                    None => None,
                };

                Ok(ValueAggregates {
                    count: u64::try_from(count).unwrap_or(0),
                    mean,
                    min,
                    max,
                    variance,
                    first: first.map(to_instant).transpose()?,
                    last: last.map(to_instant).transpose()?,
                })
            })
            .await?;

        Ok(StatsSummary::from_aggregates(aggregates, &query_range))
    }

    async fn test_connection(&self) -> bool {
        let probe = self
            .with_conn(|conn, _| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
            .await;
        match probe {
            Ok(_) => true,
            Err(e) => {
                error!("Database connection test failed: {e}");
                false
            }
        }
    }
}
