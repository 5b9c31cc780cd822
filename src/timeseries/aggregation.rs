// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Aggregation engine
//!
//! Reduces an ascending sequence of [`Reading`]s to one point per
//! epoch-aligned bucket. Buckets are identified by
//! `floor(timestamp_ms / width_ms)`, so the same reading always lands in the
//! same bucket whatever the query window. Empty buckets are not emitted.
//!
//! The walk is a single pass that only keeps the running sum and count of the
//! bucket in progress.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use rust_sensor_monitor::timeseries::aggregation::{aggregate, Granularity};
//! use rust_sensor_monitor::timeseries::types::Reading;
//!
//! let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 10).unwrap();
//! let readings = vec![
//!     Reading::new(t0, 20.0),
//!     Reading::new(t0 + chrono::TimeDelta::seconds(30), 22.0),
//! ];
//! let points = aggregate(&readings, Granularity::Minute);
//! assert_eq!(points.len(), 1);
//! assert_eq!(points[0].value, 21.0);
//! assert_eq!(points[0].count, 2);
//! ```

use chrono::{DateTime, TimeDelta, Utc};

use super::types::{AggregatedPoint, Reading};

/// Bucket width selected by an aggregation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Granularity {
    /// Identity: one point per reading
    #[default]
    Raw,
    Minute,
    FiveMinutes,
    FifteenMinutes,
    Hour,
}

impl Granularity {
    /// Exact match of a known aggregation token. Tokens are case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "raw" => Some(Granularity::Raw),
            "1min" => Some(Granularity::Minute),
            "5min" => Some(Granularity::FiveMinutes),
            "15min" => Some(Granularity::FifteenMinutes),
            "1hour" => Some(Granularity::Hour),
            _ => None,
        }
    }

    /// Parse an aggregation token.
    ///
    /// Only `raw` means identity. Any other unrecognized token, `RAW`
    /// included, selects the one-minute width.
    pub fn parse(token: &str) -> Self {
        Self::from_token(token).unwrap_or(Granularity::Minute)
    }

    /// Bucket width in milliseconds, `None` for raw
    pub fn width_ms(&self) -> Option<i64> {
        match self {
            Granularity::Raw => None,
            Granularity::Minute => Some(60_000),
            Granularity::FiveMinutes => Some(300_000),
            Granularity::FifteenMinutes => Some(900_000),
            Granularity::Hour => Some(3_600_000),
        }
    }

    /// Canonical token, echoed back in response metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Raw => "raw",
            Granularity::Minute => "1min",
            Granularity::FiveMinutes => "5min",
            Granularity::FifteenMinutes => "15min",
            Granularity::Hour => "1hour",
        }
    }
}

/// Round half-up to two decimals.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Bucket currently being filled
struct OpenBucket {
    index: i64,
    sum: f64,
    count: usize,
}

impl OpenBucket {
    fn start(index: i64, value: f64) -> Self {
        Self {
            index,
            sum: value,
            count: 1,
        }
    }

    fn flush(self, width_ms: i64) -> AggregatedPoint {
        AggregatedPoint {
            timestamp: bucket_start(self.index, width_ms),
            value: round_to_hundredths(self.sum / self.count as f64),
            count: self.count,
        }
    }
}

fn bucket_index(timestamp: &DateTime<Utc>, width_ms: i64) -> i64 {
    timestamp.timestamp_millis().div_euclid(width_ms)
}

fn bucket_start(index: i64, width_ms: i64) -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + TimeDelta::milliseconds(index * width_ms)
}

/// Aggregate ascending readings at the given granularity.
///
/// Readings must be sorted by ascending timestamp. Output timestamps are then
/// strictly increasing and each one is a multiple of the bucket width.
pub fn aggregate(readings: &[Reading], granularity: Granularity) -> Vec<AggregatedPoint> {
    let Some(width_ms) = granularity.width_ms() else {
        return readings
            .iter()
            .map(|reading| AggregatedPoint {
                timestamp: reading.timestamp,
                value: reading.value,
                count: 1,
            })
            .collect();
    };

    let mut points = Vec::new();
    let mut current: Option<OpenBucket> = None;

    for reading in readings {
        let index = bucket_index(&reading.timestamp, width_ms);
        current = match current.take() {
            Some(mut bucket) if bucket.index == index => {
                bucket.sum += reading.value;
                bucket.count += 1;
                Some(bucket)
            }
            Some(bucket) => {
                points.push(bucket.flush(width_ms));
                Some(OpenBucket::start(index, reading.value))
            }
            None => Some(OpenBucket::start(index, reading.value)),
        };
    }

    // The last bucket is still open once the loop ends
    if let Some(bucket) = current {
        points.push(bucket.flush(width_ms));
    }

    points
}
