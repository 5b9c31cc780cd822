// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Temperature query pipeline
//!
//! validate → resolve → fetch → reorder → aggregate → response envelope.
//! The response types are what the HTTP layer serializes.

use std::sync::Arc;

use log::{debug, warn};
use rocket_okapi::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregation::{aggregate, Granularity};
use super::statistics::StatsSummary;
use super::time_range::resolve;
use super::types::{format_timestamp, AggregatedPoint, Reading};
use super::validation::{
    is_known_aggregation, is_known_timescale, validate_stats_query, validate_temperature_query,
};
use crate::storage::{ReadingStore, StorageError};

/// Default number of readings returned by the recent endpoint
pub const DEFAULT_RECENT_LIMIT: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemperatureDataPoint {
    /// ISO-8601 UTC timestamp with milliseconds
    pub timestamp: String,
    /// Temperature in °C
    pub value: f64,
}

impl From<&AggregatedPoint> for TemperatureDataPoint {
    fn from(point: &AggregatedPoint) -> Self {
        Self {
            timestamp: format_timestamp(&point.timestamp),
            value: point.value,
        }
    }
}

impl From<&Reading> for TemperatureDataPoint {
    fn from(reading: &Reading) -> Self {
        Self {
            timestamp: format_timestamp(&reading.timestamp),
            value: reading.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureMeta {
    pub from: String,
    pub to: String,
    /// Requested timescale, `custom` when none was given, `recent` for the recent endpoint
    pub timescale: String,
    pub aggregation: String,
    /// Readings fetched from the store
    pub total_points: usize,
    /// Points returned after aggregation
    pub aggregated_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemperatureResponse {
    pub data: Vec<TemperatureDataPoint>,
    pub meta: TemperatureMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStats {
    pub total_readings: u64,
    pub average_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub standard_deviation: f64,
    pub temperature_range: f64,
    pub first_reading: String,
    pub last_reading: String,
}

impl From<&StatsSummary> for TemperatureStats {
    fn from(summary: &StatsSummary) -> Self {
        Self {
            total_readings: summary.total_readings,
            average_temperature: summary.average_temperature,
            min_temperature: summary.min_temperature,
            max_temperature: summary.max_temperature,
            standard_deviation: summary.standard_deviation,
            temperature_range: summary.temperature_range,
            first_reading: format_timestamp(&summary.first_reading),
            last_reading: format_timestamp(&summary.last_reading),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatsMeta {
    pub from: String,
    pub to: String,
    pub timescale: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StatsResponse {
    pub stats: TemperatureStats,
    pub meta: StatsMeta,
}

/// Query front-end over a [`ReadingStore`]
#[derive(Clone)]
pub struct TemperatureService {
    store: Arc<dyn ReadingStore>,
}

impl TemperatureService {
    pub fn new(store: Arc<dyn ReadingStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ReadingStore> {
        &self.store
    }

    /// Range query with optional aggregation.
    ///
    /// `params` is the raw query as a JSON object; unknown or mistyped keys
    /// are dropped.
    pub async fn get_temperature_data(
        &self,
        params: &Value,
    ) -> Result<TemperatureResponse, StorageError> {
        let query = validate_temperature_query(params);
        let range = resolve(&query.range);
        let limit = query.effective_limit();
        let aggregation = query.aggregation.as_deref().unwrap_or("raw");

        if let Some(timescale) = query.range.timescale.as_deref() {
            if !is_known_timescale(timescale) {
                warn!("Unknown timescale '{timescale}', using the last hour");
            }
        }
        if !is_known_aggregation(aggregation) {
            warn!("Unknown aggregation '{aggregation}', using 1min buckets");
        }

        debug!(
            "Fetching temperatures from {} to {} (aggregation {aggregation}, limit {limit})",
            format_timestamp(&range.from),
            format_timestamp(&range.to)
        );

        let mut readings = self.store.get_readings(&range, limit).await?;
        // Store order is most recent first
        readings.reverse();

        let points = aggregate(&readings, Granularity::parse(aggregation));

        Ok(TemperatureResponse {
            data: points.iter().map(TemperatureDataPoint::from).collect(),
            meta: TemperatureMeta {
                from: format_timestamp(&range.from),
                to: format_timestamp(&range.to),
                timescale: echo_timescale(query.range.timescale.as_deref()),
                aggregation: aggregation.to_string(),
                total_points: readings.len(),
                aggregated_points: points.len(),
            },
        })
    }

    /// Statistics over the resolved range.
    pub async fn get_temperature_stats(&self, params: &Value) -> Result<StatsResponse, StorageError> {
        let query = validate_stats_query(params);
        let range = resolve(&query);

        let summary = self.store.get_stats(&range).await?;

        Ok(StatsResponse {
            stats: TemperatureStats::from(&summary),
            meta: StatsMeta {
                from: format_timestamp(&range.from),
                to: format_timestamp(&range.to),
                timescale: echo_timescale(query.timescale.as_deref()),
            },
        })
    }

    /// Latest `limit` readings in chronological order.
    pub async fn get_recent_temperatures(
        &self,
        limit: usize,
    ) -> Result<TemperatureResponse, StorageError> {
        let mut readings = self.store.get_recent_readings(limit).await?;
        readings.reverse();

        let now = format_timestamp(&chrono::Utc::now());
        let from = readings
            .first()
            .map(|r| format_timestamp(&r.timestamp))
            .unwrap_or_else(|| now.clone());
        let to = readings
            .last()
            .map(|r| format_timestamp(&r.timestamp))
            .unwrap_or(now);

        Ok(TemperatureResponse {
            data: readings.iter().map(TemperatureDataPoint::from).collect(),
            meta: TemperatureMeta {
                from,
                to,
                timescale: "recent".to_string(),
                aggregation: "raw".to_string(),
                total_points: readings.len(),
                aggregated_points: readings.len(),
            },
        })
    }
}

fn echo_timescale(timescale: Option<&str>) -> String {
    timescale.unwrap_or("custom").to_string()
}
