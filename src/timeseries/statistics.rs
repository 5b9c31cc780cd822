// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Statistics summarizer
//!
//! Descriptive statistics over the raw readings of a resolved range. The
//! in-memory [`summarize`] and the SQL-backed store both go through
//! [`StatsSummary::from_aggregates`], so an empty range always yields zeros
//! and range-bound timestamps instead of NaN or null.

use chrono::{DateTime, Utc};

use super::types::{Reading, TimeRange};

/// Summary of a reading set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSummary {
    pub total_readings: u64,
    pub average_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    /// Population standard deviation (divisor N)
    pub standard_deviation: f64,
    /// `max_temperature - min_temperature`
    pub temperature_range: f64,
    /// Earliest reading, or the range's `from` when there is none
    pub first_reading: DateTime<Utc>,
    /// Latest reading, or the range's `to` when there is none
    pub last_reading: DateTime<Utc>,
}

/// Raw aggregate values as produced by a storage engine.
///
/// Every field is optional the way SQL aggregates over zero rows are.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValueAggregates {
    pub count: u64,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Mean squared deviation from `mean`
    pub variance: Option<f64>,
    pub first: Option<DateTime<Utc>>,
    pub last: Option<DateTime<Utc>>,
}

impl StatsSummary {
    /// Shape raw aggregates into a summary, applying the empty-set fallbacks.
    pub fn from_aggregates(aggregates: ValueAggregates, range: &TimeRange) -> Self {
        if aggregates.count == 0 {
            return Self::empty(range);
        }

        let min = aggregates.min.unwrap_or(0.0);
        let max = aggregates.max.unwrap_or(0.0);
        // Rounding in the engine can leave a tiny negative variance
        let variance = aggregates.variance.unwrap_or(0.0).max(0.0);

        Self {
            total_readings: aggregates.count,
            average_temperature: aggregates.mean.unwrap_or(0.0),
            min_temperature: min,
            max_temperature: max,
            standard_deviation: variance.sqrt(),
            temperature_range: max - min,
            first_reading: aggregates.first.unwrap_or(range.from),
            last_reading: aggregates.last.unwrap_or(range.to),
        }
    }

    /// Summary of a range without readings
    pub fn empty(range: &TimeRange) -> Self {
        Self {
            total_readings: 0,
            average_temperature: 0.0,
            min_temperature: 0.0,
            max_temperature: 0.0,
            standard_deviation: 0.0,
            temperature_range: 0.0,
            first_reading: range.from,
            last_reading: range.to,
        }
    }
}

/// Summarize the readings that fall inside `range` (bounds inclusive).
///
/// Readings outside the range are ignored; input order does not matter.
pub fn summarize(readings: &[Reading], range: &TimeRange) -> StatsSummary {
    let in_range: Vec<&Reading> = readings
        .iter()
        .filter(|reading| range.contains(reading.timestamp))
        .collect();

    if in_range.is_empty() {
        return StatsSummary::empty(range);
    }

    let count = in_range.len();
    let mean = in_range.iter().map(|r| r.value).sum::<f64>() / count as f64;
    let variance = in_range
        .iter()
        .map(|r| (r.value - mean).powi(2))
        .sum::<f64>()
        / count as f64;

    let min = in_range.iter().map(|r| r.value).fold(f64::INFINITY, f64::min);
    let max = in_range
        .iter()
        .map(|r| r.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let first = in_range.iter().map(|r| r.timestamp).min();
    let last = in_range.iter().map(|r| r.timestamp).max();

    StatsSummary::from_aggregates(
        ValueAggregates {
            count: count as u64,
            mean: Some(mean),
            min: Some(min),
            max: Some(max),
            variance: Some(variance),
            first,
            last,
        },
        range,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone};

    fn range() -> TimeRange {
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        TimeRange::new(from, from + TimeDelta::hours(1))
    }

    fn readings(values: &[f64]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Reading::new(range().from + TimeDelta::minutes(i as i64 + 1), *v))
            .collect()
    }

    #[test]
    fn test_ten_twenty_thirty() {
        let stats = summarize(&readings(&[10.0, 20.0, 30.0]), &range());

        assert_eq!(stats.total_readings, 3);
        assert_relative_eq!(stats.average_temperature, 20.0);
        assert_relative_eq!(stats.min_temperature, 10.0);
        assert_relative_eq!(stats.max_temperature, 30.0);
        assert_relative_eq!(stats.temperature_range, 20.0);
        assert_relative_eq!(stats.standard_deviation, 8.16496580927726, epsilon = 1e-9);
        assert_eq!(stats.first_reading, range().from + TimeDelta::minutes(1));
        assert_eq!(stats.last_reading, range().from + TimeDelta::minutes(3));
    }

    #[test]
    fn test_empty_range_falls_back_to_bounds() {
        let stats = summarize(&[], &range());

        assert_eq!(stats.total_readings, 0);
        assert_eq!(stats.average_temperature, 0.0);
        assert_eq!(stats.min_temperature, 0.0);
        assert_eq!(stats.max_temperature, 0.0);
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.temperature_range, 0.0);
        assert_eq!(stats.first_reading, range().from);
        assert_eq!(stats.last_reading, range().to);
    }

    #[test]
    fn test_out_of_range_readings_are_ignored() {
        let mut all = readings(&[10.0, 30.0]);
        all.push(Reading::new(range().to + TimeDelta::seconds(1), 1000.0));
        all.push(Reading::new(range().from - TimeDelta::seconds(1), -1000.0));

        let stats = summarize(&all, &range());
        assert_eq!(stats.total_readings, 2);
        assert_relative_eq!(stats.average_temperature, 20.0);
        assert_relative_eq!(stats.standard_deviation, 10.0);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let inverted = TimeRange::new(range().to, range().from);
        let stats = summarize(&readings(&[1.0, 2.0]), &inverted);
        assert_eq!(stats, StatsSummary::empty(&inverted));
    }

    #[test]
    fn test_single_reading_has_zero_spread() {
        let stats = summarize(&readings(&[21.5]), &range());
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.temperature_range, 0.0);
        assert_eq!(stats.first_reading, stats.last_reading);
    }

    #[test]
    fn test_from_aggregates_clamps_negative_variance() {
        let stats = StatsSummary::from_aggregates(
            ValueAggregates {
                count: 2,
                mean: Some(5.0),
                min: Some(5.0),
                max: Some(5.0),
                variance: Some(-1e-15),
                first: None,
                last: None,
            },
            &range(),
        );
        assert_eq!(stats.standard_deviation, 0.0);
        assert_eq!(stats.first_reading, range().from);
    }
}
