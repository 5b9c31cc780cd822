// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Core time-series value types shared by the store, the resolver,
//! the aggregation engine and the statistics summarizer.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeDelta, Utc};

/// One timestamped sensor value.
///
/// Readings are immutable once stored. Aggregation orders them by
/// ascending timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Instant the value was sampled (server clock)
    pub timestamp: DateTime<Utc>,
    /// Temperature in degrees Celsius
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Create a reading stamped with the current server time, truncated to
    /// the millisecond precision of the store
    pub fn now(value: f64) -> Self {
        Self::new(Utc::now().trunc_subsecs(3), value)
    }
}

/// Concrete query interval, inclusive on both ends for store lookups.
///
/// Ranges derived from a timescale token always satisfy `from < to`.
/// Explicit ranges are trusted as given and may be inverted, in which case
/// they simply select nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Range of the given width ending at `to`
    pub fn ending_at(to: DateTime<Utc>, width: TimeDelta) -> Self {
        Self { from: to - width, to }
    }

    pub fn duration(&self) -> TimeDelta {
        self.to - self.from
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.from <= instant && instant <= self.to
    }
}

/// One output point of the aggregation engine.
///
/// For bucketed output `timestamp` is the epoch-aligned start of the bucket,
/// `value` the mean of the bucket rounded to two decimals and `count` the
/// number of readings that fell into it. Raw output carries the reading
/// untouched with a count of 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub count: usize,
}

/// Format an instant the way every API response does: RFC 3339, UTC,
/// millisecond precision, `Z` suffix (e.g. `2025-01-01T00:00:00.000Z`).
pub fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a user supplied instant.
///
/// Accepted forms, tried in order:
/// - RFC 3339 with offset (`2025-01-01T10:00:00Z`, `2025-01-01T12:00:00+02:00`)
/// - date and time without offset, read as UTC (`2025-01-01T10:00:00`, `2025-01-01 10:00:00.250`)
/// - a bare date, month or four-digit year, read as UTC midnight on its
///   first day (`2025-01-01`, `2025-01`, `2025`)
/// - integer milliseconds since the Unix epoch, five digits or more
///   (`1735725600000`)
///
/// Returns `None` for anything else.
pub fn parse_instant(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return Some(naive.and_utc());
        }
    }

    let is_year = input.len() == 4 && input.bytes().all(|b| b.is_ascii_digit());
    let date = if is_year {
        NaiveDate::parse_from_str(&format!("{input}-01-01"), "%Y-%m-%d").ok()
    } else {
        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{input}-01"), "%Y-%m-%d"))
            .ok()
    };
    if let Some(date) = date {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    if input.trim_start_matches('-').len() < 5 {
        return None;
    }
    input
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}
