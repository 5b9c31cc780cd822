// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Time range resolution
//!
//! Turns a validated [`RangeQuery`] into a concrete [`TimeRange`]. Explicit
//! `from`/`to` bounds win when both parse; otherwise a symbolic timescale
//! token selects a window ending now. Unknown or missing tokens fall back to
//! the last hour without raising an error.

use chrono::{DateTime, TimeDelta, Utc};

use super::types::{parse_instant, TimeRange};
use super::validation::RangeQuery;

/// Relative window ending at "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timescale {
    #[default]
    OneHour,
    SixHours,
    OneDay,
    SevenDays,
    ThirtyDays,
}

impl Timescale {
    /// Parse a timescale token, case-insensitively, including long-form aliases.
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "1h" | "1hour" => Some(Timescale::OneHour),
            "6h" | "6hours" => Some(Timescale::SixHours),
            "1d" | "1day" => Some(Timescale::OneDay),
            "7d" | "7days" | "1w" | "1week" => Some(Timescale::SevenDays),
            "30d" | "30days" | "1m" | "1month" => Some(Timescale::ThirtyDays),
            _ => None,
        }
    }

    /// Lenient parse: unknown tokens resolve to the default one-hour window
    pub fn parse_or_default(token: &str) -> Self {
        Self::parse(token).unwrap_or_default()
    }

    pub fn duration(&self) -> TimeDelta {
        match self {
            Timescale::OneHour => TimeDelta::hours(1),
            Timescale::SixHours => TimeDelta::hours(6),
            Timescale::OneDay => TimeDelta::hours(24),
            Timescale::SevenDays => TimeDelta::days(7),
            Timescale::ThirtyDays => TimeDelta::days(30),
        }
    }

    /// Window of this width ending at `now`
    pub fn range_ending_at(&self, now: DateTime<Utc>) -> TimeRange {
        TimeRange::ending_at(now, self.duration())
    }
}

/// Resolve a query against the current clock.
pub fn resolve(query: &RangeQuery) -> TimeRange {
    resolve_at(query, Utc::now())
}

/// Resolve a query against an explicit "now".
///
/// Both explicit bounds must parse for explicit mode to apply; a single
/// bound, or one that does not parse, is ignored in favour of the timescale.
pub fn resolve_at(query: &RangeQuery, now: DateTime<Utc>) -> TimeRange {
    let explicit = query
        .from
        .as_deref()
        .and_then(parse_instant)
        .zip(query.to.as_deref().and_then(parse_instant));

    if let Some((from, to)) = explicit {
        return TimeRange::new(from, to);
    }

    let timescale = query
        .timescale
        .as_deref()
        .map(Timescale::parse_or_default)
        .unwrap_or_default();

    timescale.range_ending_at(now)
}
