// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Query and control parameter validation
//!
//! Validators never fail. They copy through the recognized keys whose JSON
//! type matches and silently drop everything else, leaving defaults to the
//! resolver and the aggregation engine. Nothing downstream of this module
//! accepts untyped input.

use rocket_okapi::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::aggregation::Granularity;

/// Default number of readings fetched for a range query
pub const DEFAULT_LIMIT: usize = 1000;
/// Upper bound accepted for `limit`
pub const MAX_LIMIT: usize = 10_000;

pub const PERIOD_MIN_MS: f64 = 100.0;
pub const PERIOD_MAX_MS: f64 = 10_000.0;
pub const AMPLITUDE_MIN: f64 = 0.0;
pub const AMPLITUDE_MAX: f64 = 50.0;

const KNOWN_TIMESCALES: [&str; 14] = [
    "1h", "1hour", "6h", "6hours", "1d", "1day", "7d", "7days", "1w", "1week", "30d", "30days",
    "1m", "1month",
];

/// Sanitized range selection shared by the data and stats queries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub timescale: Option<String>,
}

/// Stats queries only carry range selection
pub type StatsQuery = RangeQuery;

/// Sanitized query of `GET /api/temperatures`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemperatureQuery {
    pub range: RangeQuery,
    pub aggregation: Option<String>,
    pub limit: Option<String>,
}

impl TemperatureQuery {
    /// Effective row limit, [`DEFAULT_LIMIT`] when absent or invalid
    pub fn effective_limit(&self) -> usize {
        parse_limit(self.limit.as_deref(), DEFAULT_LIMIT)
    }
}

/// Sensor control request surviving validation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ControlParams {
    /// Oscillation period in milliseconds, within [100, 10000]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u16>,
    /// Oscillation amplitude in °C, within [0, 50]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amplitude: Option<u16>,
    /// Whether the simulation runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl ControlParams {
    pub fn is_empty(&self) -> bool {
        self.period.is_none() && self.amplitude.is_none() && self.status.is_none()
    }
}

/// Non-empty string value of `key`, if any
fn string_field(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bounded_number(params: &Value, key: &str, min: f64, max: f64) -> Option<u16> {
    params
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| (min..=max).contains(v))
        .map(|v| v.round() as u16)
}

/// Keep the range keys of a raw query.
pub fn validate_stats_query(params: &Value) -> StatsQuery {
    RangeQuery {
        from: string_field(params, "from"),
        to: string_field(params, "to"),
        timescale: string_field(params, "timescale"),
    }
}

/// Keep the recognized keys of a raw temperature query.
pub fn validate_temperature_query(params: &Value) -> TemperatureQuery {
    TemperatureQuery {
        range: validate_stats_query(params),
        aggregation: string_field(params, "aggregation"),
        limit: string_field(params, "limit"),
    }
}

/// Keep the control fields that are correctly typed and within bounds.
///
/// `status` accepts a boolean, or a string where only `"true"` means true.
pub fn validate_control_params(params: &Value) -> ControlParams {
    let status = match params.get("status") {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => Some(s == "true"),
        _ => None,
    };

    ControlParams {
        period: bounded_number(params, "period", PERIOD_MIN_MS, PERIOD_MAX_MS),
        amplitude: bounded_number(params, "amplitude", AMPLITUDE_MIN, AMPLITUDE_MAX),
        status,
    }
}

/// Whether `limit` is a positive integer no greater than [`MAX_LIMIT`]
pub fn validate_limit(limit: &str) -> bool {
    limit
        .trim()
        .parse::<usize>()
        .map(|n| n > 0 && n <= MAX_LIMIT)
        .unwrap_or(false)
}

/// Parse a limit, substituting `default` when it is absent or invalid.
pub fn parse_limit(limit: Option<&str>, default: usize) -> usize {
    match limit {
        Some(raw) if validate_limit(raw) => raw.trim().parse().unwrap_or(default),
        _ => default,
    }
}

pub fn is_known_timescale(token: &str) -> bool {
    KNOWN_TIMESCALES.contains(&token.to_ascii_lowercase().as_str())
}

pub fn is_known_aggregation(token: &str) -> bool {
    Granularity::from_token(token).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_control_period_below_bound_is_dropped() {
        assert_eq!(validate_control_params(&json!({"period": 50})), ControlParams::default());
    }

    #[test]
    fn test_control_period_and_string_status() {
        let params = validate_control_params(&json!({"period": 5000, "status": "true"}));
        assert_eq!(
            params,
            ControlParams {
                period: Some(5000),
                amplitude: None,
                status: Some(true)
            }
        );
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({"period": 5000, "status": true})
        );
    }

    #[test]
    fn test_control_bounds_are_inclusive() {
        let params = validate_control_params(&json!({"period": 10000, "amplitude": 0}));
        assert_eq!(params.period, Some(10000));
        assert_eq!(params.amplitude, Some(0));

        let params = validate_control_params(&json!({"period": 10001, "amplitude": 50.5}));
        assert!(params.is_empty());
    }

    #[test]
    fn test_control_wrong_types_are_dropped() {
        let params = validate_control_params(&json!({
            "period": "5000",
            "amplitude": null,
            "status": 1,
            "extra": true
        }));
        assert!(params.is_empty());
    }

    #[test]
    fn test_control_status_strings() {
        assert_eq!(validate_control_params(&json!({"status": "false"})).status, Some(false));
        assert_eq!(validate_control_params(&json!({"status": "yes"})).status, Some(false));
        assert_eq!(validate_control_params(&json!({"status": false})).status, Some(false));
        assert_eq!(validate_control_params(&json!({"status": true})).status, Some(true));
    }

    #[test]
    fn test_temperature_query_keeps_only_strings() {
        let query = validate_temperature_query(&json!({
            "from": "2025-01-01T00:00:00Z",
            "to": 12,
            "timescale": "6h",
            "aggregation": "",
            "limit": "250",
            "sensor": "abc"
        }));

        assert_eq!(query.range.from.as_deref(), Some("2025-01-01T00:00:00Z"));
        assert_eq!(query.range.to, None);
        assert_eq!(query.range.timescale.as_deref(), Some("6h"));
        assert_eq!(query.aggregation, None);
        assert_eq!(query.limit.as_deref(), Some("250"));
        assert_eq!(query.effective_limit(), 250);
    }

    #[test]
    fn test_non_object_input_is_empty() {
        assert_eq!(validate_temperature_query(&json!("nope")), TemperatureQuery::default());
        assert_eq!(validate_stats_query(&Value::Null), StatsQuery::default());
        assert!(validate_control_params(&json!([1, 2])).is_empty());
    }

    #[test]
    fn test_stats_query_ignores_aggregation_and_limit() {
        let query = validate_stats_query(&json!({"timescale": "1d", "aggregation": "5min", "limit": "5"}));
        assert_eq!(
            query,
            RangeQuery {
                from: None,
                to: None,
                timescale: Some("1d".into())
            }
        );
    }

    #[test]
    fn test_limit_validity() {
        assert!(validate_limit("1"));
        assert!(validate_limit("10000"));
        assert!(!validate_limit("0"));
        assert!(!validate_limit("10001"));
        assert!(!validate_limit("-5"));
        assert!(!validate_limit("abc"));
        assert!(!validate_limit("12abc"));

        assert_eq!(parse_limit(None, DEFAULT_LIMIT), 1000);
        assert_eq!(parse_limit(Some("20000"), DEFAULT_LIMIT), 1000);
        assert_eq!(parse_limit(Some("42"), 100), 42);
        assert_eq!(parse_limit(Some("junk"), 100), 100);
    }

    #[test]
    fn test_known_tokens() {
        assert!(is_known_timescale("7D"));
        assert!(is_known_timescale("1month"));
        assert!(!is_known_timescale("2h"));
        assert!(is_known_aggregation("15min"));
        assert!(!is_known_aggregation("1h"));
        assert!(!is_known_aggregation("RAW"));
    }
}
