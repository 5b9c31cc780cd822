// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-sensor-monitor project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

//! Time-series core
//!
//! This module turns raw timestamped readings into query results:
//!
//! - [`validation`]: whitelists raw query and control parameters
//! - [`time_range`]: resolves explicit bounds or timescale tokens into a [`types::TimeRange`]
//! - [`aggregation`]: epoch-aligned bucketing with per-bucket means
//! - [`statistics`]: descriptive statistics with empty-range fallbacks
//! - [`service`]: the query pipeline tying the above to a reading store
//!
//! Everything except [`service`] is pure and can be called concurrently
//! without locking.

pub mod aggregation;
pub mod service;
pub mod statistics;
pub mod time_range;
pub mod types;
pub mod validation;

pub use aggregation::{aggregate, Granularity};
pub use service::TemperatureService;
pub use statistics::{summarize, StatsSummary};
pub use time_range::{resolve, Timescale};
pub use types::{AggregatedPoint, Reading, TimeRange};
