// Telemetry data domain models
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One sample of a sensor feed. `value` is `None` for gaps reported by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DataPoint {
    pub time_ms: i64,
    pub value: Option<f64>,
}

impl DataPoint {
    pub fn new(time_ms: i64, value: f64) -> Self {
        Self {
            time_ms,
            value: Some(value),
        }
    }

    pub fn gap(time_ms: i64) -> Self {
        Self {
            time_ms,
            value: None,
        }
    }

    /// Value usable for extrema; gaps and NaN are ignored
    pub fn comparable_value(&self) -> Option<f64> {
        self.value.filter(|v| !v.is_nan())
    }
}

/// Inclusive time extent of a series, in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub begin: i64,
    pub end: i64,
}

impl TimeRange {
    pub fn new(begin: i64, end: i64) -> Self {
        Self { begin, end }
    }

    pub fn begin_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.begin)
    }

    pub fn end_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end)
    }
}
