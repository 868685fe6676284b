// Immutable time-series model built once per successful fetch
use super::telemetry::{DataPoint, TimeRange};
use std::sync::Arc;

pub const DEFAULT_SERIES_NAME: &str = "sensor data";

/// Queryable, read-only series. Clones share the same point buffer.
///
/// Range and extrema are computed once at build time, so repeated queries
/// on the same instance always agree.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesModel {
    name: Arc<str>,
    points: Arc<[DataPoint]>,
    time_range: Option<TimeRange>,
    min: Option<f64>,
    max: Option<f64>,
}

impl SeriesModel {
    /// Build from points assumed to be ordered by timestamp. Ordering is not checked.
    pub fn build(name: &str, points: Vec<DataPoint>) -> Self {
        let mut time_range: Option<TimeRange> = None;
        let mut min: Option<f64> = None;
        let mut max: Option<f64> = None;

        for point in &points {
            time_range = Some(match time_range {
                Some(r) => TimeRange::new(r.begin.min(point.time_ms), r.end.max(point.time_ms)),
                None => TimeRange::new(point.time_ms, point.time_ms),
            });

            if let Some(value) = point.comparable_value() {
                min = Some(min.map_or(value, |m| m.min(value)));
                max = Some(max.map_or(value, |m| m.max(value)));
            }
        }

        Self {
            name: Arc::from(name),
            points: points.into(),
            time_range,
            min,
            max,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        self.time_range
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }
}
