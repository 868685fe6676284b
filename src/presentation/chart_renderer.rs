// Chart renderer - Pure mapping from widget state to a view tree
use crate::domain::series::SeriesModel;
use crate::domain::telemetry::{DataPoint, TimeRange};
use crate::domain::widget::WidgetState;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const CHART_TIME_FORMAT: &str = "%b '%y";
pub const CHART_WIDTH: u32 = 400;
pub const ROW_HEIGHT: u32 = 150;
pub const AXIS_WIDTH: u32 = 30;
pub const VALUE_AXIS_ID: &str = "value";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetView {
    pub lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartContainer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartContainer {
    pub time_range: TimeRange,
    pub format: String,
    pub begin_label: String,
    pub end_label: String,
    pub width: u32,
    pub rows: Vec<ChartRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRow {
    pub height: u32,
    pub y_axis: YAxis,
    pub charts: Vec<LineChart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YAxis {
    pub id: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineChart {
    pub axis: String,
    pub name: String,
    pub points: Vec<DataPoint>,
}

pub fn render(state: &WidgetState) -> WidgetView {
    WidgetView {
        lines: vec![
            format!("Element Name: {}", state.label),
            format!("Element Id: {}", state.identifier),
        ],
        chart: state.series.as_ref().and_then(render_chart),
    }
}

/// A series without a time range or without any plottable value has nothing to draw
fn render_chart(series: &SeriesModel) -> Option<ChartContainer> {
    let time_range = series.time_range()?;
    let (min, max) = (series.min()?, series.max()?);

    Some(ChartContainer {
        time_range,
        format: CHART_TIME_FORMAT.to_string(),
        begin_label: format_time(time_range.begin_utc()),
        end_label: format_time(time_range.end_utc()),
        width: CHART_WIDTH,
        rows: vec![ChartRow {
            height: ROW_HEIGHT,
            y_axis: YAxis {
                id: VALUE_AXIS_ID.to_string(),
                label: "Value".to_string(),
                min,
                max,
                width: AXIS_WIDTH,
            },
            charts: vec![LineChart {
                axis: VALUE_AXIS_ID.to_string(),
                name: series.name().to_string(),
                points: series.points().to_vec(),
            }],
        }],
    })
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format(CHART_TIME_FORMAT).to_string())
        .unwrap_or_default()
}
