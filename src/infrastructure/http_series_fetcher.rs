// HTTP sensor feed implementation
use crate::application::series_fetcher::{FetchError, SeriesFetcher};
use crate::domain::telemetry::DataPoint;
use crate::infrastructure::config::WidgetConfig;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct HttpSeriesFetcher {
    client: reqwest::Client,
    base_url: String,
    project: String,
}

#[derive(Debug, Deserialize)]
struct SensorResponse {
    data: Vec<Vec<Value>>,
}

impl HttpSeriesFetcher {
    pub fn new(base_url: &str, project: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            project: project.into(),
        }
    }

    /// `None` when no endpoint is configured
    pub fn from_config(config: &WidgetConfig) -> Option<Self> {
        config
            .sensor_endpoint()
            .map(|endpoint| Self::new(endpoint, config.project.clone()))
    }

    fn build_sensor_url(&self, identifier: &str) -> String {
        format!(
            "{}/project/{}/sensor/{}",
            self.base_url,
            urlencoding::encode(&self.project),
            urlencoding::encode(identifier)
        )
    }
}

#[async_trait]
impl SeriesFetcher for HttpSeriesFetcher {
    async fn fetch(&self, identifier: &str) -> Result<Vec<DataPoint>, FetchError> {
        if identifier.is_empty() {
            return Err(FetchError::EmptyIdentifier);
        }

        let url = self.build_sensor_url(identifier);
        tracing::debug!("Fetching sensor series: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { url, source })?;

        parse_sensor_body(&body)
    }
}

/// Decode `{ "data": [[timestamp, value], ...] }`
pub fn parse_sensor_body(body: &[u8]) -> Result<Vec<DataPoint>, FetchError> {
    let response: SensorResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    response
        .data
        .iter()
        .enumerate()
        .map(|(index, row)| parse_row(row).map_err(|reason| FetchError::Malformed(format!("row {index}: {reason}"))))
        .collect()
}

fn parse_row(row: &[Value]) -> Result<DataPoint, String> {
    let [timestamp, value] = row else {
        return Err(format!("expected [timestamp, value], got {} columns", row.len()));
    };

    let time_ms = parse_timestamp(timestamp).ok_or_else(|| format!("unreadable timestamp {timestamp}"))?;
    match value {
        Value::Null => Ok(DataPoint::gap(time_ms)),
        Value::Number(n) => n
            .as_f64()
            .map(|v| DataPoint::new(time_ms, v))
            .ok_or_else(|| format!("value {n} out of range")),
        other => Err(format!("non-numeric value {other}")),
    }
}

/// Epoch millis from a number or a string timestamp
fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => parse_timestamp_str(s.trim()),
        _ => None,
    }
}

/// RFC 3339, then index strings (`1d-19723`, `2024`, `2024-04`, `2024-04-02`),
/// then a bare integer of epoch millis.
fn parse_timestamp_str(s: &str) -> Option<i64> {
    if let Ok(time) = DateTime::parse_from_rfc3339(s) {
        return Some(time.timestamp_millis());
    }
    if let Some(ms) = parse_duration_index(s) {
        return Some(ms);
    }
    let date = if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        NaiveDate::from_ymd_opt(s.parse().ok()?, 1, 1)
    } else {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d"))
            .ok()
    };
    match date {
        Some(date) => Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()),
        None => s.parse::<i64>().ok(),
    }
}

/// `<n><unit>-<k>`: the k-th bucket of width n units since the epoch
fn parse_duration_index(s: &str) -> Option<i64> {
    let (window, bucket) = s.split_once('-')?;
    let unit_at = window.find(|c: char| !c.is_ascii_digit())?;
    let (count, unit) = window.split_at(unit_at);
    let unit_ms: i64 = match unit {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        _ => return None,
    };
    let count: i64 = count.parse().ok()?;
    let bucket: i64 = bucket.parse().ok()?;
    bucket.checked_mul(count)?.checked_mul(unit_ms)
}
