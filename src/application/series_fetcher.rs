// Port for retrieving a sensor's time series
use crate::domain::telemetry::DataPoint;
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("sensor identifier must not be empty")]
    EmptyIdentifier,

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("sensor endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed sensor response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait SeriesFetcher: Send + Sync {
    /// Fetch the time-ordered points recorded for `identifier`
    async fn fetch(&self, identifier: &str) -> Result<Vec<DataPoint>, FetchError>;
}
