//! Upstream sample source

use async_trait::async_trait;
use fleetwatch_core::domain::sample::StatusSample;
use fleetwatch_core::dto::sample::SampleDto;

/// Sample source error type
#[derive(Debug)]
pub enum SourceError {
    Http(reqwest::Error),
    InvalidSample(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Http(err) => write!(f, "upstream request failed: {}", err),
            SourceError::InvalidSample(msg) => write!(f, "invalid sample: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Http(err)
    }
}

/// Where one polling cycle's samples come from
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetches the current sample batch, one entry per reporting worker
    async fn fetch_samples(&self) -> Result<Vec<StatusSample>, SourceError>;
}

/// Sample source backed by an upstream status feed returning JSON samples
pub struct HttpSampleSource {
    url: String,
    client: reqwest::Client,
}

impl HttpSampleSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch_samples(&self) -> Result<Vec<StatusSample>, SourceError> {
        let response = self.client.get(&self.url).send().await?.error_for_status()?;

        let batch: Vec<SampleDto> = response.json().await?;

        batch
            .into_iter()
            .map(|dto| {
                dto.into_sample()
                    .map_err(|e| SourceError::InvalidSample(e.to_string()))
            })
            .collect()
    }
}
