//! Fleetwatch HTTP Client
//!
//! A simple, type-safe HTTP client for the Fleetwatch server API.
//!
//! Covers report job submission and polling (with the back-off loop the
//! poll-based status contract expects of callers), outage listings, sample
//! ingestion, and the live worker status snapshot.
//!
//! # Example
//!
//! ```no_run
//! use fleetwatch_client::FleetClient;
//! use fleetwatch_core::domain::report::ReportKind;
//! use fleetwatch_core::dto::outage::OutageQuery;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = FleetClient::new("http://localhost:3001");
//!
//!     let job_id = client
//!         .submit_report(ReportKind::Summary, &OutageQuery::all())
//!         .await?;
//!     let document = client.wait_for_report(job_id, 30).await?;
//!
//!     println!("report: {} bytes", document.len());
//!     Ok(())
//! }
//! ```

pub mod error;
mod outages;
mod reports;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use reports::ReportPoll;

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Fleetwatch server API
#[derive(Debug, Clone)]
pub struct FleetClient {
    /// Base URL of the server (e.g., "http://localhost:3001")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl FleetClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the server API (e.g., "http://localhost:3001")
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Server health check
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no useful body
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
