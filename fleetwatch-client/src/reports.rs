//! Report job endpoints

use std::time::Duration;

use fleetwatch_core::domain::report::{JobPhase, ReportKind};
use fleetwatch_core::dto::outage::OutageQuery;
use fleetwatch_core::dto::report::{JobSummary, ReportStatusReply, SubmitReportResponse};
use tracing::debug;
use uuid::Uuid;

use crate::FleetClient;
use crate::error::{ClientError, Result};

/// Current state of a submitted report job
#[derive(Debug)]
pub enum ReportPoll {
    Processing,
    Completed(Vec<u8>),
    Failed(String),
}

impl FleetClient {
    /// Submit a report job
    ///
    /// A capacity rejection surfaces as an API error with status 503
    /// (`ClientError::is_capacity`); the caller backs off and retries.
    ///
    /// # Arguments
    /// * `kind` - Summary or detailed report
    /// * `query` - Time range the report covers
    ///
    /// # Returns
    /// The id to poll with
    pub async fn submit_report(&self, kind: ReportKind, query: &OutageQuery) -> Result<Uuid> {
        let url = format!("{}/api/report/{}", self.base_url, kind.as_str());
        let response = self.client.post(&url).json(query).send().await?;

        let reply: SubmitReportResponse = self.handle_response(response).await?;
        Ok(reply.job_id)
    }

    /// Poll a report job once
    ///
    /// The completed document arrives as a binary body and the server
    /// delivers it exactly once; polling a finished job again reports
    /// not-found.
    pub async fn poll_report(&self, job_id: Uuid) -> Result<ReportPoll> {
        let url = format!("{}/api/report/status/{}", self.base_url, job_id);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ClientError::NotFound(format!("job {}", job_id)));
        }
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if content_type.starts_with("application/pdf") {
            let bytes = response.bytes().await?;
            return Ok(ReportPoll::Completed(bytes.to_vec()));
        }

        let reply: ReportStatusReply = response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))?;

        match reply.status {
            JobPhase::Failed => Ok(ReportPoll::Failed(
                reply
                    .reason
                    .unwrap_or_else(|| "unknown failure".to_string()),
            )),
            _ => Ok(ReportPoll::Processing),
        }
    }

    /// Poll until the report finishes, backing off exponentially
    ///
    /// # Arguments
    /// * `job_id` - The job to wait for
    /// * `max_attempts` - Polls before giving up
    ///
    /// # Returns
    /// The document bytes; a failed job surfaces as `ClientError::ReportFailed`
    pub async fn wait_for_report(&self, job_id: Uuid, max_attempts: u32) -> Result<Vec<u8>> {
        const INITIAL_DELAY_MS: u64 = 500;
        const MAX_DELAY_MS: u64 = 15_000;

        let mut delay_ms = INITIAL_DELAY_MS;

        for attempt in 1..=max_attempts {
            match self.poll_report(job_id).await? {
                ReportPoll::Completed(bytes) => return Ok(bytes),
                ReportPoll::Failed(reason) => return Err(ClientError::ReportFailed(reason)),
                ReportPoll::Processing => {
                    debug!(
                        "Report {} still processing (attempt {}/{})",
                        job_id, attempt, max_attempts
                    );
                }
            }

            tokio::time::sleep(Duration::from_millis(delay_ms)).await;

            // Exponential backoff with cap
            delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
        }

        Err(ClientError::PollRetriesExhausted(job_id))
    }

    /// Diagnostic dump of the server's whole job table
    pub async fn dump_jobs(&self) -> Result<Vec<JobSummary>> {
        let url = format!("{}/api/report/status/all", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
