//! Report job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::report::{JobPhase, ReportKind};
use crate::dto::outage::OutageQuery;

/// Response to a successful report submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReportResponse {
    pub job_id: Uuid,
}

/// Non-binary status reply for a report job
///
/// Completed jobs are delivered as a binary body instead; `reason` is
/// present only for failed jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportStatusReply {
    pub status: JobPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReportStatusReply {
    pub fn processing() -> Self {
        Self {
            status: JobPhase::Processing,
            reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            status: JobPhase::Failed,
            reason: Some(reason.into()),
        }
    }
}

/// One row of the diagnostic job-table dump (`id = "all"`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub kind: ReportKind,
    pub query: OutageQuery,
    pub phase: JobPhase,
    pub received_chunks: usize,
    pub expected_chunks: Option<u32>,
    pub requested_at: DateTime<Utc>,
}
