//! Report API Handlers
//!
//! HTTP endpoints for report job submission and status polling. A completed
//! job's document is delivered as a binary body exactly once; processing and
//! failure states travel as JSON.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use fleetwatch_core::domain::report::ReportKind;
use fleetwatch_core::dto::outage::OutageQuery;
use fleetwatch_core::dto::report::{ReportStatusReply, SubmitReportResponse};
use uuid::Uuid;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::report_jobs::PollOutcome;

/// POST /api/report/{kind}
/// Submit a report job; rejected with 503 while both slots are busy
pub async fn submit_report(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(query): Json<OutageQuery>,
) -> ApiResult<Json<SubmitReportResponse>> {
    let kind = ReportKind::parse(&kind)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown report kind: {}", kind)))?;

    tracing::info!("Submitting {} report job", kind.as_str());

    let job_id = state
        .reports
        .submit(kind, query)
        .await
        .map_err(|e| ApiError::Capacity(e.to_string()))?;

    Ok(Json(SubmitReportResponse { job_id }))
}

/// GET /api/report/status/{id}
/// Poll a report job; `id = "all"` dumps the whole job table for inspection
pub async fn report_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    if id == "all" {
        return Ok(Json(state.reports.snapshot()).into_response());
    }

    let job_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid job id: {}", id)))?;

    let response = match state.reports.poll_status(job_id) {
        PollOutcome::NotFound => {
            return Err(ApiError::NotFound(format!("Job {} not found", job_id)));
        }
        PollOutcome::Processing => Json(ReportStatusReply::processing()).into_response(),
        PollOutcome::Completed(buffer) => {
            tracing::info!("Delivering report for job {} ({} bytes)", job_id, buffer.len());
            ([(header::CONTENT_TYPE, "application/pdf")], buffer).into_response()
        }
        PollOutcome::Failed(reason) => Json(ReportStatusReply::failed(reason)).into_response(),
    };

    Ok(response)
}
