//! Sample Ingestion API Handler
//!
//! Inbound contract for an external sample source pushing one polling
//! cycle's batch instead of being polled.

use axum::{Json, extract::State, http::StatusCode};
use fleetwatch_core::domain::sample::StatusSample;
use fleetwatch_core::dto::sample::SampleDto;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};

/// POST /api/samples
/// Push one cycle's sample batch through the status cache and the outage
/// tracker. Store failures are logged and retried on the next cycle.
pub async fn ingest_samples(
    State(state): State<AppState>,
    Json(batch): Json<Vec<SampleDto>>,
) -> ApiResult<StatusCode> {
    let mut samples: Vec<StatusSample> = Vec::with_capacity(batch.len());
    for dto in batch {
        samples.push(
            dto.into_sample()
                .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        );
    }

    tracing::debug!("Ingesting {} sample(s)", samples.len());

    state.status.update(&samples);

    let failures = state.tracker.lock().await.process_samples(&samples).await;
    for failure in &failures {
        tracing::warn!(
            "outage transition failed for worker {} (retrying next cycle): {}",
            failure.worker_id,
            failure.error
        );
    }

    Ok(StatusCode::ACCEPTED)
}
