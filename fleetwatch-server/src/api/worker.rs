//! Worker Status API Handler

use axum::{Json, extract::State};
use fleetwatch_core::domain::status::WorkerStatusEntry;

use crate::api::AppState;

/// GET /api/workers
/// Live status snapshot, down workers first
pub async fn list_workers(State(state): State<AppState>) -> Json<Vec<WorkerStatusEntry>> {
    Json(state.status.snapshot())
}
