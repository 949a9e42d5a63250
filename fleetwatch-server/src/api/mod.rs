//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod outage;
pub mod report;
pub mod sample;
pub mod worker;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::repository::OutageStore;
use crate::service::outage_tracker::OutageTracker;
use crate::service::report_jobs::ReportJobManager;
use crate::service::status::StatusCache;

/// Shared handler state
///
/// The tracker sits behind an async mutex because both the sample poller
/// and the ingestion endpoint drive it.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OutageStore>,
    pub tracker: Arc<tokio::sync::Mutex<OutageTracker>>,
    pub status: Arc<StatusCache>,
    pub reports: Arc<ReportJobManager>,
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Report job endpoints
        .route("/api/report/{kind}", post(report::submit_report))
        .route("/api/report/status/{id}", get(report::report_status))
        // Fleet status endpoints
        .route("/api/samples", post(sample::ingest_samples))
        .route("/api/outages", post(outage::list_outages))
        .route("/api/workers", get(worker::list_workers))
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
