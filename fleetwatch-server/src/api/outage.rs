//! Outage API Handlers

use axum::{Json, extract::State};
use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::dto::outage::OutageQuery;

use crate::api::AppState;
use crate::api::error::ApiResult;
use crate::repository::OutageStore;

/// POST /api/outages
/// List outage records in a time range; open outages sort first
pub async fn list_outages(
    State(state): State<AppState>,
    Json(query): Json<OutageQuery>,
) -> ApiResult<Json<Vec<OutageRecord>>> {
    tracing::debug!("Listing outages: {:?}", query);

    let outages = state.store.list(&query).await?;

    Ok(Json(outages))
}
