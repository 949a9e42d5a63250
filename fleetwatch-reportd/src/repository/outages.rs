//! Outage queries for report production

use chrono::{DateTime, Utc};
use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::dto::outage::OutageQuery;
use sqlx::PgPool;
use uuid::Uuid;

/// Loads the outage records a report covers, oldest first
///
/// Same range semantics as the server's listing: the start bound filters on
/// `started_at`, the end bound admits records that are still open.
pub async fn list_range(
    pool: &PgPool,
    query: &OutageQuery,
) -> Result<Vec<OutageRecord>, sqlx::Error> {
    let start = query.start_time.and_then(DateTime::from_timestamp_millis);
    let end = query.end_time.and_then(DateTime::from_timestamp_millis);

    let rows = sqlx::query_as::<_, OutageRow>(
        r#"
        SELECT id, worker_id, started_at, ended_at, duration_ms
        FROM outages
        WHERE ($1::timestamptz IS NULL OR started_at >= $1)
          AND ($2::timestamptz IS NULL OR ended_at <= $2 OR ended_at IS NULL)
        ORDER BY started_at ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|r| r.into()).collect())
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct OutageRow {
    id: Uuid,
    worker_id: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_ms: Option<i64>,
}

impl From<OutageRow> for OutageRecord {
    fn from(row: OutageRow) -> Self {
        OutageRecord {
            id: row.id,
            worker_id: row.worker_id,
            started_at: row.started_at,
            ended_at: row.ended_at,
            duration_ms: row.duration_ms,
        }
    }
}
