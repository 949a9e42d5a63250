//! Outage Store
//!
//! Persistence for outage records. Open/close writes come from the outage
//! tracker; range queries serve the outage listing API. Closed records are
//! never mutated again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::dto::outage::OutageQuery;
use sqlx::PgPool;
use uuid::Uuid;

/// Store-level error type
#[derive(Debug)]
pub enum StoreError {
    Database(sqlx::Error),
    RecordNotFound(Uuid),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(err) => write!(f, "database error: {}", err),
            StoreError::RecordNotFound(id) => write!(f, "no open outage record {}", id),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

/// Persistence contract for outage records
#[async_trait]
pub trait OutageStore: Send + Sync {
    /// Creates a new open outage, returning its id
    async fn open_outage(
        &self,
        worker_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError>;

    /// Closes an open outage, setting `ended_at` and the derived duration
    async fn close_outage(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<(), StoreError>;

    /// All currently open outages, used to rebuild tracker state on startup
    async fn find_open(&self) -> Result<Vec<OutageRecord>, StoreError>;

    /// Outages matching a time-range query
    ///
    /// The start bound filters on `started_at`; the end bound admits records
    /// that ended inside the range or are still open. Open outages sort
    /// first, then newest start first.
    async fn list(&self, query: &OutageQuery) -> Result<Vec<OutageRecord>, StoreError>;
}

// =============================================================================
// Postgres implementation
// =============================================================================

pub struct PgOutageStore {
    pool: PgPool,
}

impl PgOutageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OutageStore for PgOutageStore {
    async fn open_outage(
        &self,
        worker_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO outages (id, worker_id, started_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(worker_id)
        .bind(started_at)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn close_outage(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<(), StoreError> {
        let row = sqlx::query_as::<_, OutageRow>(
            r#"
            SELECT id, worker_id, started_at, ended_at, duration_ms
            FROM outages
            WHERE id = $1 AND ended_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::RecordNotFound(id))?;

        let duration_ms = (ended_at - row.started_at).num_milliseconds();

        sqlx::query(
            r#"
            UPDATE outages
            SET ended_at = $1, duration_ms = $2
            WHERE id = $3 AND ended_at IS NULL
            "#,
        )
        .bind(ended_at)
        .bind(duration_ms)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_open(&self) -> Result<Vec<OutageRecord>, StoreError> {
        let rows = sqlx::query_as::<_, OutageRow>(
            r#"
            SELECT id, worker_id, started_at, ended_at, duration_ms
            FROM outages
            WHERE ended_at IS NULL
            ORDER BY started_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list(&self, query: &OutageQuery) -> Result<Vec<OutageRecord>, StoreError> {
        let start = ms_bound(query.start_time);
        let end = ms_bound(query.end_time);

        let rows = sqlx::query_as::<_, OutageRow>(
            r#"
            SELECT id, worker_id, started_at, ended_at, duration_ms
            FROM outages
            WHERE ($1::timestamptz IS NULL OR started_at >= $1)
              AND ($2::timestamptz IS NULL OR ended_at <= $2 OR ended_at IS NULL)
            ORDER BY (ended_at IS NULL) DESC, started_at DESC
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

/// Converts an optional epoch-ms bound; unrepresentable values mean unbounded
fn ms_bound(ms: Option<i64>) -> Option<DateTime<Utc>> {
    ms.and_then(DateTime::from_timestamp_millis)
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

// =============================================================================
// In-memory implementation
// =============================================================================

/// In-memory outage store
///
/// Used by unit tests and scenarios that don't need durability. Mirrors the
/// Postgres implementation's query semantics.
#[derive(Default)]
#[allow(dead_code)]
pub struct InMemoryOutageStore {
    records: std::sync::Mutex<Vec<OutageRecord>>,
}

#[allow(dead_code)]
impl InMemoryOutageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every stored record, in insertion order
    pub fn records(&self) -> Vec<OutageRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutageStore for InMemoryOutageStore {
    async fn open_outage(
        &self,
        worker_id: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Uuid, StoreError> {
        let record = OutageRecord::open(worker_id, started_at);
        let id = record.id;
        self.records.lock().unwrap().push(record);
        Ok(id)
    }

    async fn close_outage(&self, id: Uuid, ended_at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id && r.is_open())
            .ok_or(StoreError::RecordNotFound(id))?;
        record.close(ended_at);
        Ok(())
    }

    async fn find_open(&self) -> Result<Vec<OutageRecord>, StoreError> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| r.is_open()).cloned().collect())
    }

    async fn list(&self, query: &OutageQuery) -> Result<Vec<OutageRecord>, StoreError> {
        let start = ms_bound(query.start_time);
        let end = ms_bound(query.end_time);

        let records = self.records.lock().unwrap();
        let mut matches: Vec<OutageRecord> = records
            .iter()
            .filter(|r| start.is_none_or(|s| r.started_at >= s))
            .filter(|r| end.is_none_or(|e| r.ended_at.is_none_or(|ended| ended <= e)))
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.is_open()
                .cmp(&a.is_open())
                .then_with(|| b.started_at.cmp(&a.started_at))
        });

        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    #[tokio::test]
    async fn test_open_then_close_roundtrip() {
        let store = InMemoryOutageStore::new();

        let id = store.open_outage("rig-01", ts(100)).await.unwrap();
        assert_eq!(store.find_open().await.unwrap().len(), 1);

        store.close_outage(id, ts(220)).await.unwrap();
        assert!(store.find_open().await.unwrap().is_empty());

        let records = store.records();
        assert_eq!(records[0].duration_ms, Some(120));
    }

    #[tokio::test]
    async fn test_close_missing_record_fails() {
        let store = InMemoryOutageStore::new();
        let id = Uuid::new_v4();

        let err = store.close_outage(id, ts(100)).await.unwrap_err();
        assert!(matches!(err, StoreError::RecordNotFound(missing) if missing == id));
    }

    #[tokio::test]
    async fn test_list_orders_open_first_then_newest() {
        let store = InMemoryOutageStore::new();

        let closed = store.open_outage("rig-01", ts(1_000)).await.unwrap();
        store.close_outage(closed, ts(2_000)).await.unwrap();
        store.open_outage("rig-02", ts(500)).await.unwrap();
        let later_closed = store.open_outage("rig-03", ts(3_000)).await.unwrap();
        store.close_outage(later_closed, ts(4_000)).await.unwrap();

        let listed = store.list(&OutageQuery::all()).await.unwrap();
        assert_eq!(listed[0].worker_id, "rig-02");
        assert_eq!(listed[1].worker_id, "rig-03");
        assert_eq!(listed[2].worker_id, "rig-01");
    }

    #[tokio::test]
    async fn test_list_end_bound_admits_open_outages() {
        let store = InMemoryOutageStore::new();

        let closed = store.open_outage("rig-01", ts(1_000)).await.unwrap();
        store.close_outage(closed, ts(9_000)).await.unwrap();
        store.open_outage("rig-02", ts(1_500)).await.unwrap();

        let query = OutageQuery {
            start_time: Some(0),
            end_time: Some(5_000),
        };
        let listed = store.list(&query).await.unwrap();

        // The closed record ended after the window; the open one still shows.
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].worker_id, "rig-02");
    }

    #[tokio::test]
    async fn test_list_start_bound_filters_on_started_at() {
        let store = InMemoryOutageStore::new();

        store.open_outage("rig-01", ts(1_000)).await.unwrap();
        store.open_outage("rig-02", ts(5_000)).await.unwrap();

        let query = OutageQuery {
            start_time: Some(2_000),
            end_time: None,
        };
        let listed = store.list(&query).await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].worker_id, "rig-02");
    }
}
