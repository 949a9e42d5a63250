//! Outage domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A contiguous interval during which a worker's capacity metric was zero
///
/// Invariants maintained by the tracker and the store:
/// - at most one record per worker has `ended_at == None`
/// - closed intervals for a worker never overlap
/// - a record is never mutated again once closed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutageRecord {
    pub id: Uuid,
    pub worker_id: String,
    pub started_at: DateTime<Utc>,
    /// `None` while the outage is ongoing
    pub ended_at: Option<DateTime<Utc>>,
    /// Derived on close: `ended_at - started_at` in milliseconds
    pub duration_ms: Option<i64>,
}

impl OutageRecord {
    /// Creates a new open outage record
    pub fn open(worker_id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            worker_id: worker_id.into(),
            started_at,
            ended_at: None,
            duration_ms: None,
        }
    }

    /// Whether the outage is still ongoing
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Closes the outage, deriving its duration
    pub fn close(&mut self, ended_at: DateTime<Utc>) {
        self.duration_ms = Some((ended_at - self.started_at).num_milliseconds());
        self.ended_at = Some(ended_at);
    }
}
