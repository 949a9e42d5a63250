//! Outage query DTOs

use serde::{Deserialize, Serialize};

/// Time-range filter over outage records, epoch-milliseconds
///
/// Both bounds are optional. The end bound admits still-open outages, so a
/// report over a window includes outages that have not recovered yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutageQuery {
    pub start_time: Option<i64>,
    pub end_time: Option<i64>,
}

impl OutageQuery {
    /// Unbounded query matching every record
    pub fn all() -> Self {
        Self::default()
    }
}
