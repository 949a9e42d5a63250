//! Worker health classification

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Capacity metric at or below which a worker counts as degraded rather than up
pub const DEGRADED_CEILING: f64 = 50.0;

/// Three-tier worker health used by the live status surface
///
/// The outage tracker only cares about down vs not-down; this finer
/// classification feeds the `/api/workers` snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerHealth {
    Down,
    Degraded,
    Up,
}

impl WorkerHealth {
    /// Classifies a raw capacity metric
    pub fn from_hash_rate(hash_rate: f64) -> Self {
        if hash_rate == 0.0 {
            WorkerHealth::Down
        } else if hash_rate <= DEGRADED_CEILING {
            WorkerHealth::Degraded
        } else {
            WorkerHealth::Up
        }
    }
}

/// One worker's latest classification, as served by the status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStatusEntry {
    pub worker_id: String,
    pub health: WorkerHealth,
    pub hash_rate: f64,
    pub last_seen: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_tiers() {
        assert_eq!(WorkerHealth::from_hash_rate(0.0), WorkerHealth::Down);
        assert_eq!(WorkerHealth::from_hash_rate(1.0), WorkerHealth::Degraded);
        assert_eq!(WorkerHealth::from_hash_rate(50.0), WorkerHealth::Degraded);
        assert_eq!(WorkerHealth::from_hash_rate(50.1), WorkerHealth::Up);
    }

    #[test]
    fn test_wire_format_is_lowercase() {
        assert_eq!(serde_json::to_string(&WorkerHealth::Down).unwrap(), "\"down\"");
        assert_eq!(serde_json::to_string(&WorkerHealth::Degraded).unwrap(), "\"degraded\"");
        assert_eq!(serde_json::to_string(&WorkerHealth::Up).unwrap(), "\"up\"");
    }
}
