//! Status sample types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One point-in-time status reading for a single worker
///
/// Samples are ephemeral input: they drive outage state transitions and the
/// live status cache but are not persisted themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSample {
    pub worker_id: String,
    /// Raw capacity metric (hash rate). Zero means the worker is down.
    pub hash_rate: f64,
    pub observed_at: DateTime<Utc>,
}

impl StatusSample {
    /// Whether this sample classifies the worker as down
    ///
    /// Only the zero/non-zero distinction drives outage boundaries; the
    /// three-tier health classification is a separate display-level concern.
    pub fn is_down(&self) -> bool {
        self.hash_rate == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rate: f64) -> StatusSample {
        StatusSample {
            worker_id: "rig-01".to_string(),
            hash_rate: rate,
            observed_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_rate_is_down() {
        assert!(sample(0.0).is_down());
    }

    #[test]
    fn test_any_nonzero_rate_is_up() {
        assert!(!sample(0.5).is_down());
        assert!(!sample(50.0).is_down());
        assert!(!sample(95_000_000_000_000.0).is_down());
    }
}
