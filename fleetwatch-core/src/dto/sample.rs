//! Sample ingestion DTOs

use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::domain::sample::StatusSample;

/// One status reading as delivered by a sample source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleDto {
    pub worker_id: String,
    pub hash_rate: f64,
    /// Epoch-milliseconds
    pub observed_at: i64,
}

impl SampleDto {
    /// Converts to the domain sample, rejecting unrepresentable timestamps
    pub fn into_sample(self) -> Result<StatusSample, InvalidTimestamp> {
        let observed_at = DateTime::from_timestamp_millis(self.observed_at)
            .ok_or(InvalidTimestamp(self.observed_at))?;

        Ok(StatusSample {
            worker_id: self.worker_id,
            hash_rate: self.hash_rate,
            observed_at,
        })
    }
}

/// Epoch-millisecond timestamp outside the representable range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTimestamp(pub i64);

impl std::fmt::Display for InvalidTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "timestamp {} ms is outside the representable range", self.0)
    }
}

impl std::error::Error for InvalidTimestamp {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_sample_converts_epoch_ms() {
        let dto = SampleDto {
            worker_id: "rig-01".to_string(),
            hash_rate: 12.5,
            observed_at: 1_700_000_000_000,
        };

        let sample = dto.into_sample().unwrap();
        assert_eq!(sample.observed_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(sample.hash_rate, 12.5);
    }

    #[test]
    fn test_into_sample_rejects_out_of_range() {
        let dto = SampleDto {
            worker_id: "rig-01".to_string(),
            hash_rate: 0.0,
            observed_at: i64::MAX,
        };

        assert_eq!(dto.into_sample().unwrap_err(), InvalidTimestamp(i64::MAX));
    }
}
