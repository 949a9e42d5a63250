//! Sample poller
//!
//! Polls the upstream status feed on a fixed interval and pushes each batch
//! through the status cache and the outage tracker. A failed cycle is logged
//! and the next tick retries; the loop itself never dies.

use std::sync::Arc;

use tokio::time::{self, Duration};
use tracing::{debug, info, warn};

use crate::sampler::source::{SampleSource, SourceError};
use crate::service::outage_tracker::OutageTracker;
use crate::service::status::StatusCache;

/// Drives one upstream feed into the tracker and the status cache
pub struct SamplePoller {
    source: Arc<dyn SampleSource>,
    tracker: Arc<tokio::sync::Mutex<OutageTracker>>,
    status: Arc<StatusCache>,
    poll_interval: Duration,
}

impl SamplePoller {
    pub fn new(
        source: Arc<dyn SampleSource>,
        tracker: Arc<tokio::sync::Mutex<OutageTracker>>,
        status: Arc<StatusCache>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            tracker,
            status,
            poll_interval,
        }
    }

    /// Starts the polling loop; runs until the process exits
    pub async fn run(self) {
        info!(
            "Starting sample poller (interval: {:?})",
            self.poll_interval
        );

        let mut interval = time::interval(self.poll_interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.poll_once().await {
                warn!("Sample cycle failed: {}", e);
            }
        }
    }

    /// Performs a single poll cycle
    async fn poll_once(&self) -> Result<(), SourceError> {
        let samples = self.source.fetch_samples().await?;
        debug!("Fetched {} sample(s)", samples.len());

        self.status.update(&samples);

        let failures = self.tracker.lock().await.process_samples(&samples).await;
        for failure in &failures {
            warn!(
                "outage transition failed for worker {} (retrying next cycle): {}",
                failure.worker_id, failure.error
            );
        }

        Ok(())
    }
}
