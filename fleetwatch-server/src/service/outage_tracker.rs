//! Outage lifecycle tracking
//!
//! Converts one polling cycle's status samples into outage record
//! transitions: a worker going down opens a record, a worker coming back up
//! closes the open one. The tracker owns the per-worker open-outage map;
//! nothing else writes outage transitions.
//!
//! Samples within a batch are assumed monotonically increasing in
//! `observed_at` per worker; ordering across polling cycles is trusted as
//! delivered.

use std::collections::HashMap;
use std::sync::Arc;

use fleetwatch_core::domain::sample::StatusSample;
use tracing::{info, warn};
use uuid::Uuid;

use crate::repository::{OutageStore, StoreError};

/// A failed store write for one worker's transition
///
/// The tracker leaves its in-memory state untouched for that worker, so the
/// next cycle retries the same transition.
#[derive(Debug)]
pub struct OutageWriteFailure {
    pub worker_id: String,
    pub error: StoreError,
}

/// Per-worker outage state machine over a persistent store
pub struct OutageTracker {
    store: Arc<dyn OutageStore>,
    /// worker id -> open outage id; at most one entry per worker
    open: HashMap<String, Uuid>,
}

impl OutageTracker {
    /// Creates a tracker with no open outages
    #[allow(dead_code)]
    pub fn new(store: Arc<dyn OutageStore>) -> Self {
        Self {
            store,
            open: HashMap::new(),
        }
    }

    /// Creates a tracker with state rebuilt from persisted open outages
    pub async fn recover(store: Arc<dyn OutageStore>) -> Result<Self, StoreError> {
        let mut open = HashMap::new();

        for record in store.find_open().await? {
            if let Some(previous) = open.insert(record.worker_id.clone(), record.id) {
                // The store enforces one open record per worker; seeing two
                // means somebody bypassed it. Track the later one.
                warn!(
                    "worker {} has multiple open outages; tracking {} instead of {}",
                    record.worker_id, record.id, previous
                );
            }
        }

        Ok(Self { store, open })
    }

    /// Number of workers with an outage currently open
    pub fn open_count(&self) -> usize {
        self.open.len()
    }

    /// Processes one polling cycle's sample batch
    ///
    /// Samples are handled independently; a store failure for one worker
    /// never aborts the rest of the batch and is surfaced to the caller.
    /// Workers absent from the batch keep their prior state, and
    /// reprocessing an identical batch is a no-op.
    pub async fn process_samples(&mut self, samples: &[StatusSample]) -> Vec<OutageWriteFailure> {
        let mut failures = Vec::new();

        for sample in samples {
            if let Err(error) = self.apply(sample).await {
                failures.push(OutageWriteFailure {
                    worker_id: sample.worker_id.clone(),
                    error,
                });
            }
        }

        failures
    }

    /// Applies a single sample's classification to the state machine
    async fn apply(&mut self, sample: &StatusSample) -> Result<(), StoreError> {
        let worker_id = sample.worker_id.as_str();

        if sample.is_down() {
            if self.open.contains_key(worker_id) {
                // Already tracking this outage; re-observing "down" is a no-op.
                return Ok(());
            }

            let id = self.store.open_outage(worker_id, sample.observed_at).await?;
            info!(
                "outage opened for worker {} at {}",
                worker_id, sample.observed_at
            );
            self.open.insert(worker_id.to_string(), id);
        } else if let Some(&id) = self.open.get(worker_id) {
            self.store.close_outage(id, sample.observed_at).await?;
            info!(
                "outage closed for worker {} at {}",
                worker_id, sample.observed_at
            );
            self.open.remove(worker_id);
        }

        Ok(())
    }
}
