//! Live worker status cache
//!
//! In-memory cache of each worker's latest classification, updated once per
//! polling cycle and served by `GET /api/workers`. A worker absent from a
//! batch keeps its previous entry.

use std::collections::HashMap;
use std::sync::Mutex;

use fleetwatch_core::domain::sample::StatusSample;
use fleetwatch_core::domain::status::{WorkerHealth, WorkerStatusEntry};

#[derive(Default)]
pub struct StatusCache {
    entries: Mutex<HashMap<String, WorkerStatusEntry>>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one cycle's samples
    pub fn update(&self, samples: &[StatusSample]) {
        let mut entries = self.entries.lock().unwrap();
        for sample in samples {
            entries.insert(
                sample.worker_id.clone(),
                WorkerStatusEntry {
                    worker_id: sample.worker_id.clone(),
                    health: WorkerHealth::from_hash_rate(sample.hash_rate),
                    hash_rate: sample.hash_rate,
                    last_seen: sample.observed_at,
                },
            );
        }
    }

    /// Current snapshot: down workers first, then degraded, then up,
    /// worker id breaking ties
    pub fn snapshot(&self) -> Vec<WorkerStatusEntry> {
        let entries = self.entries.lock().unwrap();
        let mut snapshot: Vec<WorkerStatusEntry> = entries.values().cloned().collect();
        snapshot.sort_by(|a, b| {
            severity_rank(a.health)
                .cmp(&severity_rank(b.health))
                .then_with(|| a.worker_id.cmp(&b.worker_id))
        });
        snapshot
    }
}

fn severity_rank(health: WorkerHealth) -> u8 {
    match health {
        WorkerHealth::Down => 0,
        WorkerHealth::Degraded => 1,
        WorkerHealth::Up => 2,
    }
}
