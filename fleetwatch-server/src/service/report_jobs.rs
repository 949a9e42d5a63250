//! Report job supervision
//!
//! Accepts report requests, enforces the concurrency ceiling, runs each job
//! in an isolated worker process, and reassembles the chunked result the
//! worker streams back over its stdout. The job table is owned exclusively
//! by the manager; callers see only the submit/poll/snapshot contract.
//!
//! Report production is memory- and CPU-heavy, so the ceiling is a plain
//! admission gate: a rejected caller retries later, nothing is queued.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use fleetwatch_core::domain::report::{JobPhase, ReportKind};
use fleetwatch_core::dto::outage::OutageQuery;
use fleetwatch_core::dto::report::JobSummary;
use fleetwatch_core::dto::worker::{SupervisorMessage, WorkerMessage};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, Command};
use tracing::{info, warn};
use uuid::Uuid;

use crate::service::chunks::ChunkAssembly;

/// Admission ceiling: report jobs in flight at once
pub const MAX_ACTIVE_JOBS: usize = 2;

/// How long to wait for a signalled worker to exit before killing it
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Per-job state machine; Completed and Failed are terminal
#[derive(Debug)]
enum JobState {
    Waiting,
    Processing,
    Completed(Vec<u8>),
    Failed(String),
}

impl JobState {
    fn phase(&self) -> JobPhase {
        match self {
            JobState::Waiting => JobPhase::Waiting,
            JobState::Processing => JobPhase::Processing,
            JobState::Completed(_) => JobPhase::Completed,
            JobState::Failed(_) => JobPhase::Failed,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed(_) | JobState::Failed(_))
    }
}

/// One report job and the chunks received for it so far
#[derive(Debug)]
struct ReportJob {
    id: Uuid,
    kind: ReportKind,
    query: OutageQuery,
    state: JobState,
    assembly: ChunkAssembly,
    requested_at: DateTime<Utc>,
}

/// Outcome of a status poll
#[derive(Debug)]
pub enum PollOutcome {
    NotFound,
    Processing,
    Completed(Vec<u8>),
    Failed(String),
}

/// Admission rejection: both slots are busy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TooManyJobs;

impl std::fmt::Display for TooManyJobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "too many report jobs in progress")
    }
}

impl std::error::Error for TooManyJobs {}

type JobTable = Mutex<HashMap<Uuid, ReportJob>>;

/// Supervises report jobs and their worker processes
pub struct ReportJobManager {
    jobs: Arc<JobTable>,
    worker_bin: String,
    database_url: String,
}

impl ReportJobManager {
    pub fn new(worker_bin: String, database_url: String) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            worker_bin,
            database_url,
        }
    }

    /// Accepts a report request, or rejects it at the concurrency ceiling
    ///
    /// On acceptance the job is recorded, a worker process is launched for
    /// it, and the id is returned immediately; completion is observed via
    /// `poll_status`. A launch failure is surfaced through the job's state
    /// rather than the submit result, so the contract stays
    /// "id or too-many-jobs".
    pub async fn submit(&self, kind: ReportKind, query: OutageQuery) -> Result<Uuid, TooManyJobs> {
        let job_id = self.admit(kind, query.clone())?;

        match self.spawn_worker(job_id, kind, query).await {
            Ok((child, stdin)) => {
                self.transition(job_id, JobState::Processing);
                self.spawn_reader(job_id, child, stdin);
                info!("report job {} processing ({})", job_id, kind.as_str());
            }
            Err(e) => {
                Self::fail_job(
                    &self.jobs,
                    job_id,
                    format!("failed to launch report worker: {}", e),
                );
            }
        }

        Ok(job_id)
    }

    /// Non-blocking status poll
    ///
    /// Completed and Failed are delivered exactly once: serving either
    /// removes the job from the table, so a later poll of the same id
    /// reports NotFound.
    pub fn poll_status(&self, job_id: Uuid) -> PollOutcome {
        let mut jobs = self.jobs.lock().unwrap();

        let Some(job) = jobs.get(&job_id) else {
            return PollOutcome::NotFound;
        };
        if !job.state.is_terminal() {
            return PollOutcome::Processing;
        }

        match jobs.remove(&job_id).map(|job| job.state) {
            Some(JobState::Completed(buffer)) => PollOutcome::Completed(buffer),
            Some(JobState::Failed(reason)) => PollOutcome::Failed(reason),
            _ => PollOutcome::NotFound,
        }
    }

    /// Diagnostic dump of the whole job table, oldest first
    pub fn snapshot(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.lock().unwrap();
        let mut rows: Vec<JobSummary> = jobs
            .values()
            .map(|job| JobSummary {
                id: job.id,
                kind: job.kind,
                query: job.query.clone(),
                phase: job.state.phase(),
                received_chunks: job.assembly.received(),
                expected_chunks: job.assembly.expected(),
                requested_at: job.requested_at,
            })
            .collect();
        rows.sort_by_key(|row| row.requested_at);
        rows
    }

    /// Records a job as Waiting if a concurrency slot is free
    fn admit(&self, kind: ReportKind, query: OutageQuery) -> Result<Uuid, TooManyJobs> {
        let mut jobs = self.jobs.lock().unwrap();

        let active = jobs.values().filter(|j| !j.state.is_terminal()).count();
        if active >= MAX_ACTIVE_JOBS {
            return Err(TooManyJobs);
        }

        let job = ReportJob {
            id: Uuid::new_v4(),
            kind,
            query,
            state: JobState::Waiting,
            assembly: ChunkAssembly::new(),
            requested_at: Utc::now(),
        };
        let job_id = job.id;
        jobs.insert(job_id, job);

        Ok(job_id)
    }

    /// Launches the worker process for a job and hands it the start message
    async fn spawn_worker(
        &self,
        job_id: Uuid,
        kind: ReportKind,
        query: OutageQuery,
    ) -> std::io::Result<(Child, ChildStdin)> {
        let mut child = Command::new(&self.worker_bin)
            .env("DATABASE_URL", &self.database_url)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child.stdin.take().expect("worker stdin was piped");

        let start = SupervisorMessage::Start {
            job_id,
            kind,
            query,
        };
        let mut line = serde_json::to_vec(&start).expect("start message serializes");
        line.push(b'\n');
        stdin.write_all(&line).await?;
        stdin.flush().await?;

        Ok((child, stdin))
    }

    /// Spawns the task that consumes one worker's stdout until the job
    /// reaches a terminal state or the worker goes away
    fn spawn_reader(&self, job_id: Uuid, mut child: Child, mut stdin: ChildStdin) {
        let jobs = Arc::clone(&self.jobs);

        tokio::spawn(async move {
            let stdout = child.stdout.take().expect("worker stdout was piped");
            let mut lines = BufReader::new(stdout).lines();

            let worker_gone = loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let terminal = match serde_json::from_str::<WorkerMessage>(&line) {
                            Ok(message) => Self::apply_message(&jobs, job_id, message),
                            Err(e) => {
                                Self::fail_job(
                                    &jobs,
                                    job_id,
                                    format!("malformed worker message: {}", e),
                                );
                                true
                            }
                        };
                        if terminal {
                            break false;
                        }
                    }
                    Ok(None) => {
                        // stdout closed with the job still in flight
                        Self::fail_job(&jobs, job_id, "worker exited unexpectedly".to_string());
                        break true;
                    }
                    Err(e) => {
                        Self::fail_job(&jobs, job_id, format!("error reading worker output: {}", e));
                        break false;
                    }
                }
            };

            if worker_gone {
                let _ = child.wait().await;
                return;
            }

            // Terminal state reached: signal the worker to exit, then reap it.
            let mut exit_line =
                serde_json::to_vec(&SupervisorMessage::Exit).expect("exit message serializes");
            exit_line.push(b'\n');
            if stdin.write_all(&exit_line).await.is_err() || stdin.flush().await.is_err() {
                let _ = child.start_kill();
            }
            drop(stdin);

            match tokio::time::timeout(EXIT_GRACE, child.wait()).await {
                Ok(Ok(status)) => info!("job {}: worker exited with {}", job_id, status),
                Ok(Err(e)) => warn!("job {}: failed to reap worker: {}", job_id, e),
                Err(_) => {
                    warn!("job {}: worker ignored exit signal, killing", job_id);
                    let _ = child.kill().await;
                }
            }
        });
    }

    /// Applies one worker message to the job table; returns whether the job
    /// reached a terminal state
    fn apply_message(jobs: &JobTable, owned_job: Uuid, message: WorkerMessage) -> bool {
        match message {
            WorkerMessage::Chunk(chunk) => {
                if chunk.job_id != owned_job {
                    warn!(
                        "ignoring chunk for job {} on channel owned by {}",
                        chunk.job_id, owned_job
                    );
                    return false;
                }

                let bytes = match chunk.decode() {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        Self::fail_job(jobs, owned_job, format!("undecodable chunk payload: {}", e));
                        return true;
                    }
                };

                let mut jobs = jobs.lock().unwrap();
                let Some(job) = jobs.get_mut(&owned_job) else {
                    return true;
                };
                if job.state.is_terminal() {
                    return true;
                }

                job.assembly
                    .insert(chunk.chunk_index, bytes, chunk.total_chunks_expected);

                if job.assembly.is_complete() {
                    job.state = JobState::Completed(job.assembly.assemble());
                    info!(
                        "report job {} completed ({} chunk(s))",
                        owned_job,
                        job.assembly.received()
                    );
                    return true;
                }

                false
            }
            WorkerMessage::Error(err) => {
                if err.job_id != owned_job {
                    warn!(
                        "error message for job {} on channel owned by {}",
                        err.job_id, owned_job
                    );
                }
                Self::fail_job(jobs, owned_job, err.error);
                true
            }
        }
    }

    /// Marks a job Failed unless it already reached a terminal state
    fn fail_job(jobs: &JobTable, job_id: Uuid, reason: String) {
        let mut jobs = jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            if !job.state.is_terminal() {
                warn!("report job {} failed: {}", job_id, reason);
                job.state = JobState::Failed(reason);
            }
        }
    }

    /// Moves a non-terminal job into a new state
    fn transition(&self, job_id: Uuid, state: JobState) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs.get_mut(&job_id) {
            if !job.state.is_terminal() {
                job.state = state;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetwatch_core::dto::worker::{ChunkMessage, WorkerError};

    fn manager() -> ReportJobManager {
        ReportJobManager::new(
            "fleetwatch-reportd".to_string(),
            "postgres://unused".to_string(),
        )
    }

    fn chunk(job_id: Uuid, index: u32, total: u32, bytes: &[u8]) -> WorkerMessage {
        WorkerMessage::Chunk(ChunkMessage::encode(job_id, index, total, bytes))
    }

    #[test]
    fn test_third_submit_rejected_until_a_slot_frees() {
        let manager = manager();

        let first = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(first, JobState::Processing);
        let second = manager
            .admit(ReportKind::Detailed, OutageQuery::all())
            .unwrap();
        manager.transition(second, JobState::Processing);

        assert_eq!(
            manager.admit(ReportKind::Summary, OutageQuery::all()),
            Err(TooManyJobs)
        );

        // One job fails; its slot opens up.
        ReportJobManager::apply_message(
            &manager.jobs,
            first,
            WorkerMessage::Error(WorkerError {
                job_id: first,
                error: "render failed".to_string(),
            }),
        );
        assert!(manager.admit(ReportKind::Summary, OutageQuery::all()).is_ok());
    }

    #[test]
    fn test_chunks_arriving_out_of_order_complete_the_job() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        assert!(!ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 2, 3, b"cc")
        ));
        assert!(!ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 0, 3, b"aa")
        ));
        assert!(ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 1, 3, b"bb")
        ));

        match manager.poll_status(job_id) {
            PollOutcome::Completed(buffer) => assert_eq!(buffer, b"aabbcc"),
            other => panic!("expected completed, got {:?}", other),
        }

        // Single delivery: the job is gone now.
        assert!(matches!(manager.poll_status(job_id), PollOutcome::NotFound));
    }

    #[test]
    fn test_retransmitted_chunk_does_not_complete_early() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        assert!(!ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 0, 2, b"xx")
        ));
        assert!(!ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 0, 2, b"xx")
        ));
        assert!(matches!(manager.poll_status(job_id), PollOutcome::Processing));
    }

    #[test]
    fn test_worker_error_fails_the_job_terminally() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Detailed, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        assert!(ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            WorkerMessage::Error(WorkerError {
                job_id,
                error: "render failed".to_string(),
            }),
        ));

        // A chunk after the terminal error changes nothing.
        assert!(ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(job_id, 0, 1, b"late")
        ));

        match manager.poll_status(job_id) {
            PollOutcome::Failed(reason) => assert_eq!(reason, "render failed"),
            other => panic!("expected failed, got {:?}", other),
        }
        assert!(matches!(manager.poll_status(job_id), PollOutcome::NotFound));
    }

    #[test]
    fn test_worker_exit_without_terminal_message_fails_the_job() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        ReportJobManager::fail_job(&manager.jobs, job_id, "worker exited unexpectedly".to_string());

        match manager.poll_status(job_id) {
            PollOutcome::Failed(reason) => assert_eq!(reason, "worker exited unexpectedly"),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[test]
    fn test_terminal_failure_is_not_overwritten() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        ReportJobManager::fail_job(&manager.jobs, job_id, "first".to_string());
        ReportJobManager::fail_job(&manager.jobs, job_id, "second".to_string());

        match manager.poll_status(job_id) {
            PollOutcome::Failed(reason) => assert_eq!(reason, "first"),
            other => panic!("expected failed, got {:?}", other),
        }
    }

    #[test]
    fn test_poll_unknown_id_reports_not_found() {
        let manager = manager();
        assert!(matches!(
            manager.poll_status(Uuid::new_v4()),
            PollOutcome::NotFound
        ));
    }

    #[test]
    fn test_chunk_for_foreign_job_is_ignored() {
        let manager = manager();
        let job_id = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(job_id, JobState::Processing);

        let foreign = Uuid::new_v4();
        assert!(!ReportJobManager::apply_message(
            &manager.jobs,
            job_id,
            chunk(foreign, 0, 1, b"stray")
        ));
        assert!(matches!(manager.poll_status(job_id), PollOutcome::Processing));
    }

    #[test]
    fn test_snapshot_reports_phases_and_chunk_counts() {
        let manager = manager();
        let processing = manager.admit(ReportKind::Summary, OutageQuery::all()).unwrap();
        manager.transition(processing, JobState::Processing);
        ReportJobManager::apply_message(&manager.jobs, processing, chunk(processing, 0, 3, b"a"));

        let rows = manager.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].phase, JobPhase::Processing);
        assert_eq!(rows[0].received_chunks, 1);
        assert_eq!(rows[0].expected_chunks, Some(3));
    }
}
