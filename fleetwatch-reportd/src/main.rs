//! Fleetwatch report worker
//!
//! One process per report job, launched by the server. The worker reads the
//! start message on stdin, loads the requested outage range from the store,
//! produces the document, streams it back over stdout as base64 chunk
//! messages, and waits for the exit signal before terminating.
//!
//! Running report production out-of-process keeps its memory and CPU load
//! away from the serving process; a crash here fails one job, not the server.

mod config;
mod producer;
mod protocol;
mod repository;

use anyhow::{Context, Result};
use fleetwatch_core::domain::outage::OutageRecord;
use fleetwatch_core::domain::report::ReportKind;
use fleetwatch_core::dto::outage::OutageQuery;
use fleetwatch_core::dto::worker::{SupervisorMessage, WorkerError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::producer::{DocumentProducer, ReportProducer};

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is the message channel, so logging goes to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetwatch_reportd=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    let line = lines
        .next_line()
        .await
        .context("Failed to read start message")?
        .context("stdin closed before a start message arrived")?;

    let message: SupervisorMessage =
        serde_json::from_str(&line).context("Malformed start message")?;

    let SupervisorMessage::Start {
        job_id,
        kind,
        query,
    } = message
    else {
        anyhow::bail!("expected a start message, got an exit signal");
    };

    info!(
        "Report worker started for job {} ({})",
        job_id,
        kind.as_str()
    );

    match produce(&config, kind, &query).await {
        Ok(document) => {
            info!(
                "Produced {} byte document for job {}",
                document.len(),
                job_id
            );
            protocol::send_document(job_id, &document)
                .await
                .context("Failed to stream document")?;
        }
        Err(e) => {
            error!("Report production failed for job {}: {:#}", job_id, e);
            protocol::send_error(WorkerError {
                job_id,
                error: format!("{:#}", e),
            })
            .await
            .context("Failed to report production error")?;
        }
    }

    // Hold the process open until the supervisor acknowledges with an exit
    // signal or closes our stdin.
    protocol::await_exit(&mut lines).await;

    info!("Exiting report worker for job {}", job_id);
    Ok(())
}

/// Loads the outage range and renders the requested document
async fn produce(config: &Config, kind: ReportKind, query: &OutageQuery) -> Result<Vec<u8>> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let outages: Vec<OutageRecord> = repository::outages::list_range(&pool, query)
        .await
        .context("Failed to load outage records")?;

    info!("Loaded {} outage record(s)", outages.len());

    let producer = DocumentProducer::new();
    producer.produce(kind, query, &outages)
}
