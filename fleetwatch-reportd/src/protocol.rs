//! Worker-side message protocol
//!
//! One JSON message per stdout line. Chunks go out in ascending index order;
//! the supervisor reassembles by index either way.

use anyhow::Result;
use fleetwatch_core::dto::worker::{self, SupervisorMessage, WorkerError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tracing::{debug, warn};
use uuid::Uuid;

/// Streams a finished document as base64 chunk messages
pub async fn send_document(job_id: Uuid, document: &[u8]) -> Result<()> {
    let messages = worker::chunk_messages(job_id, document);
    let total = messages.len();

    let mut stdout = tokio::io::stdout();
    for message in messages {
        debug!("Sending chunk {} of {}", message.chunk_index + 1, total);
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');
        stdout.write_all(&line).await?;
    }
    stdout.flush().await?;

    Ok(())
}

/// Reports a terminal production failure
pub async fn send_error(error: WorkerError) -> Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut line = serde_json::to_vec(&error)?;
    line.push(b'\n');
    stdout.write_all(&line).await?;
    stdout.flush().await?;

    Ok(())
}

/// Waits for the supervisor's exit signal; a closed stdin counts too
pub async fn await_exit(lines: &mut Lines<BufReader<tokio::io::Stdin>>) {
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<SupervisorMessage>(&line) {
                    Ok(SupervisorMessage::Exit) => return,
                    Ok(_) => warn!("Unexpected message while waiting for exit signal"),
                    Err(e) => warn!("Unparseable message while waiting for exit signal: {}", e),
                }
            }
            Ok(None) | Err(_) => return,
        }
    }
}
