//! Supervisor <-> report worker message protocol
//!
//! The server and each report worker process exchange JSON lines over the
//! worker's stdin/stdout. Chunk payloads are base64-encoded so the binary
//! document can ride inside JSON text. Chunks are emitted in ascending index
//! order but the receiver must not rely on that: reassembly is keyed by
//! `chunk_index`, and completion is detected by the count of distinct
//! indices reaching `total_chunks_expected`.

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::report::ReportKind;
use crate::dto::outage::OutageQuery;

/// Size of one result chunk: 1 MiB of raw bytes before encoding
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Messages from the supervisor to a worker process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SupervisorMessage {
    /// Begin producing the report for this job
    Start {
        job_id: Uuid,
        kind: ReportKind,
        query: OutageQuery,
    },
    /// Terminate; sent once the supervisor has seen a terminal message
    Exit,
}

/// Messages from a worker process back to the supervisor
///
/// The two shapes share `job_id` and differ in their remaining fields, so
/// they travel untagged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkerMessage {
    Chunk(ChunkMessage),
    Error(WorkerError),
}

/// One base64-encoded slice of the finished document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMessage {
    pub job_id: Uuid,
    pub chunk: String,
    pub chunk_index: u32,
    pub total_chunks_expected: u32,
}

impl ChunkMessage {
    /// Builds a message by encoding raw bytes
    pub fn encode(job_id: Uuid, chunk_index: u32, total_chunks_expected: u32, bytes: &[u8]) -> Self {
        Self {
            job_id,
            chunk: general_purpose::STANDARD.encode(bytes),
            chunk_index,
            total_chunks_expected,
        }
    }

    /// Decodes this message's payload back into raw bytes
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(&self.chunk)
    }
}

/// Terminal failure report for a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerError {
    pub job_id: Uuid,
    pub error: String,
}

/// Splits a finished document into chunk messages in ascending index order
///
/// An empty document still yields one empty chunk so the receiver learns the
/// expected total and completes.
pub fn chunk_messages(job_id: Uuid, buffer: &[u8]) -> Vec<ChunkMessage> {
    chunk_messages_with(job_id, buffer, CHUNK_SIZE)
}

fn chunk_messages_with(job_id: Uuid, buffer: &[u8], chunk_size: usize) -> Vec<ChunkMessage> {
    if buffer.is_empty() {
        return vec![ChunkMessage {
            job_id,
            chunk: String::new(),
            chunk_index: 0,
            total_chunks_expected: 1,
        }];
    }

    let total = buffer.len().div_ceil(chunk_size) as u32;

    buffer
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, slice)| ChunkMessage::encode(job_id, i as u32, total, slice))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_covers_whole_buffer() {
        let job_id = Uuid::new_v4();
        let buffer: Vec<u8> = (0..=255).cycle().take(10).collect();

        let messages = chunk_messages_with(job_id, &buffer, 4);
        assert_eq!(messages.len(), 3);
        assert!(messages.iter().all(|m| m.total_chunks_expected == 3));

        let rejoined: Vec<u8> = messages
            .iter()
            .flat_map(|m| m.decode().unwrap())
            .collect();
        assert_eq!(rejoined, buffer);
    }

    #[test]
    fn test_final_chunk_is_short() {
        let job_id = Uuid::new_v4();
        let buffer = vec![7u8; 10];

        let messages = chunk_messages_with(job_id, &buffer, 4);
        assert_eq!(messages[2].decode().unwrap().len(), 2);
    }

    #[test]
    fn test_empty_buffer_yields_single_empty_chunk() {
        let messages = chunk_messages(Uuid::new_v4(), &[]);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].total_chunks_expected, 1);
        assert!(messages[0].decode().unwrap().is_empty());
    }

    #[test]
    fn test_single_chunk_document() {
        let messages = chunk_messages(Uuid::new_v4(), b"report bytes");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].chunk_index, 0);
        assert_eq!(messages[0].total_chunks_expected, 1);
        assert_eq!(messages[0].decode().unwrap(), b"report bytes");
    }

    #[test]
    fn test_worker_message_deserializes_untagged() {
        let job_id = Uuid::new_v4();

        let chunk_line = format!(
            r#"{{"job_id":"{job_id}","chunk":"aGk=","chunk_index":0,"total_chunks_expected":1}}"#
        );
        match serde_json::from_str::<WorkerMessage>(&chunk_line).unwrap() {
            WorkerMessage::Chunk(msg) => {
                assert_eq!(msg.job_id, job_id);
                assert_eq!(msg.decode().unwrap(), b"hi");
            }
            other => panic!("expected chunk, got {:?}", other),
        }

        let error_line = format!(r#"{{"job_id":"{job_id}","error":"render failed"}}"#);
        match serde_json::from_str::<WorkerMessage>(&error_line).unwrap() {
            WorkerMessage::Error(msg) => assert_eq!(msg.error, "render failed"),
            other => panic!("expected error, got {:?}", other),
        }
    }

    #[test]
    fn test_supervisor_message_is_tagged() {
        let exit = serde_json::to_string(&SupervisorMessage::Exit).unwrap();
        assert_eq!(exit, r#"{"type":"exit"}"#);

        let start = SupervisorMessage::Start {
            job_id: Uuid::new_v4(),
            kind: ReportKind::Summary,
            query: OutageQuery::all(),
        };
        let line = serde_json::to_string(&start).unwrap();
        assert!(line.contains(r#""type":"start""#));
        assert!(line.contains(r#""kind":"summary""#));
    }
}
