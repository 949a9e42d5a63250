//! Data Transfer Objects for external communication
//!
//! This module contains the shapes that cross process boundaries: the HTTP
//! API surface and the JSON-lines protocol between the server and its report
//! worker processes. Timestamps are integer epoch-milliseconds at these
//! boundaries and are converted to domain types at the edge.

pub mod outage;
pub mod report;
pub mod sample;
pub mod worker;
