//! Service Module
//!
//! Business logic layer for the server: outage lifecycle tracking, the live
//! status cache, and report job supervision.

pub mod chunks;
pub mod outage_tracker;
pub mod report_jobs;
pub mod status;
