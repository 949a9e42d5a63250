//! Sample polling layer
//!
//! Pulls status samples from the upstream feed on a fixed interval and
//! pushes each batch through the status cache and the outage tracker. The
//! source is trait-based so tests can script batches.

pub mod poller;
pub mod source;

pub use poller::SamplePoller;
pub use source::{HttpSampleSource, SampleSource, SourceError};
