//! Repository layer
//!
//! The worker loads its own data: the supervisor hands it only the query,
//! and the worker reads the outage range straight from the store.

pub mod outages;
