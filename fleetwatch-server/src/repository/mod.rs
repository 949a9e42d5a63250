//! Repository Module
//!
//! Data access layer for the server. The outage store is trait-based so the
//! tracker and the API can run against Postgres in production and an
//! in-memory store in tests.

pub mod outage;

pub use outage::{InMemoryOutageStore, OutageStore, PgOutageStore, StoreError};
