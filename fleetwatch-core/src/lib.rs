//! Fleetwatch Core
//!
//! Core types and abstractions for the Fleetwatch fleet monitoring system.
//!
//! This crate contains:
//! - Domain types: Core business entities (StatusSample, OutageRecord, etc.)
//! - DTOs: Data transfer objects for the HTTP API and the report worker protocol

pub mod domain;
pub mod dto;
