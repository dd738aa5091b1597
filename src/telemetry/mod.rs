//! # Telemetry Module
//!
//! Aggregates the flight controller's telemetry channels into one snapshot
//! and samples it on independent cadences.
//!
//! This module handles:
//! - Ingesting each channel into the shared [`store::SnapshotStore`]
//! - Sampling the snapshot into a CSV log ([`recorder::Recorder`])
//! - Sampling the snapshot into a readable report ([`printer::Printer`])
//! - Stop signalling and tick scheduling shared by those tasks

pub mod collector;
pub mod format;
pub mod ingest;
pub mod printer;
pub mod recorder;
pub mod schedule;
pub mod snapshot;
pub mod store;
