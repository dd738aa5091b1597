//! # Error Types
//!
//! Custom error types for FC Telemetry using `thiserror`.

use std::path::PathBuf;

use thiserror::Error;

use crate::link::Channel;

/// Main error type for FC Telemetry
#[derive(Debug, Error)]
pub enum FcTelemetryError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sample rate that cannot be turned into a tick interval
    #[error("Invalid sample rate: {0} Hz")]
    InvalidRate(f64),

    /// Flight controller link errors
    #[error("Link error: {0}")]
    Link(#[from] LinkError),

    /// A spawned task panicked or was cancelled
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Faults reported by a telemetry source
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinkError {
    /// A record could not be decoded
    #[error("decode fault: {0}")]
    Decode(String),

    /// The underlying transport failed
    #[error("transport fault: {0}")]
    Transport(String),

    /// The flight controller rejected a request
    #[error("{channel} rejected request: {reason}")]
    Rejected {
        /// Channel the request was made for
        channel: Channel,
        /// Reason given by the flight controller
        reason: String,
    },
}

/// Terminal failure of one channel ingestor
#[derive(Debug, Error)]
#[error("{channel} stream failed after {records} records: {source}")]
pub struct IngestError {
    /// Channel whose stream failed
    pub channel: Channel,
    /// Records applied to the store before the failure
    pub records: u64,
    /// Fault reported by the source
    #[source]
    pub source: LinkError,
}

/// Fatal recorder failures
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The sink could not be acquired
    #[error("Failed to open log file {path}: {source}")]
    SinkOpen {
        /// Target that failed to open
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The header row could not be written to a freshly opened sink
    #[error("Failed to write header to {path}: {source}")]
    Header {
        /// Target the header was written to
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for FC Telemetry
pub type Result<T> = std::result::Result<T, FcTelemetryError>;
