//! Attention Session Tracking
//!
//! Runs attention detection continuously and aggregates the results:
//! - Background detection loop owning the capture device
//! - Focused/distracted time accumulation and average score
//! - Live status publishing to any number of readers
//! - Session records and reports at stop time

pub mod aggregator;
pub mod clock;
pub mod config;
pub mod monitor;
pub mod publisher;
pub mod report;

pub use aggregator::{AggregateError, AggregateSnapshot, AttentionAggregator, AttentionSample, SessionAccumulator};
pub use clock::{Clock, SteppingClock, SystemClock};
pub use config::MonitorConfig;
pub use monitor::AttentionMonitor;
pub use publisher::{LiveStatus, SessionStatusPublisher, StatusSnapshot};
pub use report::{EndReason, ProgressReport, SessionRecord, SessionReport, SessionSummary, SummarySink};

use attention::AttentionError;
use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("Camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Camera lost: {0}")]
    DeviceLost(String),

    #[error("Detection failure: {0}")]
    DetectionFailure(#[from] AttentionError),

    #[error("Invalid sample ordering: {0}")]
    InvalidOrdering(#[from] AggregateError),

    #[error("Configuration error: {0}")]
    Config(String),
}
