//! Attention Scoring
//!
//! Per-frame attention analysis using classical computer vision:
//! - Face candidate detection and primary face selection
//! - Eye candidate counting within the primary face
//! - Fixed-table factor scoring (centering, eyes, face size)
//! - Optional frame annotation for visual collaborators

pub mod analysis;
pub mod annotate;
pub mod config;
pub mod detector;
pub mod scorer;

pub use analysis::{AttentionFactors, FaceGeometry, FrameScore, StatusLabel};
pub use annotate::annotate;
pub use config::{BlobDetectorConfig, DetectorConfig, Polarity, ScoringConfig};
pub use detector::{select_primary, BlobDetector, EyeDetector, FaceDetector, Region};
pub use scorer::FrameScorer;

use camera_capture::CameraError;
use thiserror::Error;

/// Attention scoring error types.
///
/// Every variant is a per-frame detection failure: the frame is skipped,
/// never given a substitute score.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttentionError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Detection failed: {0}")]
    Detection(String),
}

impl From<CameraError> for AttentionError {
    fn from(e: CameraError) -> Self {
        AttentionError::MalformedFrame(e.to_string())
    }
}
