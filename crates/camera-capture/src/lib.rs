//! Camera Capture Library for Attention Monitoring
//!
//! Provides the capture-device seam used by the detection loop:
//! - `CameraProvider` opens a device by index
//! - `FrameSource` yields RGB frames and releases the device
//! - `ReplayCamera` replays still images from disk as a device

pub mod frame;
pub mod replay;

pub use frame::VideoFrame;
pub use replay::ReplayCamera;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Camera error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    /// No frame ready yet; the caller should retry shortly.
    #[error("No frame ready")]
    NotReady,

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Camera disconnected")]
    Disconnected,
}

impl CameraError {
    /// Whether a read failure may clear up on its own
    pub fn is_transient(&self) -> bool {
        matches!(self, CameraError::NotReady)
    }
}

/// Camera configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index (0 = default webcam)
    pub index: u32,
    /// Capture width
    pub width: u32,
    /// Capture height
    pub height: u32,
    /// Camera frame rate. Independent of the evaluation cadence.
    pub fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

/// An opened capture device.
///
/// A source is owned by exactly one reader; it is moved into the detection
/// loop and never shared.
pub trait FrameSource: Send {
    /// Read the next frame.
    ///
    /// `CameraError::NotReady` is transient; any other error means the
    /// device is no longer usable.
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError>;

    /// Release the underlying device. Calling it twice is harmless.
    fn release(&mut self);
}

/// Opens capture devices by index.
pub trait CameraProvider: Send + Sync {
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError>;
}
