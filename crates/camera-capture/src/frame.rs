//! Video frame types and conversions

use image::{imageops, GrayImage, RgbImage};

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        }
    }

    /// Wrap an already decoded RGB image
    pub fn from_rgb_image(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, timestamp_ns, sequence)
    }

    /// Check that the buffer matches the declared dimensions
    pub fn validate(&self) -> Result<(), CameraError> {
        if self.width == 0 || self.height == 0 {
            return Err(CameraError::Format(format!(
                "empty frame {}x{}",
                self.width, self.height
            )));
        }
        let expected = self.width as usize * self.height as usize * 3;
        if self.data.len() != expected {
            return Err(CameraError::Format(format!(
                "buffer holds {} bytes, {}x{} RGB needs {}",
                self.data.len(),
                self.width,
                self.height,
                expected
            )));
        }
        Ok(())
    }

    /// Copy the frame into an RGB image
    pub fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        self.validate()?;
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CameraError::Format("failed to create image buffer".into()))
    }

    /// Convert to grayscale (Rec. 601 luma)
    pub fn to_grayscale(&self) -> Result<GrayImage, CameraError> {
        let rgb = self.to_rgb_image()?;
        Ok(imageops::grayscale(&rgb))
    }

    /// Resize to the given dimensions, keeping timestamp and sequence
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<VideoFrame, CameraError> {
        if new_width == self.width && new_height == self.height {
            return Ok(self.clone());
        }
        let rgb = self.to_rgb_image()?;
        let resized = imageops::resize(&rgb, new_width, new_height, imageops::FilterType::Triangle);
        Ok(VideoFrame::from_rgb_image(resized, self.timestamp_ns, self.sequence))
    }
}
