//! Frame scorer: frame in, attentiveness decision and score out

use camera_capture::VideoFrame;
use image::{imageops, RgbImage};
use tracing::{debug, info};

use crate::analysis::{AttentionFactors, FaceGeometry, FrameScore};
use crate::annotate::annotate;
use crate::detector::{select_primary, BlobDetector, EyeDetector, FaceDetector};
use crate::{AttentionError, DetectorConfig, ScoringConfig};

/// Stateless per-frame scorer.
///
/// Shared across threads; scoring one frame never affects another.
pub struct FrameScorer {
    config: ScoringConfig,
    face_detector: Box<dyn FaceDetector>,
    eye_detector: Box<dyn EyeDetector>,
}

impl FrameScorer {
    /// Create a scorer with custom detectors
    pub fn new(
        config: ScoringConfig,
        face_detector: impl FaceDetector + 'static,
        eye_detector: impl EyeDetector + 'static,
    ) -> Self {
        Self {
            config,
            face_detector: Box::new(face_detector),
            eye_detector: Box::new(eye_detector),
        }
    }

    /// Create a scorer backed by the built-in blob detectors
    pub fn with_blob_detectors(config: ScoringConfig, detectors: &DetectorConfig) -> Self {
        info!(
            "Using blob detectors (face threshold {}, eye threshold {})",
            detectors.face.threshold, detectors.eyes.threshold
        );
        Self::new(
            config,
            BlobDetector::new(detectors.face.clone()),
            BlobDetector::new(detectors.eyes.clone()),
        )
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score a single frame
    pub fn score(&self, frame: &VideoFrame) -> Result<FrameScore, AttentionError> {
        let gray = frame.to_grayscale()?;
        let (width, height) = gray.dimensions();

        let faces = self.face_detector.detect_faces(&gray)?;
        let Some(face) = select_primary(&faces) else {
            debug!("Frame {}: no face", frame.sequence);
            return Ok(FrameScore::no_face());
        };

        if !face.fits_within(width, height) {
            return Err(AttentionError::Detection(format!(
                "face {:?} outside {}x{} frame",
                face, width, height
            )));
        }

        let roi = imageops::crop_imm(&gray, face.x, face.y, face.width, face.height).to_image();
        let eyes = self.eye_detector.detect_eyes(&roi)?;

        let geometry = FaceGeometry::measure(&face, width, height);
        let factors = AttentionFactors::evaluate(&geometry, eyes.len(), &self.config);
        let result = FrameScore::from_factors(factors, face, eyes, &self.config);

        debug!(
            "Frame {}: raw {} ({:?}), {} eyes, attentive={}",
            frame.sequence,
            result.raw_score,
            factors,
            result.eyes.len(),
            result.is_attentive
        );
        Ok(result)
    }

    /// Score a frame and return an annotated copy alongside the result
    pub fn score_annotated(&self, frame: &VideoFrame) -> Result<(FrameScore, RgbImage), AttentionError> {
        let result = self.score(frame)?;
        let image = annotate(frame.to_rgb_image()?, &result);
        Ok((result, image))
    }
}
