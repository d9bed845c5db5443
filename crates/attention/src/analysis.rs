//! Attention factors and per-frame results

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detector::Region;
use crate::ScoringConfig;

/// Points for having any face at all
pub const FACE_DETECTED_POINTS: u32 = 30;
/// Horizontal centring: near / far band
pub const CENTERED_X_POINTS: (u32, u32) = (25, 15);
/// Vertical centring: near / far band
pub const CENTERED_Y_POINTS: (u32, u32) = (20, 10);
/// Eyes: two or more / exactly one
pub const EYES_POINTS: (u32, u32) = (25, 10);
/// Face size: optimal / acceptable band
pub const FACE_SIZE_POINTS: (u32, u32) = (10, 5);

/// Displayed scores are clamped to this ceiling
pub const MAX_DISPLAY_SCORE: u32 = 100;

/// Human-readable status shown to readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusLabel {
    #[default]
    #[serde(rename = "Unknown")]
    Unknown,
    #[serde(rename = "Starting")]
    Starting,
    #[serde(rename = "Paying Attention")]
    PayingAttention,
    #[serde(rename = "Not Paying Attention")]
    NotPayingAttention,
    #[serde(rename = "Stopped")]
    Stopped,
}

impl StatusLabel {
    pub fn for_attentive(is_attentive: bool) -> Self {
        if is_attentive {
            StatusLabel::PayingAttention
        } else {
            StatusLabel::NotPayingAttention
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusLabel::Unknown => "Unknown",
            StatusLabel::Starting => "Starting",
            StatusLabel::PayingAttention => "Paying Attention",
            StatusLabel::NotPayingAttention => "Not Paying Attention",
            StatusLabel::Stopped => "Stopped",
        }
    }
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Face position and size relative to the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceGeometry {
    /// |face centre x - frame centre x| / (frame width / 2)
    pub x_offset: f64,
    /// |face centre y - frame centre y| / (frame height / 2)
    pub y_offset: f64,
    /// face area / frame area
    pub area_ratio: f64,
}

impl FaceGeometry {
    /// Measure a face against a `frame_width` x `frame_height` frame.
    ///
    /// Centres use integer halves, so a 1-pixel axis is treated as half-width 1.
    pub fn measure(face: &Region, frame_width: u32, frame_height: u32) -> Self {
        let (face_cx, face_cy) = face.center();
        let half_w = (frame_width / 2).max(1);
        let half_h = (frame_height / 2).max(1);

        let x_offset = (face_cx as f64 - half_w as f64).abs() / half_w as f64;
        let y_offset = (face_cy as f64 - half_h as f64).abs() / half_h as f64;
        let frame_area = (frame_width as u64 * frame_height as u64).max(1);

        Self {
            x_offset,
            y_offset,
            area_ratio: face.area() as f64 / frame_area as f64,
        }
    }
}

/// The five scoring contributions for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttentionFactors {
    pub face_detected: u32,
    pub face_centered_x: u32,
    pub face_centered_y: u32,
    pub eyes_detected: u32,
    pub face_size: u32,
}

impl AttentionFactors {
    /// Score a detected face
    pub fn evaluate(geometry: &FaceGeometry, eye_count: usize, config: &ScoringConfig) -> Self {
        Self {
            face_detected: FACE_DETECTED_POINTS,
            face_centered_x: centering_points(geometry.x_offset, CENTERED_X_POINTS, config),
            face_centered_y: centering_points(geometry.y_offset, CENTERED_Y_POINTS, config),
            eyes_detected: match eye_count {
                0 => 0,
                1 => EYES_POINTS.1,
                _ => EYES_POINTS.0,
            },
            face_size: size_points(geometry.area_ratio, config),
        }
    }

    /// Raw score: the unclamped factor sum
    pub fn total(&self) -> u32 {
        self.face_detected
            + self.face_centered_x
            + self.face_centered_y
            + self.eyes_detected
            + self.face_size
    }
}

fn centering_points(offset: f64, points: (u32, u32), config: &ScoringConfig) -> u32 {
    if offset < config.center_near {
        points.0
    } else if offset < config.center_far {
        points.1
    } else {
        0
    }
}

fn size_points(ratio: f64, config: &ScoringConfig) -> u32 {
    if config.size_optimal_min < ratio && ratio < config.size_optimal_max {
        FACE_SIZE_POINTS.0
    } else if config.size_acceptable_min < ratio && ratio < config.size_acceptable_max {
        FACE_SIZE_POINTS.1
    } else {
        0
    }
}

/// Result of scoring one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameScore {
    /// Raw score met the attentive threshold
    pub is_attentive: bool,

    /// Displayed score, clamped to 0..=100
    pub score: u8,

    /// Unclamped factor sum (may reach 110)
    pub raw_score: u32,

    /// Factor breakdown (absent when no face was found)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factors: Option<AttentionFactors>,

    /// Selected primary face
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<Region>,

    /// Eye candidates in face-relative coordinates
    pub eyes: Vec<Region>,
}

impl FrameScore {
    /// Fixed result for a frame without any face candidate
    pub fn no_face() -> Self {
        Self {
            is_attentive: false,
            score: 0,
            raw_score: 0,
            factors: None,
            face: None,
            eyes: Vec::new(),
        }
    }

    /// Build from a factor breakdown
    pub fn from_factors(
        factors: AttentionFactors,
        face: Region,
        eyes: Vec<Region>,
        config: &ScoringConfig,
    ) -> Self {
        let raw_score = factors.total();
        Self {
            is_attentive: raw_score >= config.attentive_threshold,
            score: raw_score.min(MAX_DISPLAY_SCORE) as u8,
            raw_score,
            factors: Some(factors),
            face: Some(face),
            eyes,
        }
    }

    pub fn label(&self) -> StatusLabel {
        StatusLabel::for_attentive(self.is_attentive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn geometry(x_offset: f64, y_offset: f64, area_ratio: f64) -> FaceGeometry {
        FaceGeometry {
            x_offset,
            y_offset,
            area_ratio,
        }
    }

    #[test]
    fn test_maximum_factor_path() {
        let factors = AttentionFactors::evaluate(&geometry(0.1, 0.1, 0.2), 2, &ScoringConfig::default());
        assert_eq!(factors.total(), 110);
    }

    #[test]
    fn test_centering_bands() {
        let config = ScoringConfig::default();
        let near = AttentionFactors::evaluate(&geometry(0.29, 0.29, 0.2), 0, &config);
        let edge = AttentionFactors::evaluate(&geometry(0.30, 0.30, 0.2), 0, &config);
        let far = AttentionFactors::evaluate(&geometry(0.50, 0.50, 0.2), 0, &config);

        assert_eq!((near.face_centered_x, near.face_centered_y), (25, 20));
        assert_eq!((edge.face_centered_x, edge.face_centered_y), (15, 10));
        assert_eq!((far.face_centered_x, far.face_centered_y), (0, 0));
    }

    #[test]
    fn test_eye_counts() {
        let config = ScoringConfig::default();
        let g = geometry(0.0, 0.0, 0.2);
        assert_eq!(AttentionFactors::evaluate(&g, 0, &config).eyes_detected, 0);
        assert_eq!(AttentionFactors::evaluate(&g, 1, &config).eyes_detected, 10);
        assert_eq!(AttentionFactors::evaluate(&g, 2, &config).eyes_detected, 25);
        assert_eq!(AttentionFactors::evaluate(&g, 5, &config).eyes_detected, 25);
    }

    #[test]
    fn test_size_bands_are_exclusive() {
        let config = ScoringConfig::default();
        let points = |ratio| AttentionFactors::evaluate(&geometry(0.0, 0.0, ratio), 0, &config).face_size;

        assert_eq!(points(0.01), 0);
        assert_eq!(points(0.02), 0);
        assert_eq!(points(0.03), 5);
        assert_eq!(points(0.05), 5);
        assert_eq!(points(0.06), 10);
        assert_eq!(points(0.40), 5);
        assert_eq!(points(0.45), 5);
        assert_eq!(points(0.50), 0);
    }

    #[test]
    fn test_clamp_after_sum() {
        let config = ScoringConfig::default();
        let face = Region::new(0, 0, 10, 10);
        let factors = AttentionFactors::evaluate(&geometry(0.0, 0.0, 0.2), 2, &config);
        let score = FrameScore::from_factors(factors, face, Vec::new(), &config);
        assert_eq!(score.raw_score, 110);
        assert_eq!(score.score, 100);
        assert!(score.is_attentive);
        assert_eq!(score.label(), StatusLabel::PayingAttention);
    }

    #[test]
    fn test_measure_centered_face() {
        let g = FaceGeometry::measure(&Region::new(220, 140, 200, 200), 640, 480);
        assert_eq!(g.x_offset, 0.0);
        assert_eq!(g.y_offset, 0.0);
        assert!((g.area_ratio - 40_000.0 / 307_200.0).abs() < 1e-12);
    }

    #[test]
    fn test_status_label_text() {
        assert_eq!(StatusLabel::PayingAttention.to_string(), "Paying Attention");
        assert_eq!(StatusLabel::for_attentive(false).as_str(), "Not Paying Attention");
        assert_eq!(StatusLabel::default(), StatusLabel::Unknown);
    }

    proptest! {
        #[test]
        fn test_raw_score_bounds(
            x in 0.0f64..2.0,
            y in 0.0f64..2.0,
            ratio in 0.0f64..1.0,
            eyes in 0usize..6,
        ) {
            let config = ScoringConfig::default();
            let factors = AttentionFactors::evaluate(&geometry(x, y, ratio), eyes, &config);
            let total = factors.total();
            prop_assert!((30..=110).contains(&total));

            let score = FrameScore::from_factors(factors, Region::new(0, 0, 1, 1), Vec::new(), &config);
            prop_assert!(score.score <= 100);
            prop_assert_eq!(score.is_attentive, total >= 60);
        }
    }
}
