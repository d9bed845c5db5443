//! Scoring and detector configuration

use serde::{Deserialize, Serialize};

/// Thresholds applied to face geometry.
///
/// The point values awarded per band are fixed; only the band edges and the
/// attentiveness cut-off are tunable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Minimum raw score for a frame to count as attentive
    pub attentive_threshold: u32,

    /// Centre offset (fraction of half-frame) below which a face is centred
    pub center_near: f64,

    /// Centre offset below which a face is still partially centred
    pub center_far: f64,

    /// Face/frame area band awarding full size points (exclusive bounds)
    pub size_optimal_min: f64,
    pub size_optimal_max: f64,

    /// Face/frame area band awarding partial size points (exclusive bounds)
    pub size_acceptable_min: f64,
    pub size_acceptable_max: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            attentive_threshold: 60,
            center_near: 0.30,
            center_far: 0.50,
            size_optimal_min: 0.05,
            size_optimal_max: 0.40,
            size_acceptable_min: 0.02,
            size_acceptable_max: 0.50,
        }
    }
}

impl ScoringConfig {
    /// Create strict config (higher cut-off, tighter centring)
    pub fn strict() -> Self {
        Self {
            attentive_threshold: 75,
            center_near: 0.20,
            center_far: 0.40,
            ..Default::default()
        }
    }

    /// Create lenient config (lower cut-off, looser centring)
    pub fn lenient() -> Self {
        Self {
            attentive_threshold: 50,
            center_near: 0.40,
            center_far: 0.60,
            ..Default::default()
        }
    }
}

/// Which side of the luma threshold counts as foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Bright,
    Dark,
}

/// Blob detector parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobDetectorConfig {
    pub polarity: Polarity,

    /// Luma threshold (inclusive)
    pub threshold: u8,

    /// Accepted blob bounding-box area as a fraction of the searched image
    pub min_area_ratio: f64,
    pub max_area_ratio: f64,

    /// Accepted width/height ratio
    pub min_aspect: f64,
    pub max_aspect: f64,

    /// Only the top fraction of the image is searched (eyes sit in the upper face)
    pub search_top_fraction: f64,
}

impl BlobDetectorConfig {
    /// Bright, roughly square regions: a lit face against a darker cabin
    pub fn face() -> Self {
        Self {
            polarity: Polarity::Bright,
            threshold: 160,
            min_area_ratio: 0.01,
            max_area_ratio: 0.90,
            min_aspect: 0.5,
            max_aspect: 2.0,
            search_top_fraction: 1.0,
        }
    }

    /// Small dark regions in the upper part of a face crop
    pub fn eyes() -> Self {
        Self {
            polarity: Polarity::Dark,
            threshold: 60,
            min_area_ratio: 0.002,
            max_area_ratio: 0.08,
            min_aspect: 0.5,
            max_aspect: 3.0,
            search_top_fraction: 0.6,
        }
    }
}

/// Detector configuration for the built-in blob detectors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub face: BlobDetectorConfig,
    pub eyes: BlobDetectorConfig,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            face: BlobDetectorConfig::face(),
            eyes: BlobDetectorConfig::eyes(),
        }
    }
}
