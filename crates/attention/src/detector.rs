//! Face and eye candidate detection

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::region_labelling::{connected_components, Connectivity};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AttentionError, BlobDetectorConfig, Polarity};

/// Axis-aligned bounding box in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Integer centre point
    pub fn center(&self) -> (u32, u32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    /// Translate by an origin (e.g. face-relative to frame coordinates).
    /// Saturates at the edge of the coordinate space.
    pub fn offset(&self, dx: u32, dy: u32) -> Region {
        Region::new(
            self.x.saturating_add(dx),
            self.y.saturating_add(dy),
            self.width,
            self.height,
        )
    }

    /// Whether the region is non-empty and lies inside a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x as u64 + self.width as u64 <= width as u64
            && self.y as u64 + self.height as u64 <= height as u64
    }
}

/// Pick the primary face: largest area, earliest candidate on ties.
pub fn select_primary(candidates: &[Region]) -> Option<Region> {
    candidates.iter().copied().fold(None, |best, candidate| match best {
        Some(current) if current.area() >= candidate.area() => Some(current),
        _ => Some(candidate),
    })
}

/// Proposes face candidates on a full luma frame.
///
/// Candidates are returned in detector order; that order decides area ties.
pub trait FaceDetector: Send + Sync {
    fn detect_faces(&self, gray: &GrayImage) -> Result<Vec<Region>, AttentionError>;
}

/// Proposes eye candidates on a face crop. Only the count is scored.
pub trait EyeDetector: Send + Sync {
    fn detect_eyes(&self, face: &GrayImage) -> Result<Vec<Region>, AttentionError>;
}

/// Threshold + connected-component detector.
///
/// Foreground pixels are labelled with 8-connectivity and each component's
/// bounding box is kept when its size and aspect fall inside the configured
/// bands. Boxes come out in raster order of each component's first pixel.
#[derive(Debug, Clone)]
pub struct BlobDetector {
    config: BlobDetectorConfig,
}

impl BlobDetector {
    pub fn new(config: BlobDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BlobDetectorConfig {
        &self.config
    }

    /// Detect blobs in `gray`
    pub fn detect(&self, gray: &GrayImage) -> Vec<Region> {
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }

        let fraction = self.config.search_top_fraction.clamp(0.0, 1.0);
        let search_height = ((height as f64 * fraction).ceil() as u32).clamp(1, height);
        let threshold = self.config.threshold;
        let polarity = self.config.polarity;

        let mask = GrayImage::from_fn(width, search_height, |x, y| {
            let value = gray.get_pixel(x, y)[0];
            let foreground = match polarity {
                Polarity::Bright => value >= threshold,
                Polarity::Dark => value <= threshold,
            };
            Luma([if foreground { 255 } else { 0 }])
        });

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        // label -> index into `bounds`, preserving first-seen raster order
        let mut index: HashMap<u32, usize> = HashMap::new();
        let mut bounds: Vec<(u32, u32, u32, u32)> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            let slot = *index.entry(label).or_insert_with(|| {
                bounds.push((x, y, x, y));
                bounds.len() - 1
            });
            let b = &mut bounds[slot];
            b.0 = b.0.min(x);
            b.1 = b.1.min(y);
            b.2 = b.2.max(x);
            b.3 = b.3.max(y);
        }

        let image_area = width as f64 * height as f64;
        let regions: Vec<Region> = bounds
            .into_iter()
            .map(|(x0, y0, x1, y1)| Region::new(x0, y0, x1 - x0 + 1, y1 - y0 + 1))
            .filter(|r| {
                let area_ratio = r.area() as f64 / image_area;
                let aspect = r.width as f64 / r.height as f64;
                area_ratio >= self.config.min_area_ratio
                    && area_ratio <= self.config.max_area_ratio
                    && aspect >= self.config.min_aspect
                    && aspect <= self.config.max_aspect
            })
            .collect();

        debug!("Blob detector ({:?}) kept {} regions", polarity, regions.len());
        regions
    }
}

impl FaceDetector for BlobDetector {
    fn detect_faces(&self, gray: &GrayImage) -> Result<Vec<Region>, AttentionError> {
        Ok(self.detect(gray))
    }
}

impl EyeDetector for BlobDetector {
    fn detect_eyes(&self, face: &GrayImage) -> Result<Vec<Region>, AttentionError> {
        Ok(self.detect(face))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::draw_filled_rect_mut;
    use imageproc::rect::Rect;

    #[test]
    fn test_select_primary_largest() {
        let candidates = [
            Region::new(0, 0, 10, 10),
            Region::new(50, 50, 40, 40),
            Region::new(5, 5, 20, 20),
        ];
        assert_eq!(select_primary(&candidates), Some(Region::new(50, 50, 40, 40)));
        assert_eq!(select_primary(&[]), None);
    }

    #[test]
    fn test_select_primary_tie_keeps_first() {
        let first = Region::new(0, 0, 20, 10);
        let second = Region::new(100, 100, 10, 20);
        for _ in 0..10 {
            assert_eq!(select_primary(&[first, second]), Some(first));
            assert_eq!(select_primary(&[second, first]), Some(second));
        }
    }

    #[test]
    fn test_region_geometry() {
        let r = Region::new(10, 20, 31, 40);
        assert_eq!(r.area(), 1240);
        assert_eq!(r.center(), (25, 40));
        assert_eq!(r.offset(5, 5), Region::new(15, 25, 31, 40));
        assert!(r.fits_within(41, 60));
        assert!(!r.fits_within(40, 60));
        assert!(!Region::new(0, 0, 0, 5).fits_within(10, 10));
    }

    #[test]
    fn test_bright_blob_detection() {
        let mut gray = GrayImage::new(100, 100);
        draw_filled_rect_mut(&mut gray, Rect::at(30, 20).of_size(40, 50), Luma([220u8]));
        // Too small to count as a face
        draw_filled_rect_mut(&mut gray, Rect::at(2, 2).of_size(3, 3), Luma([220u8]));

        let detector = BlobDetector::new(BlobDetectorConfig::face());
        assert_eq!(detector.detect(&gray), vec![Region::new(30, 20, 40, 50)]);
    }

    #[test]
    fn test_dark_blobs_in_raster_order() {
        let mut face = GrayImage::from_pixel(100, 100, Luma([200u8]));
        draw_filled_rect_mut(&mut face, Rect::at(60, 25).of_size(15, 10), Luma([10u8]));
        draw_filled_rect_mut(&mut face, Rect::at(20, 30).of_size(15, 10), Luma([10u8]));
        // Below the searched band
        draw_filled_rect_mut(&mut face, Rect::at(40, 80).of_size(15, 10), Luma([10u8]));

        let detector = BlobDetector::new(BlobDetectorConfig::eyes());
        assert_eq!(
            detector.detect(&face),
            vec![Region::new(60, 25, 15, 10), Region::new(20, 30, 15, 10)]
        );
    }

    #[test]
    fn test_offset_saturates() {
        let eye = Region::new(u32::MAX - 5, 3, 10, 4);
        assert_eq!(eye.offset(100, 7), Region::new(u32::MAX, 10, 10, 4));
        assert!(!eye.offset(100, 7).fits_within(640, 480));
    }

    #[test]
    fn test_empty_image() {
        let detector = BlobDetector::new(BlobDetectorConfig::face());
        assert!(detector.detect(&GrayImage::new(0, 0)).is_empty());
        assert!(detector.detect(&GrayImage::new(10, 10)).is_empty());
    }
}
