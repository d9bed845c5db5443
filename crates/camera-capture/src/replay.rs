//! Replay camera: serves still images from a directory as a capture device

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::{CameraConfig, CameraError, CameraProvider, FrameSource, VideoFrame};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Provider that replays a directory of images in file-name order.
///
/// Exposes a single device at index 0. Frames are resized to the
/// configured capture resolution.
#[derive(Debug, Clone)]
pub struct ReplayCamera {
    dir: PathBuf,
    looping: bool,
}

impl ReplayCamera {
    /// Replay `dir` once; the device disconnects after the last image
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            looping: false,
        }
    }

    /// Restart from the first image instead of disconnecting
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
        let entries = fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

impl CameraProvider for ReplayCamera {
    fn open(&self, config: &CameraConfig) -> Result<Box<dyn FrameSource>, CameraError> {
        if config.index != 0 {
            return Err(CameraError::Open(format!("no replay device at index {}", config.index)));
        }

        let paths = Self::list_images(&self.dir)?;
        if paths.is_empty() {
            return Err(CameraError::Open(format!("no images in {}", self.dir.display())));
        }

        info!(
            "Opened replay camera {} ({} frames, {}x{})",
            self.dir.display(),
            paths.len(),
            config.width,
            config.height
        );

        Ok(Box::new(ReplaySource {
            paths,
            position: 0,
            looping: self.looping,
            width: config.width,
            height: config.height,
            sequence: 0,
            opened_at: Instant::now(),
            released: false,
        }))
    }
}

struct ReplaySource {
    paths: Vec<PathBuf>,
    position: usize,
    looping: bool,
    width: u32,
    height: u32,
    sequence: u32,
    opened_at: Instant,
    released: bool,
}

impl FrameSource for ReplaySource {
    fn read_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if self.released {
            return Err(CameraError::Disconnected);
        }
        if self.position >= self.paths.len() {
            if !self.looping {
                return Err(CameraError::Disconnected);
            }
            self.position = 0;
        }

        let path = &self.paths[self.position];
        self.position += 1;

        let decoded = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("Skipping undecodable frame {}: {}", path.display(), e);
                return Err(CameraError::NotReady);
            }
        };

        let timestamp_ns = self.opened_at.elapsed().as_nanos() as u64;
        let frame = VideoFrame::from_rgb_image(decoded, timestamp_ns, self.sequence);
        self.sequence = self.sequence.wrapping_add(1);
        debug!("Replayed frame {} from {}", frame.sequence, path.display());

        frame.resize(self.width, self.height)
    }

    fn release(&mut self) {
        if !self.released {
            debug!("Releasing replay camera");
            self.released = true;
        }
    }
}

impl Drop for ReplaySource {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn frames_dir(name: &str, count: usize) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("replay-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..count {
            let img = RgbImage::from_pixel(8, 6, Rgb([i as u8 * 10, 0, 0]));
            img.save(dir.join(format!("frame_{:03}.png", i))).unwrap();
        }
        fs::write(dir.join("notes.txt"), "not a frame").unwrap();
        dir
    }

    fn config(width: u32, height: u32) -> CameraConfig {
        CameraConfig {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_replays_in_order_then_disconnects() {
        let dir = frames_dir("order", 3);
        let mut source = ReplayCamera::new(&dir).open(&config(8, 6)).unwrap();

        for expected in 0..3u32 {
            let frame = source.read_frame().unwrap();
            assert_eq!(frame.sequence, expected);
            assert_eq!(frame.data[0], expected as u8 * 10);
        }
        assert_eq!(source.read_frame().unwrap_err(), CameraError::Disconnected);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_looping_and_resize() {
        let dir = frames_dir("loop", 2);
        let mut source = ReplayCamera::new(&dir)
            .looping(true)
            .open(&config(4, 3))
            .unwrap();

        for _ in 0..5 {
            let frame = source.read_frame().unwrap();
            assert_eq!((frame.width, frame.height), (4, 3));
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_failures() {
        let missing = ReplayCamera::new("/definitely/not/a/frames/dir");
        assert!(matches!(missing.open(&config(8, 6)), Err(CameraError::Open(_))));

        let dir = frames_dir("index", 1);
        let camera = ReplayCamera::new(&dir);
        let bad_index = CameraConfig { index: 1, ..config(8, 6) };
        assert!(matches!(camera.open(&bad_index), Err(CameraError::Open(_))));

        let empty = frames_dir("empty", 0);
        assert!(matches!(ReplayCamera::new(&empty).open(&config(8, 6)), Err(CameraError::Open(_))));
        let _ = fs::remove_dir_all(&dir);
        let _ = fs::remove_dir_all(&empty);
    }

    #[test]
    fn test_released_source_is_disconnected() {
        let dir = frames_dir("release", 2);
        let mut source = ReplayCamera::new(&dir).open(&config(8, 6)).unwrap();
        source.release();
        source.release();
        assert_eq!(source.read_frame().unwrap_err(), CameraError::Disconnected);
        let _ = fs::remove_dir_all(&dir);
    }
}
