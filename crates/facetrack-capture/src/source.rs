//! Frame sources: the devices (real or substitute) the sampling loop pulls
//! frames from.
//!
//! Real camera backends are external to this crate; anything that can
//! implement [`FrameSource`] can drive the pipeline. Shipped here are the
//! two substitutes used for demos and tests: a synthetic generator that
//! renders a moving face-like blob, and a camera that replays a directory
//! of still images in a loop.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{Rgb, RgbImage};
use tracing::debug;

use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;

/// Capture parameters handed to a frame source at construction.
///
/// `device_index` selects the hardware device for device-backed sources;
/// the substitutes shipped in this crate ignore it.
#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    /// Hardware device index for device-backed sources.
    pub device_index: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            width: 640,
            height: 480,
        }
    }
}

/// A device that yields raw frames or reports it cannot.
///
/// The sampling loop owns its source exclusively; acquisition happens once
/// at startup and release happens when the owner drops it.
#[async_trait]
pub trait FrameSource: Send {
    /// Short source name used in logs and the health document.
    fn name(&self) -> &'static str;

    /// Capability query: whether the source can currently produce frames.
    /// Consulted at startup and again after failures.
    fn available(&self) -> bool;

    /// Yields the next frame, or a [`CaptureError::Frame`] when none can be
    /// produced this tick.
    async fn next_frame(&mut self) -> CaptureResult<Frame>;
}

// =============================================================================
// Synthetic source
// =============================================================================

/// Always-available source rendering a bright elliptical blob that orbits
/// the frame center, against a dark gradient background.
///
/// The blob is deliberately detectable by [`crate::BlobDetector`], so the
/// full pipeline runs end-to-end with no hardware attached.
#[derive(Debug)]
pub struct SyntheticCamera {
    config: CameraConfig,
    tick: u64,
    last_center: (f32, f32),
}

impl SyntheticCamera {
    /// Creates a synthetic source with the given capture size.
    #[must_use]
    pub fn new(config: CameraConfig) -> Self {
        Self {
            config,
            tick: 0,
            last_center: (0.5, 0.5),
        }
    }

    /// Normalized center of the blob in the most recently produced frame.
    #[must_use]
    pub fn face_center(&self) -> (f32, f32) {
        self.last_center
    }

    fn center_at(tick: u64) -> (f32, f32) {
        let t = tick as f32 * 0.05;
        let cx = 0.5 + 0.25 * (t * 1.3).sin();
        let cy = 0.5 + 0.15 * (t * 0.9).cos();
        (cx, cy)
    }

    fn render(&self, cx: f32, cy: f32) -> RgbImage {
        let (w, h) = (self.config.width, self.config.height);
        let cx_px = cx * w as f32;
        let cy_px = cy * h as f32;
        let rx = 0.11 * w as f32;
        let ry = 0.15 * h as f32;

        RgbImage::from_fn(w, h, |x, y| {
            let dx = (x as f32 - cx_px) / rx;
            let dy = (y as f32 - cy_px) / ry;
            let d2 = dx * dx + dy * dy;
            if d2 <= 1.0 {
                // Bright skin-toned ellipse fading slightly toward its rim.
                let fade = 1.0 - 0.15 * d2;
                Rgb([
                    (235.0 * fade) as u8,
                    (205.0 * fade) as u8,
                    (185.0 * fade) as u8,
                ])
            } else {
                // Dark background with a mild vertical gradient.
                let shade = 24 + (y * 16 / h.max(1)) as u8;
                Rgb([shade, shade, shade + 6])
            }
        })
    }
}

#[async_trait]
impl FrameSource for SyntheticCamera {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn available(&self) -> bool {
        true
    }

    async fn next_frame(&mut self) -> CaptureResult<Frame> {
        let (cx, cy) = Self::center_at(self.tick);
        self.tick += 1;
        self.last_center = (cx, cy);
        Ok(Frame::new(self.render(cx, cy)))
    }
}

// =============================================================================
// Image sequence source
// =============================================================================

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Source that replays the image files of a directory in name order,
/// wrapping around at the end.
#[derive(Debug)]
pub struct ImageSequenceCamera {
    paths: Vec<PathBuf>,
    index: usize,
}

impl ImageSequenceCamera {
    /// Opens a directory of still images.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::CameraOpen`] if the directory cannot be read
    /// or contains no image files. This is the startup-fatal path.
    pub fn open(dir: impl AsRef<Path>) -> CaptureResult<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CaptureError::camera_open("files", format!("{}: {e}", dir.display())))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                    })
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(CaptureError::camera_open(
                "files",
                format!("no image files in {}", dir.display()),
            ));
        }

        debug!(count = paths.len(), dir = %dir.display(), "image sequence opened");
        Ok(Self { paths, index: 0 })
    }

    /// Number of images in the sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the sequence is empty. Never true after a successful open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[async_trait]
impl FrameSource for ImageSequenceCamera {
    fn name(&self) -> &'static str {
        "files"
    }

    fn available(&self) -> bool {
        !self.paths.is_empty()
    }

    async fn next_frame(&mut self) -> CaptureResult<Frame> {
        let path = self.paths[self.index].clone();
        // Advance past unreadable files so one bad image cannot wedge the loop.
        self.index = (self.index + 1) % self.paths.len();

        let image = image::open(&path)
            .map_err(|e| CaptureError::frame(format!("{}: {e}", path.display())))?;
        Ok(Frame::new(image.to_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_synthetic_frames_have_configured_size() {
        let mut camera = SyntheticCamera::new(CameraConfig {
            device_index: 0,
            width: 320,
            height: 240,
        });
        let frame = camera.next_frame().await.unwrap();
        assert_eq!(frame.width(), 320);
        assert_eq!(frame.height(), 240);
        assert!(camera.available());
    }

    #[tokio::test]
    async fn test_synthetic_blob_is_bright_at_reported_center() {
        let mut camera = SyntheticCamera::new(CameraConfig::default());
        let frame = camera.next_frame().await.unwrap();
        let (cx, cy) = camera.face_center();

        let px = frame.image.get_pixel(
            (cx * frame.width() as f32) as u32,
            (cy * frame.height() as f32) as u32,
        );
        // Center of the blob is far brighter than the background.
        assert!(px.0[0] > 180);
    }

    #[tokio::test]
    async fn test_synthetic_blob_moves_between_frames() {
        let mut camera = SyntheticCamera::new(CameraConfig::default());
        camera.next_frame().await.unwrap();
        let first = camera.face_center();
        for _ in 0..10 {
            camera.next_frame().await.unwrap();
        }
        let later = camera.face_center();
        assert!((first.0 - later.0).abs() + (first.1 - later.1).abs() > 0.01);
    }

    #[test]
    fn test_sequence_open_rejects_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageSequenceCamera::open(dir.path()).unwrap_err();
        assert!(matches!(err, CaptureError::CameraOpen { .. }));
    }

    #[tokio::test]
    async fn test_sequence_replays_in_name_order_and_wraps() {
        let dir = tempfile::tempdir().unwrap();
        // Two single-color frames named to sort deterministically.
        let red = RgbImage::from_pixel(8, 8, Rgb([200, 0, 0]));
        let blue = RgbImage::from_pixel(8, 8, Rgb([0, 0, 200]));
        red.save(dir.path().join("a.png")).unwrap();
        blue.save(dir.path().join("b.png")).unwrap();

        let mut camera = ImageSequenceCamera::open(dir.path()).unwrap();
        assert_eq!(camera.len(), 2);

        let f1 = camera.next_frame().await.unwrap();
        let f2 = camera.next_frame().await.unwrap();
        let f3 = camera.next_frame().await.unwrap();
        assert_eq!(f1.image.get_pixel(0, 0).0[0], 200);
        assert_eq!(f2.image.get_pixel(0, 0).0[2], 200);
        // Wrapped back to the first image.
        assert_eq!(f3.image.get_pixel(0, 0).0[0], 200);
    }

    #[tokio::test]
    async fn test_sequence_skips_past_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.png"), b"not an image").unwrap();
        let good = RgbImage::from_pixel(8, 8, Rgb([50, 60, 70]));
        good.save(dir.path().join("b.png")).unwrap();

        let mut camera = ImageSequenceCamera::open(dir.path()).unwrap();
        assert!(camera.next_frame().await.is_err());
        // The bad file was skipped; the next read succeeds.
        assert!(camera.next_frame().await.is_ok());
    }
}
