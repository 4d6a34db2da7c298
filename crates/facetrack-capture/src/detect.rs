//! Face detection over captured frames.
//!
//! The pipeline treats detection as an external capability behind the
//! [`FaceDetector`] trait. The built-in [`BlobDetector`] finds bright
//! regions on a coarse luminance grid, which is enough to track the
//! synthetic source and well-lit faces against dark backgrounds; serious
//! deployments plug in their own implementation. [`UnavailableDetector`]
//! is the stand-in used when no detection capability exists at all.

use async_trait::async_trait;
use facetrack_core::Candidate;
use tracing::trace;

use crate::error::{CaptureError, CaptureResult};
use crate::frame::Frame;
use crate::DEFAULT_MIN_SCORE;

/// Detects candidate face regions in a single frame.
#[async_trait]
pub trait FaceDetector: Send {
    /// Short detector name used in logs and the health document.
    fn name(&self) -> &'static str;

    /// Capability query: whether this detector can produce detections.
    /// Consulted at startup and again after failures.
    fn available(&self) -> bool;

    /// Returns zero or more candidates for the frame, or a
    /// [`CaptureError::Detection`] failure for this tick.
    async fn detect(&mut self, frame: &Frame) -> CaptureResult<Vec<Candidate>>;
}

/// Configuration for [`BlobDetector`] behaviour.
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Edge length in pixels of the coarse luminance grid cells (default: 8)
    pub cell_size: u32,
    /// Minimum mean luminance for a cell to count as lit (default: 140)
    pub luma_threshold: u8,
    /// Minimum lit cells for a blob to become a candidate (default: 4)
    pub min_cells: u32,
    /// Candidates scoring below this are dropped (default: 0.4)
    pub min_score: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cell_size: 8,
            luma_threshold: 140,
            min_cells: 4,
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

/// Bright-blob detector on a downsampled luminance grid.
///
/// The frame is reduced to cells of `cell_size` pixels; cells whose mean
/// luminance exceeds the threshold are grouped into 4-connected components,
/// and each sufficiently large component becomes one candidate. The score
/// maps the component's brightness margin over the threshold into `[0, 1]`.
#[derive(Debug)]
pub struct BlobDetector {
    config: DetectorConfig,
}

impl BlobDetector {
    /// Creates a detector with the given configuration.
    #[must_use]
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    fn cell_means(&self, frame: &Frame, grid_w: u32, grid_h: u32) -> Vec<u8> {
        let cell = self.config.cell_size;
        let mut means = Vec::with_capacity((grid_w * grid_h) as usize);
        for gy in 0..grid_h {
            for gx in 0..grid_w {
                let mut sum: u64 = 0;
                for y in (gy * cell)..((gy + 1) * cell) {
                    for x in (gx * cell)..((gx + 1) * cell) {
                        let px = frame.image.get_pixel(x, y).0;
                        sum += (u64::from(px[0]) * 299
                            + u64::from(px[1]) * 587
                            + u64::from(px[2]) * 114)
                            / 1000;
                    }
                }
                means.push((sum / u64::from(cell * cell)) as u8);
            }
        }
        means
    }
}

#[async_trait]
impl FaceDetector for BlobDetector {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn available(&self) -> bool {
        true
    }

    async fn detect(&mut self, frame: &Frame) -> CaptureResult<Vec<Candidate>> {
        let cell = self.config.cell_size;
        let (w, h) = (frame.width(), frame.height());
        if w < cell || h < cell {
            return Err(CaptureError::detection(format!(
                "frame {w}x{h} is smaller than one {cell}px cell"
            )));
        }

        let grid_w = w / cell;
        let grid_h = h / cell;
        let means = self.cell_means(frame, grid_w, grid_h);
        let threshold = self.config.luma_threshold;
        let lit: Vec<bool> = means.iter().map(|&m| m > threshold).collect();

        // Group lit cells into 4-connected components, row-major discovery
        // order so downstream tie-breaking stays deterministic.
        let mut visited = vec![false; lit.len()];
        let mut candidates = Vec::new();
        for start in 0..lit.len() {
            if !lit[start] || visited[start] {
                continue;
            }

            let mut stack = vec![start];
            visited[start] = true;
            let (mut min_gx, mut max_gx) = (grid_w, 0u32);
            let (mut min_gy, mut max_gy) = (grid_h, 0u32);
            let mut cells = 0u32;
            let mut luma_sum = 0u64;

            while let Some(idx) = stack.pop() {
                let gx = idx as u32 % grid_w;
                let gy = idx as u32 / grid_w;
                cells += 1;
                luma_sum += u64::from(means[idx]);
                min_gx = min_gx.min(gx);
                max_gx = max_gx.max(gx);
                min_gy = min_gy.min(gy);
                max_gy = max_gy.max(gy);

                let mut push = |nidx: usize| {
                    if lit[nidx] && !visited[nidx] {
                        visited[nidx] = true;
                        stack.push(nidx);
                    }
                };
                if gx > 0 {
                    push(idx - 1);
                }
                if gx + 1 < grid_w {
                    push(idx + 1);
                }
                if gy > 0 {
                    push(idx - grid_w as usize);
                }
                if gy + 1 < grid_h {
                    push(idx + grid_w as usize);
                }
            }

            if cells < self.config.min_cells {
                continue;
            }

            let mean_luma = luma_sum as f32 / cells as f32;
            let score = ((mean_luma - f32::from(threshold)) / (255.0 - f32::from(threshold)))
                .clamp(0.0, 1.0);
            if score < self.config.min_score {
                continue;
            }

            candidates.push(Candidate::new(
                (min_gx * cell) as f32 / w as f32,
                (min_gy * cell) as f32 / h as f32,
                ((max_gx + 1 - min_gx) * cell) as f32 / w as f32,
                ((max_gy + 1 - min_gy) * cell) as f32 / h as f32,
                score,
            ));
        }

        trace!(count = candidates.len(), "blob detection complete");
        Ok(candidates)
    }
}

/// Permanently-unavailable detector: reports no candidates, forever.
///
/// Substituted when no detection capability exists, keeping the loop and
/// its subscribers alive with `no_face` output instead of failing.
#[derive(Debug, Default)]
pub struct UnavailableDetector;

#[async_trait]
impl FaceDetector for UnavailableDetector {
    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn available(&self) -> bool {
        false
    }

    async fn detect(&mut self, _frame: &Frame) -> CaptureResult<Vec<Candidate>> {
        Ok(Vec::new())
    }
}
