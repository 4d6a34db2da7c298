//! The owned frame sample passed through one tick of the pipeline.

use chrono::{DateTime, Utc};
use image::RgbImage;

/// One captured frame: RGB pixels plus the capture instant.
///
/// Frames are owned values handed from the source to the loop; nothing holds
/// a frame past the tick that captured it.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data in row-major RGB.
    pub image: RgbImage,
    /// Wall-clock capture time.
    pub timestamp: DateTime<Utc>,
}

impl Frame {
    /// Creates a frame captured now.
    #[must_use]
    pub fn new(image: RgbImage) -> Self {
        Self {
            image,
            timestamp: Utc::now(),
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
