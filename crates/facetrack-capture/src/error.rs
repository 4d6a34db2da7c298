//! Error types for the capture layer.
//!
//! The variants mirror how the sampling loop contains each failure:
//! [`CaptureError::CameraOpen`] is fatal at startup, [`CaptureError::Frame`]
//! and [`CaptureError::Detection`] are retried on a fixed cadence, and
//! [`CaptureError::Encoding`] is swallowed by dropping the frame field.

use thiserror::Error;

/// A specialized `Result` type for capture operations.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Error type for frame acquisition, detection and encoding.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CaptureError {
    /// The frame source could not be acquired at startup
    #[error("Cannot open source '{source_name}': {reason}")]
    CameraOpen {
        /// Name of the source that failed to open
        source_name: String,
        /// Description of the failure
        reason: String,
    },

    /// The frame source produced no frame this tick
    #[error("Frame unavailable: {reason}")]
    Frame {
        /// Description of the failure
        reason: String,
    },

    /// The detector failed on this tick's frame
    #[error("Detection failed: {reason}")]
    Detection {
        /// Description of the failure
        reason: String,
    },

    /// The annotated frame could not be encoded
    #[error("Frame encoding failed: {reason}")]
    Encoding {
        /// Description of the failure
        reason: String,
    },

    /// The overlay font could not be loaded at startup
    #[error("Cannot load overlay font '{path}': {reason}")]
    FontLoad {
        /// Path of the font file
        path: String,
        /// Description of the failure
        reason: String,
    },
}

impl CaptureError {
    /// Creates a new camera-open error.
    #[must_use]
    pub fn camera_open(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CameraOpen {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new frame-unavailable error.
    #[must_use]
    pub fn frame(reason: impl Into<String>) -> Self {
        Self::Frame {
            reason: reason.into(),
        }
    }

    /// Creates a new detection error.
    #[must_use]
    pub fn detection(reason: impl Into<String>) -> Self {
        Self::Detection {
            reason: reason.into(),
        }
    }

    /// Creates a new encoding error.
    #[must_use]
    pub fn encoding(reason: impl Into<String>) -> Self {
        Self::Encoding {
            reason: reason.into(),
        }
    }

    /// Creates a new font-load error.
    #[must_use]
    pub fn font_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FontLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaptureError::camera_open("files", "directory is empty");
        assert_eq!(
            err.to_string(),
            "Cannot open source 'files': directory is empty"
        );

        let err = CaptureError::frame("read failed");
        assert_eq!(err.to_string(), "Frame unavailable: read failed");
    }
}
