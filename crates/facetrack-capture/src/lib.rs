//! # Facetrack Capture
//!
//! Frame acquisition, face detection and frame annotation for the face
//! tracking pipeline.
//!
//! The sampling loop sees two capabilities, both behind traits with an
//! `available()` query so missing hardware degrades softly instead of
//! branching on error types:
//!
//! - **[`FrameSource`]**: yields raw frames or reports it cannot. Shipped
//!   sources: [`SyntheticCamera`] (always available, renders a moving
//!   face-like blob) and [`ImageSequenceCamera`] (replays a directory of
//!   stills). Real device backends implement the same trait externally.
//! - **[`FaceDetector`]**: returns candidate regions for one frame.
//!   Shipped: [`BlobDetector`] (bright-blob grid scan) and
//!   [`UnavailableDetector`] (the permanently-unavailable stub).
//!
//! [`Overlay`] renders the tracked region onto a frame copy and encodes it
//! for the wire (`JPEG` at quality 60, base64).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod annotate;
pub mod detect;
pub mod error;
pub mod frame;
pub mod source;

pub use annotate::{encode_frame, Overlay, JPEG_QUALITY};
pub use detect::{BlobDetector, DetectorConfig, FaceDetector, UnavailableDetector};
pub use error::{CaptureError, CaptureResult};
pub use frame::Frame;
pub use source::{CameraConfig, FrameSource, ImageSequenceCamera, SyntheticCamera};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default minimum detector score for a candidate to be reported
pub const DEFAULT_MIN_SCORE: f32 = 0.4;
