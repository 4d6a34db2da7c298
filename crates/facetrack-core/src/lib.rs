//! # Facetrack Core
//!
//! Core types and algorithms for the face tracking pipeline.
//!
//! This crate provides the pieces of the pipeline that have no I/O:
//!
//! - **Data Types**: [`Candidate`], [`TrackedState`], [`TrackStatus`] and
//!   the edge-triggered [`ConnectivityMonitor`].
//! - **Candidate Selection**: [`selector::select`] reduces one frame's
//!   detections to the single most prominent region.
//! - **Temporal Smoothing**: [`FaceTracker`] blends selections into one
//!   stable track with confidence decay on misses.
//! - **Runtime Flags**: [`RuntimeFlags`], the four global toggles driven by
//!   the control channel.
//!
//! The capture layer (frame sources, detectors) and the server (transport,
//! sampling loop) build on these types from their own crates.
//!
//! ## Example
//!
//! ```rust
//! use chrono::Utc;
//! use facetrack_core::{selector, Candidate, FaceTracker, TrackerConfig};
//!
//! let detections = vec![
//!     Candidate::new(0.1, 0.1, 0.1, 0.1, 0.9),
//!     Candidate::new(0.4, 0.4, 0.3, 0.3, 0.7),
//! ];
//!
//! let mut tracker = FaceTracker::new(TrackerConfig::default());
//! let selected = selector::select(&detections).unwrap();
//! let state = tracker.update(selected.as_ref(), Utc::now());
//!
//! assert!(state.is_tracking());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod flags;
pub mod selector;
pub mod tracker;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{CoreError, CoreResult};
pub use flags::RuntimeFlags;
pub use selector::select;
pub use tracker::{FaceTracker, TrackerConfig};
pub use types::{Candidate, ConnectivityMonitor, TrackStatus, TrackedState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default EMA inertia applied to position and size
pub const DEFAULT_SMOOTHING: f32 = 0.6;

/// Default per-tick confidence multiplier while no candidate is seen
pub const DEFAULT_DECAY: f32 = 0.85;

/// Default confidence floor below which a track reports `no_face`
pub const DEFAULT_EPSILON: f32 = 0.02;

/// Prelude module for convenient imports.
///
/// ```rust
/// use facetrack_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::flags::RuntimeFlags;
    pub use crate::selector::select;
    pub use crate::tracker::{FaceTracker, TrackerConfig};
    pub use crate::types::{Candidate, ConnectivityMonitor, TrackStatus, TrackedState};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_valid() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_constants_in_range() {
        assert!(DEFAULT_SMOOTHING > 0.0 && DEFAULT_SMOOTHING < 1.0);
        assert!(DEFAULT_DECAY > 0.0 && DEFAULT_DECAY < 1.0);
        assert!(DEFAULT_EPSILON > 0.0 && DEFAULT_EPSILON < DEFAULT_DECAY);
    }
}
