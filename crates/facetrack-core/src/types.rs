//! Core data types for the face tracking pipeline.
//!
//! # Type Categories
//!
//! - **Detection types**: [`Candidate`]
//! - **Tracking types**: [`TrackedState`], [`TrackStatus`]
//! - **Connectivity types**: [`ConnectivityMonitor`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Detection Types
// =============================================================================

/// One detector-reported region of interest for a single frame.
///
/// Coordinates are normalized to `[0, 1]` relative to the frame, with the
/// origin at the top-left corner. Candidates are ephemeral; none survives
/// past the tick that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Left edge of the region.
    pub x_min: f32,
    /// Top edge of the region.
    pub y_min: f32,
    /// Region width.
    pub width: f32,
    /// Region height.
    pub height: f32,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
}

impl Candidate {
    /// Creates a new candidate region.
    #[must_use]
    pub fn new(x_min: f32, y_min: f32, width: f32, height: f32, score: f32) -> Self {
        Self {
            x_min,
            y_min,
            width,
            height,
            score,
        }
    }

    /// Normalized footprint of the region, the selection key.
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Center of the region.
    #[must_use]
    pub fn center(&self) -> (f32, f32) {
        (self.x_min + self.width / 2.0, self.y_min + self.height / 2.0)
    }

    /// Checks the candidate for structural validity.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is non-finite, a dimension is
    /// negative, or the score is outside `[0, 1]`.
    pub fn validate(&self) -> CoreResult<()> {
        let fields = [
            ("x_min", self.x_min),
            ("y_min", self.y_min),
            ("width", self.width),
            ("height", self.height),
            ("score", self.score),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CoreError::validation(format!(
                    "candidate {name} is not finite"
                )));
            }
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(CoreError::validation(format!(
                "candidate dimensions must be non-negative, got {}x{}",
                self.width, self.height
            )));
        }
        if !(0.0..=1.0).contains(&self.score) {
            return Err(CoreError::validation(format!(
                "candidate score must be in [0.0, 1.0], got {}",
                self.score
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Tracking Types
// =============================================================================

/// Health of the tracked state published each tick.
///
/// The four states are mutually exclusive. `Ok` requires a non-decayed,
/// confidence-bearing track; the error states are produced by the sampling
/// loop, never by the tracker itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackStatus {
    /// A subject is being tracked with live confidence.
    Ok,
    /// No subject, or confidence has decayed below the floor.
    NoFace,
    /// The frame source reported no frame this tick.
    CameraError,
    /// The detector failed on this tick's frame.
    DetectorError,
}

impl TrackStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::NoFace => "no_face",
            Self::CameraError => "camera_error",
            Self::DetectorError => "detector_error",
        }
    }
}

impl std::fmt::Display for TrackStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single tracked entity published once per tick.
///
/// Exactly one `TrackedState` exists per running session. The tracker
/// returns a fresh value each tick; nothing mutates a previously published
/// state in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedState {
    /// Smoothed horizontal center in `[0, 1]`.
    pub center_x: f32,
    /// Smoothed vertical center in `[0, 1]`.
    pub center_y: f32,
    /// Smoothed region width in `[0, 1]`.
    pub width: f32,
    /// Smoothed region height in `[0, 1]`.
    pub height: f32,
    /// Detector confidence, decayed while no candidate is seen.
    pub confidence: f32,
    /// Capture time of the tick that produced this state.
    pub timestamp: DateTime<Utc>,
    /// Track health for this tick.
    pub status: TrackStatus,
}

impl TrackedState {
    /// A fresh state for a session that has never seen a face: screen
    /// center with zero size and zero confidence.
    #[must_use]
    pub fn no_face(now: DateTime<Utc>) -> Self {
        Self {
            center_x: 0.5,
            center_y: 0.5,
            width: 0.0,
            height: 0.0,
            confidence: 0.0,
            timestamp: now,
            status: TrackStatus::NoFace,
        }
    }

    /// Adopts a candidate's values directly, with no blending.
    #[must_use]
    pub fn from_candidate(candidate: &Candidate, now: DateTime<Utc>) -> Self {
        let (cx, cy) = candidate.center();
        Self {
            center_x: cx,
            center_y: cy,
            width: candidate.width,
            height: candidate.height,
            confidence: candidate.score,
            timestamp: now,
            status: TrackStatus::Ok,
        }
    }

    /// Returns `true` if the state carries live tracking data.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.status == TrackStatus::Ok
    }
}

// =============================================================================
// Connectivity Types
// =============================================================================

/// Edge detector for camera connectivity.
///
/// The sampling loop feeds it one observation per tick; it reports a value
/// only when connectivity actually changes, so subscribers are notified once
/// per transition rather than once per tick. A new monitor assumes a
/// connected camera, matching the startup contract that an explicitly
/// requested source which cannot be acquired is fatal before the loop runs.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    connected: bool,
}

impl ConnectivityMonitor {
    /// Creates a monitor assuming a connected camera.
    #[must_use]
    pub fn new() -> Self {
        Self { connected: true }
    }

    /// Records this tick's connectivity; returns the new value only on a
    /// transition.
    pub fn observe(&mut self, connected: bool) -> Option<bool> {
        if connected == self.connected {
            None
        } else {
            self.connected = connected;
            Some(connected)
        }
    }

    /// Current connectivity as of the last observation.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_area_and_center() {
        let c = Candidate::new(0.2, 0.4, 0.2, 0.1, 0.9);
        assert!((c.area() - 0.02).abs() < 1e-6);
        let (cx, cy) = c.center();
        assert!((cx - 0.3).abs() < 1e-6);
        assert!((cy - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_candidate_validation() {
        assert!(Candidate::new(0.1, 0.1, 0.2, 0.2, 0.5).validate().is_ok());
        assert!(Candidate::new(f32::NAN, 0.1, 0.2, 0.2, 0.5)
            .validate()
            .is_err());
        assert!(Candidate::new(0.1, 0.1, -0.2, 0.2, 0.5).validate().is_err());
        assert!(Candidate::new(0.1, 0.1, 0.2, 0.2, 1.5).validate().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(TrackStatus::Ok.as_str(), "ok");
        assert_eq!(TrackStatus::NoFace.as_str(), "no_face");
        assert_eq!(TrackStatus::CameraError.as_str(), "camera_error");
        assert_eq!(TrackStatus::DetectorError.as_str(), "detector_error");

        let json = serde_json::to_string(&TrackStatus::NoFace).unwrap();
        assert_eq!(json, "\"no_face\"");
    }

    #[test]
    fn test_fresh_no_face_state() {
        let state = TrackedState::no_face(Utc::now());
        assert_eq!(state.center_x, 0.5);
        assert_eq!(state.center_y, 0.5);
        assert_eq!(state.width, 0.0);
        assert_eq!(state.height, 0.0);
        assert_eq!(state.confidence, 0.0);
        assert_eq!(state.status, TrackStatus::NoFace);
        assert!(!state.is_tracking());
    }

    #[test]
    fn test_connectivity_edges_only() {
        let mut monitor = ConnectivityMonitor::new();
        assert!(monitor.is_connected());

        // Steady connected: no notifications.
        assert_eq!(monitor.observe(true), None);
        assert_eq!(monitor.observe(true), None);

        // Drop: exactly one false, then silence while down.
        assert_eq!(monitor.observe(false), Some(false));
        assert_eq!(monitor.observe(false), None);
        assert_eq!(monitor.observe(false), None);

        // Recovery: exactly one true.
        assert_eq!(monitor.observe(true), Some(true));
        assert_eq!(monitor.observe(true), None);
    }
}
