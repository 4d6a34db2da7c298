//! Wire types for the publish and control channels.
//!
//! Three outbound shapes share the publish socket:
//!
//! - [`FacePayload`]: the full per-tick tracking payload.
//! - [`StatusPayload`]: the reduced payload broadcast on camera and
//!   detector failures.
//! - [`CameraStatusMessage`]: the edge-triggered connectivity notification,
//!   distinguished by its `type` field.
//!
//! Inbound text parses into [`ControlCommand`], a closed set; anything
//! unrecognized becomes [`ControlCommand::Ignored`] because subscribers are
//! allowed to send keepalives over the same socket.

use chrono::{DateTime, Utc};
use facetrack_core::{TrackStatus, TrackedState};
use serde::{Deserialize, Serialize};

/// Converts a timestamp to the wire representation, epoch seconds.
#[must_use]
pub fn epoch_seconds(timestamp: DateTime<Utc>) -> f64 {
    timestamp.timestamp_millis() as f64 / 1000.0
}

/// Full tracking payload broadcast once per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacePayload {
    /// Smoothed horizontal center in `[0, 1]`.
    pub center_x: f32,
    /// Smoothed vertical center in `[0, 1]`.
    pub center_y: f32,
    /// Smoothed region width in `[0, 1]`.
    pub width: f32,
    /// Smoothed region height in `[0, 1]`.
    pub height: f32,
    /// Track confidence in `[0, 1]`.
    pub confidence: f32,
    /// Capture time, epoch seconds.
    pub timestamp: f64,
    /// Track health, `ok` or `no_face` on this path.
    pub status: TrackStatus,
    /// Measured loop rate over the recent window.
    pub fps: f64,
    /// Annotated JPEG, base64, present only while frame streaming is on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
}

impl FacePayload {
    /// Builds the payload for one tick from the tracker's state.
    #[must_use]
    pub fn from_state(state: &TrackedState, fps: f64) -> Self {
        Self {
            center_x: state.center_x,
            center_y: state.center_y,
            width: state.width,
            height: state.height,
            confidence: state.confidence,
            timestamp: epoch_seconds(state.timestamp),
            status: state.status,
            fps,
            frame: None,
        }
    }
}

/// Reduced payload broadcast when the tick could not produce a track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusPayload {
    /// `camera_error` or `detector_error`.
    pub status: TrackStatus,
    /// Time of the failed tick, epoch seconds.
    pub timestamp: f64,
    /// Failure description, present for detector errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusPayload {
    /// Payload for a tick with no frame from the camera.
    #[must_use]
    pub fn camera_error(now: DateTime<Utc>) -> Self {
        Self {
            status: TrackStatus::CameraError,
            timestamp: epoch_seconds(now),
            error: None,
        }
    }

    /// Payload for a tick on which detection failed.
    #[must_use]
    pub fn detector_error(now: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            status: TrackStatus::DetectorError,
            timestamp: epoch_seconds(now),
            error: Some(message.into()),
        }
    }
}

/// Out-of-band connectivity notification, sent once per transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraStatusMessage {
    /// Message discriminator, always `camera_status`.
    #[serde(rename = "type")]
    pub message_type: String,
    /// New connectivity value.
    pub connected: bool,
    /// Time of the transition, epoch seconds.
    pub timestamp: f64,
}

impl CameraStatusMessage {
    /// Builds a notification for a connectivity transition.
    #[must_use]
    pub fn new(connected: bool, now: DateTime<Utc>) -> Self {
        Self {
            message_type: "camera_status".to_string(),
            connected,
            timestamp: epoch_seconds(now),
        }
    }
}

/// The closed set of control commands subscribers may send.
///
/// Deserializes from `{"cmd": "<name>"}`. Unrecognized command names map to
/// [`ControlCommand::Ignored`]; use [`ControlCommand::parse`] for raw text
/// so malformed input lands there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Suspend detection; the loop keeps broadcasting heartbeats.
    Pause,
    /// Resume detection.
    Resume,
    /// Switch to the slow demo cadence.
    SlowOn,
    /// Return to the normal cadence.
    SlowOff,
    /// Attach annotated frames to payloads.
    FramesOn,
    /// Stop attaching frames.
    FramesOff,
    /// Append payloads to the JSONL log.
    LogOn,
    /// Stop appending to the log.
    LogOff,
    /// Anything that is not a recognized command. Applied as a no-op.
    #[serde(other)]
    Ignored,
}

impl ControlCommand {
    /// Parses one inbound text message. Never fails; malformed input is
    /// [`ControlCommand::Ignored`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or(Self::Ignored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use facetrack_core::Candidate;

    #[test]
    fn test_face_payload_omits_absent_frame() {
        let candidate = Candidate::new(0.4, 0.4, 0.2, 0.2, 0.8);
        let state = TrackedState::from_candidate(&candidate, Utc::now());
        let payload = FacePayload::from_state(&state, 30.0);

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"fps\":30.0"));
        assert!(!json.contains("\"frame\""));
    }

    #[test]
    fn test_face_payload_includes_attached_frame() {
        let state = TrackedState::no_face(Utc::now());
        let mut payload = FacePayload::from_state(&state, 0.0);
        payload.frame = Some("QUJD".to_string());

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"frame\":\"QUJD\""));
        assert!(json.contains("\"status\":\"no_face\""));
    }

    #[test]
    fn test_status_payloads() {
        let json = serde_json::to_string(&StatusPayload::camera_error(Utc::now())).unwrap();
        assert!(json.contains("\"status\":\"camera_error\""));
        assert!(!json.contains("\"error\""));

        let json =
            serde_json::to_string(&StatusPayload::detector_error(Utc::now(), "bad frame")).unwrap();
        assert!(json.contains("\"status\":\"detector_error\""));
        assert!(json.contains("\"error\":\"bad frame\""));
    }

    #[test]
    fn test_camera_status_message_shape() {
        let json = serde_json::to_string(&CameraStatusMessage::new(false, Utc::now())).unwrap();
        assert!(json.contains("\"type\":\"camera_status\""));
        assert!(json.contains("\"connected\":false"));
    }

    #[test]
    fn test_parse_recognized_commands() {
        let cases = [
            ("pause", ControlCommand::Pause),
            ("resume", ControlCommand::Resume),
            ("slow_on", ControlCommand::SlowOn),
            ("slow_off", ControlCommand::SlowOff),
            ("frames_on", ControlCommand::FramesOn),
            ("frames_off", ControlCommand::FramesOff),
            ("log_on", ControlCommand::LogOn),
            ("log_off", ControlCommand::LogOff),
        ];
        for (name, expected) in cases {
            let raw = format!("{{\"cmd\":\"{name}\"}}");
            assert_eq!(ControlCommand::parse(&raw), expected, "{name}");
        }
    }

    #[test]
    fn test_parse_ignores_everything_else() {
        assert_eq!(
            ControlCommand::parse("{\"cmd\":\"reboot\"}"),
            ControlCommand::Ignored
        );
        assert_eq!(
            ControlCommand::parse("{\"action\":\"pause\"}"),
            ControlCommand::Ignored
        );
        assert_eq!(ControlCommand::parse("ping"), ControlCommand::Ignored);
        assert_eq!(ControlCommand::parse(""), ControlCommand::Ignored);
        assert_eq!(ControlCommand::parse("42"), ControlCommand::Ignored);
    }

    #[test]
    fn test_epoch_seconds_precision() {
        let now = Utc::now();
        let wire = epoch_seconds(now);
        assert!((wire - now.timestamp() as f64).abs() < 1.0);
    }
}
