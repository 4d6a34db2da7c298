//! Temporal smoothing of the selected candidate into one stable track.
//!
//! The tracker owns the session's single [`TrackedState`] and folds each
//! tick's selection into it:
//!
//! 1. First candidate ever seen: adopted verbatim.
//! 2. Candidate while tracking: exponential moving average on position and
//!    size, `max` on confidence so a momentary low-score detection does not
//!    flicker the track.
//! 3. No candidate: position and size freeze, confidence decays each tick,
//!    and the status flips to `no_face` once it falls below the epsilon
//!    floor. Transient detection misses fade out instead of jumping.
//!
//! Faceless ticks before any acquisition publish a fresh placeholder without
//! establishing a track, so rule 1 still applies to the next candidate.
//!
//! Every update returns a fresh state by value; callers never observe
//! in-place mutation of a previously returned state.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::types::{Candidate, TrackStatus, TrackedState};
use crate::{DEFAULT_DECAY, DEFAULT_EPSILON, DEFAULT_SMOOTHING};

/// Configuration for [`FaceTracker`] behaviour.
#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    /// EMA inertia in `[0, 1]`; higher keeps more of the previous state
    /// (less jitter, more lag). Default 0.6.
    pub smoothing: f32,
    /// Per-tick confidence multiplier while no candidate is seen.
    /// Default 0.85.
    pub decay: f32,
    /// Confidence floor below which the track reports `no_face`.
    /// Default 0.02.
    pub epsilon: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            decay: DEFAULT_DECAY,
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl TrackerConfig {
    /// Checks that every parameter is inside its working range.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending parameter.
    pub fn validate(&self) -> CoreResult<()> {
        if !(0.0..=1.0).contains(&self.smoothing) {
            return Err(CoreError::configuration(format!(
                "smoothing must be in [0.0, 1.0], got {}",
                self.smoothing
            )));
        }
        if !(0.0..=1.0).contains(&self.decay) {
            return Err(CoreError::configuration(format!(
                "decay must be in [0.0, 1.0], got {}",
                self.decay
            )));
        }
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(CoreError::configuration(format!(
                "epsilon must be in [0.0, 1.0], got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Owns and advances the session's single smoothed track.
#[derive(Debug)]
pub struct FaceTracker {
    config: TrackerConfig,
    state: Option<TrackedState>,
}

impl FaceTracker {
    /// Creates a tracker with no track yet established.
    #[must_use]
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }

    /// Folds one tick's selection into the track and returns the state to
    /// publish for this tick.
    ///
    /// Always succeeds; the absence of a candidate is a normal input, not a
    /// failure.
    pub fn update(&mut self, selected: Option<&Candidate>, now: DateTime<Utc>) -> TrackedState {
        let next = match (selected, self.state) {
            // First detection of the session: adopt, no blending.
            (Some(candidate), None) => {
                let state = TrackedState::from_candidate(candidate, now);
                debug!(
                    center_x = state.center_x,
                    center_y = state.center_y,
                    confidence = state.confidence,
                    "track acquired"
                );
                state
            }
            // Tracking: blend toward the new observation.
            (Some(candidate), Some(previous)) => {
                let alpha = self.config.smoothing;
                let (cx, cy) = candidate.center();
                TrackedState {
                    center_x: blend(alpha, previous.center_x, cx),
                    center_y: blend(alpha, previous.center_y, cy),
                    width: blend(alpha, previous.width, candidate.width),
                    height: blend(alpha, previous.height, candidate.height),
                    confidence: previous.confidence.max(candidate.score),
                    timestamp: now,
                    status: TrackStatus::Ok,
                }
            }
            // Nothing seen and nothing ever tracked. The placeholder is not
            // retained, so the next candidate is still adopted verbatim.
            (None, None) => return TrackedState::no_face(now),
            // Lost this tick: freeze geometry, fade confidence.
            (None, Some(previous)) => {
                let confidence = previous.confidence * self.config.decay;
                let status = if confidence < self.config.epsilon {
                    if previous.status == TrackStatus::Ok {
                        debug!(confidence, "track faded out");
                    }
                    TrackStatus::NoFace
                } else {
                    previous.status
                };
                TrackedState {
                    confidence,
                    timestamp: now,
                    status,
                    ..previous
                }
            }
        };
        self.state = Some(next);
        next
    }

    /// The retained track, if one has ever been established.
    #[must_use]
    pub fn state(&self) -> Option<&TrackedState> {
        self.state.as_ref()
    }

    /// The tracker's configuration.
    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

fn blend(alpha: f32, old: f32, new: f32) -> f32 {
    alpha * old + (1.0 - alpha) * new
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    /// Candidate whose center lands exactly at (cx, cy).
    fn centered(cx: f32, cy: f32, w: f32, h: f32, score: f32) -> Candidate {
        Candidate::new(cx - w / 2.0, cy - h / 2.0, w, h, score)
    }

    #[test]
    fn test_first_candidate_adopted_verbatim() {
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        let state = tracker.update(Some(&centered(0.3, 0.4, 0.2, 0.25, 0.7)), now());

        assert_relative_eq!(state.center_x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(state.center_y, 0.4, epsilon = 1e-6);
        assert_relative_eq!(state.width, 0.2, epsilon = 1e-6);
        assert_relative_eq!(state.height, 0.25, epsilon = 1e-6);
        assert_relative_eq!(state.confidence, 0.7, epsilon = 1e-6);
        assert_eq!(state.status, TrackStatus::Ok);
    }

    #[test]
    fn test_ema_blend_and_max_confidence() {
        // alpha 0.6, prior (0.5, 0.5, 0.2, 0.2, conf 0.9),
        // candidate centered at (0.6, 0.5) sized 0.3 x 0.2 with score 0.8.
        let config = TrackerConfig {
            smoothing: 0.6,
            ..TrackerConfig::default()
        };
        let mut tracker = FaceTracker::new(config);
        tracker.update(Some(&centered(0.5, 0.5, 0.2, 0.2, 0.9)), now());
        let state = tracker.update(Some(&centered(0.6, 0.5, 0.3, 0.2, 0.8)), now());

        // 0.6 * 0.5 + 0.4 * 0.6 = 0.54
        assert_relative_eq!(state.center_x, 0.54, epsilon = 1e-6);
        assert_relative_eq!(state.center_y, 0.5, epsilon = 1e-6);
        // 0.6 * 0.2 + 0.4 * 0.3 = 0.24
        assert_relative_eq!(state.width, 0.24, epsilon = 1e-6);
        assert_relative_eq!(state.height, 0.2, epsilon = 1e-6);
        // max(0.9, 0.8)
        assert_relative_eq!(state.confidence, 0.9, epsilon = 1e-6);
        assert_eq!(state.status, TrackStatus::Ok);
    }

    #[test]
    fn test_no_candidate_without_history_is_fresh_no_face() {
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        let state = tracker.update(None, now());

        assert_eq!(state.center_x, 0.5);
        assert_eq!(state.center_y, 0.5);
        assert_eq!(state.width, 0.0);
        assert_eq!(state.confidence, 0.0);
        assert_eq!(state.status, TrackStatus::NoFace);
    }

    #[test]
    fn test_acquisition_after_faceless_ticks_is_verbatim() {
        // Placeholder ticks must not seed the EMA: a candidate arriving after
        // them is adopted as-is, not blended toward screen center.
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        tracker.update(None, now());
        tracker.update(None, now());
        assert!(tracker.state().is_none());

        let state = tracker.update(Some(&centered(0.8, 0.6, 0.3, 0.3, 0.8)), now());
        assert_relative_eq!(state.center_x, 0.8, epsilon = 1e-6);
        assert_relative_eq!(state.center_y, 0.6, epsilon = 1e-6);
        assert_relative_eq!(state.width, 0.3, epsilon = 1e-6);
        assert_relative_eq!(state.height, 0.3, epsilon = 1e-6);
        assert_relative_eq!(state.confidence, 0.8, epsilon = 1e-6);
        assert_eq!(state.status, TrackStatus::Ok);
    }

    #[test]
    fn test_decay_freezes_geometry_and_fades_confidence() {
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        tracker.update(Some(&centered(0.3, 0.3, 0.2, 0.2, 0.8)), now());

        let state = tracker.update(None, now());
        assert_relative_eq!(state.center_x, 0.3, epsilon = 1e-6);
        assert_relative_eq!(state.width, 0.2, epsilon = 1e-6);
        assert_relative_eq!(state.confidence, 0.8 * 0.85, epsilon = 1e-6);
        assert_eq!(state.status, TrackStatus::Ok);

        let state = tracker.update(None, now());
        assert_relative_eq!(state.confidence, 0.8 * 0.85 * 0.85, epsilon = 1e-6);
    }

    #[test]
    fn test_fade_out_crosses_epsilon() {
        // From confidence 0.5 with decay 0.85, the track must stay `ok`
        // while 0.5 * 0.85^n >= 0.02 and flip the first tick it drops below.
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        tracker.update(Some(&centered(0.5, 0.5, 0.1, 0.1, 0.5)), now());

        let mut expected = 0.5f32;
        let mut flipped_at = None;
        for tick in 1..=30 {
            expected *= 0.85;
            let state = tracker.update(None, now());
            assert_relative_eq!(state.confidence, expected, epsilon = 1e-6);
            if state.status == TrackStatus::NoFace {
                flipped_at = Some(tick);
                break;
            }
        }

        // First crossing of the 0.02 floor for these constants.
        assert!(expected < 0.02);
        assert_eq!(flipped_at, Some(20));
    }

    #[test]
    fn test_status_stays_no_face_once_faded() {
        let config = TrackerConfig {
            epsilon: 0.5,
            ..TrackerConfig::default()
        };
        let mut tracker = FaceTracker::new(config);
        tracker.update(Some(&centered(0.5, 0.5, 0.1, 0.1, 0.5)), now());

        let state = tracker.update(None, now());
        assert_eq!(state.status, TrackStatus::NoFace);
        let state = tracker.update(None, now());
        assert_eq!(state.status, TrackStatus::NoFace);
    }

    #[test]
    fn test_reacquisition_after_fade() {
        let config = TrackerConfig {
            epsilon: 0.9,
            ..TrackerConfig::default()
        };
        let mut tracker = FaceTracker::new(config);
        tracker.update(Some(&centered(0.2, 0.2, 0.1, 0.1, 0.5)), now());
        let faded = tracker.update(None, now());
        assert_eq!(faded.status, TrackStatus::NoFace);

        // A new candidate blends from the frozen geometry and returns to ok.
        let state = tracker.update(Some(&centered(0.4, 0.4, 0.1, 0.1, 0.95)), now());
        assert_eq!(state.status, TrackStatus::Ok);
        assert_relative_eq!(state.center_x, 0.6 * 0.2 + 0.4 * 0.4, epsilon = 1e-6);
        assert_relative_eq!(state.confidence, 0.95, epsilon = 1e-6);
    }

    #[test]
    fn test_update_returns_state_by_value() {
        let mut tracker = FaceTracker::new(TrackerConfig::default());
        let first = tracker.update(Some(&centered(0.3, 0.3, 0.2, 0.2, 0.8)), now());
        let second = tracker.update(Some(&centered(0.7, 0.7, 0.2, 0.2, 0.8)), now());

        // The previously returned state is untouched by later updates.
        assert_relative_eq!(first.center_x, 0.3, epsilon = 1e-6);
        assert!(second.center_x > first.center_x);
    }

    #[test]
    fn test_config_validation() {
        assert!(TrackerConfig::default().validate().is_ok());

        let bad = TrackerConfig {
            smoothing: 1.5,
            ..TrackerConfig::default()
        };
        assert!(bad.validate().is_err());

        let bad = TrackerConfig {
            decay: -0.1,
            ..TrackerConfig::default()
        };
        assert!(bad.validate().is_err());
    }
}
