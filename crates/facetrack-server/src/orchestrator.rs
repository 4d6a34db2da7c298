//! The sampling loop: camera to detector to tracker to broadcast.
//!
//! One [`Orchestrator`] runs per server. Each tick it pulls a frame, runs
//! detection unless paused, folds the result into the tracker and fans the
//! payload out through the subscriber registry. Faults are contained per
//! stage: a camera or detector failure produces a reduced status payload and
//! a longer delay before the next tick, never a dead loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use facetrack_capture::{FaceDetector, FrameSource, Overlay, UnavailableDetector};
use facetrack_core::{select, ConnectivityMonitor, FaceTracker};
use tracing::{debug, error, info, warn};

use crate::logsink::PayloadLog;
use crate::protocol::{CameraStatusMessage, FacePayload, StatusPayload};
use crate::state::SharedState;

/// Number of recent ticks the rate estimate looks at.
const FPS_WINDOW: usize = 30;

/// Loop timing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceConfig {
    /// Delay between ticks.
    pub tick: Duration,
    /// Delay between ticks while slow mode is on.
    pub slow_tick: Duration,
    /// Delay after a tick that got no frame.
    pub camera_backoff: Duration,
    /// Delay after a tick on which detection failed.
    pub detector_backoff: Duration,
}

impl CadenceConfig {
    /// Builds a cadence from millisecond values.
    #[must_use]
    pub fn from_millis(tick: u64, slow_tick: u64, camera_backoff: u64, detector_backoff: u64) -> Self {
        Self {
            tick: Duration::from_millis(tick),
            slow_tick: Duration::from_millis(slow_tick),
            camera_backoff: Duration::from_millis(camera_backoff),
            detector_backoff: Duration::from_millis(detector_backoff),
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self::from_millis(10, 150, 100, 200)
    }
}

/// Sliding window over recent tick times.
#[derive(Debug, Default)]
struct FpsWindow {
    samples: VecDeque<Instant>,
}

impl FpsWindow {
    fn record(&mut self, now: Instant) {
        self.samples.push_back(now);
        while self.samples.len() > FPS_WINDOW {
            self.samples.pop_front();
        }
    }

    /// Ticks per second over the window, `0.0` until two samples exist.
    fn rate(&self) -> f64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0.0;
        };
        if self.samples.len() < 2 {
            return 0.0;
        }
        let span = last.duration_since(*first).as_secs_f64();
        self.samples.len() as f64 / (span + 1e-6)
    }
}

/// Owns the capture pipeline and drives it until shutdown.
pub struct Orchestrator {
    state: SharedState,
    source: Box<dyn FrameSource>,
    detector: Box<dyn FaceDetector>,
    tracker: FaceTracker,
    overlay: Overlay,
    log: PayloadLog,
    cadence: CadenceConfig,
    connectivity: ConnectivityMonitor,
    fps: FpsWindow,
    running: Arc<AtomicBool>,
}

impl Orchestrator {
    /// Assembles the loop around an already-opened source and detector.
    #[must_use]
    pub fn new(
        state: SharedState,
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        tracker: FaceTracker,
        overlay: Overlay,
        log: PayloadLog,
        cadence: CadenceConfig,
    ) -> Self {
        Self {
            state,
            source,
            detector,
            tracker,
            overlay,
            log,
            cadence,
            connectivity: ConnectivityMonitor::new(),
            fps: FpsWindow::default(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Handle that stops the loop when set to `false`.
    #[must_use]
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Runs ticks until the shutdown handle flips. Consumes the
    /// orchestrator; dropping it closes the frame source.
    pub async fn run(mut self) {
        info!(
            source = self.source.name(),
            detector = self.detector.name(),
            "tracking loop started"
        );
        while self.running.load(Ordering::Relaxed) {
            let delay = self.tick().await;
            tokio::time::sleep(delay).await;
        }
        info!("tracking loop stopped");
    }

    /// Executes one tick and returns the delay before the next one.
    async fn tick(&mut self) -> Duration {
        self.state.record_tick();
        let started = Instant::now();
        let now = Utc::now();

        let frame = match self.source.next_frame().await {
            Ok(frame) => {
                if let Some(connected) = self.connectivity.observe(true) {
                    self.announce_connectivity(connected, now);
                }
                frame
            }
            Err(fault) => {
                warn!(source = self.source.name(), error = %fault, "frame unavailable");
                if let Some(connected) = self.connectivity.observe(false) {
                    self.announce_connectivity(connected, now);
                }
                self.broadcast_status(StatusPayload::camera_error(now));
                return self.cadence.camera_backoff;
            }
        };

        // Pausing suspends detection only; sampling and heartbeats go on.
        let candidates = if self.state.flags.paused() {
            Vec::new()
        } else {
            match self.detector.detect(&frame).await {
                Ok(candidates) => candidates,
                Err(fault) => return self.contain_detection_failure(fault.to_string(), now),
            }
        };

        let selected = match select(&candidates) {
            Ok(selected) => selected,
            Err(fault) => return self.contain_detection_failure(fault.to_string(), now),
        };

        let tracked = self.tracker.update(selected.as_ref(), now);
        self.fps.record(started);
        let mut payload = FacePayload::from_state(&tracked, self.fps.rate());

        // The log line never carries the frame attachment.
        if self.state.flags.logging_enabled() {
            if let Ok(json) = serde_json::to_string(&payload) {
                self.log.append(&json);
            }
        }

        if self.state.flags.stream_frames() {
            match self.overlay.annotate_and_encode(&frame, &tracked) {
                Ok(encoded) => payload.frame = Some(encoded),
                Err(fault) => {
                    debug!(error = %fault, "frame encoding failed, sending payload without frame");
                }
            }
        }

        if let Ok(json) = serde_json::to_string(&payload) {
            self.state.registry.broadcast(&json);
        }

        if self.state.flags.slow_cadence() {
            self.cadence.slow_tick
        } else {
            self.cadence.tick
        }
    }

    /// Broadcasts a detector fault and swaps in the null detector when the
    /// current one says it cannot recover.
    fn contain_detection_failure(&mut self, reason: String, now: DateTime<Utc>) -> Duration {
        warn!(detector = self.detector.name(), error = %reason, "detection failed");
        self.broadcast_status(StatusPayload::detector_error(now, reason));
        if !self.detector.available() {
            error!(
                detector = self.detector.name(),
                "detector unavailable, detection disabled for this run"
            );
            self.detector = Box::new(UnavailableDetector);
        }
        self.cadence.detector_backoff
    }

    fn announce_connectivity(&self, connected: bool, now: DateTime<Utc>) {
        if connected {
            info!("camera connected");
        } else {
            warn!("camera disconnected");
        }
        if let Ok(json) = serde_json::to_string(&CameraStatusMessage::new(connected, now)) {
            self.state.registry.broadcast(&json);
        }
    }

    fn broadcast_status(&self, payload: StatusPayload) {
        if let Ok(json) = serde_json::to_string(&payload) {
            self.state.registry.broadcast(&json);
        }
    }
}
