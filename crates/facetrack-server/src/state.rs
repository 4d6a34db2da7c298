//! Shared application state.
//!
//! One [`AppState`] is built at startup and cloned behind an [`Arc`] into the
//! WebSocket handlers, the health endpoint, and the tracking loop. Runtime
//! toggles live in [`RuntimeFlags`] so a control message applied on one
//! socket is visible to the loop on its next tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use facetrack_core::RuntimeFlags;
use tracing::{debug, info};

use crate::protocol::ControlCommand;
use crate::registry::SubscriberRegistry;

/// State shared by the HTTP layer and the tracking loop.
pub struct AppState {
    /// Publish-channel subscribers.
    pub registry: Arc<SubscriberRegistry>,
    /// Toggles owned by the control channel.
    pub flags: Arc<RuntimeFlags>,
    /// Label of the configured frame source, for diagnostics.
    pub source: String,
    /// Label of the configured detector, for diagnostics.
    pub detector: String,
    started_at: Instant,
    ticks: AtomicU64,
}

/// Handle type the axum routers and the loop share.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Builds state for one server run.
    #[must_use]
    pub fn new(source: impl Into<String>, detector: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(SubscriberRegistry::new()),
            flags: Arc::new(RuntimeFlags::new()),
            source: source.into(),
            detector: detector.into(),
            started_at: Instant::now(),
            ticks: AtomicU64::new(0),
        }
    }

    /// Records one completed loop tick.
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Completed loop ticks since startup.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Seconds since the state was built.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Applies one control command to the runtime flags.
    ///
    /// Commands are idempotent; repeating one is allowed and changes
    /// nothing. [`ControlCommand::Ignored`] is a logged no-op.
    pub fn apply_command(&self, command: ControlCommand) {
        match command {
            ControlCommand::Pause => self.flags.set_paused(true),
            ControlCommand::Resume => self.flags.set_paused(false),
            ControlCommand::SlowOn => self.flags.set_slow_cadence(true),
            ControlCommand::SlowOff => self.flags.set_slow_cadence(false),
            ControlCommand::FramesOn => self.flags.set_stream_frames(true),
            ControlCommand::FramesOff => self.flags.set_stream_frames(false),
            ControlCommand::LogOn => self.flags.set_logging_enabled(true),
            ControlCommand::LogOff => self.flags.set_logging_enabled(false),
            ControlCommand::Ignored => {
                debug!("ignoring unrecognized control message");
                return;
            }
        }
        info!(command = ?command, "control command applied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_drive_flags() {
        let state = AppState::new("synthetic", "blob");
        assert!(!state.flags.paused());

        state.apply_command(ControlCommand::Pause);
        assert!(state.flags.paused());
        state.apply_command(ControlCommand::Pause);
        assert!(state.flags.paused());
        state.apply_command(ControlCommand::Resume);
        assert!(!state.flags.paused());

        state.apply_command(ControlCommand::FramesOn);
        state.apply_command(ControlCommand::LogOn);
        assert!(state.flags.stream_frames());
        assert!(state.flags.logging_enabled());
        assert!(!state.flags.slow_cadence());
    }

    #[test]
    fn test_ignored_command_changes_nothing() {
        let state = AppState::new("synthetic", "blob");
        state.apply_command(ControlCommand::SlowOn);

        state.apply_command(ControlCommand::Ignored);
        assert!(state.flags.slow_cadence());
        assert!(!state.flags.paused());
        assert!(!state.flags.stream_frames());
        assert!(!state.flags.logging_enabled());
    }

    #[test]
    fn test_tick_counter_accumulates() {
        let state = AppState::new("files", "blob");
        assert_eq!(state.ticks(), 0);
        state.record_tick();
        state.record_tick();
        assert_eq!(state.ticks(), 2);
    }
}
