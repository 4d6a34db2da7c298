//! Shared runtime flags toggled over the control channel.
//!
//! One instance exists per process, owned behind an `Arc` by the server
//! state and the sampling loop. The control-command interpreter is the only
//! writer; the loop reads every flag once per tick. Each toggle is an
//! independent atomic, so writes are last-writer-wins with no ordering
//! guarantees between flags.

use std::sync::atomic::{AtomicBool, Ordering};

/// The four global boolean toggles of the pipeline.
#[derive(Debug, Default)]
pub struct RuntimeFlags {
    paused: AtomicBool,
    slow_cadence: AtomicBool,
    stream_frames: AtomicBool,
    logging_enabled: AtomicBool,
}

impl RuntimeFlags {
    /// Creates flags in their startup state: running, normal cadence, no
    /// frame streaming, no logging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether detection is suspended.
    #[must_use]
    pub fn paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Suspends or resumes detection.
    pub fn set_paused(&self, value: bool) {
        self.paused.store(value, Ordering::SeqCst);
    }

    /// Whether the loop runs at the slow demo cadence.
    #[must_use]
    pub fn slow_cadence(&self) -> bool {
        self.slow_cadence.load(Ordering::SeqCst)
    }

    /// Switches between normal and slow cadence.
    pub fn set_slow_cadence(&self, value: bool) {
        self.slow_cadence.store(value, Ordering::SeqCst);
    }

    /// Whether annotated frames are attached to payloads.
    #[must_use]
    pub fn stream_frames(&self) -> bool {
        self.stream_frames.load(Ordering::SeqCst)
    }

    /// Enables or disables frame streaming.
    pub fn set_stream_frames(&self, value: bool) {
        self.stream_frames.store(value, Ordering::SeqCst);
    }

    /// Whether payloads are appended to the JSONL log.
    #[must_use]
    pub fn logging_enabled(&self) -> bool {
        self.logging_enabled.load(Ordering::SeqCst)
    }

    /// Enables or disables payload logging.
    pub fn set_logging_enabled(&self, value: bool) {
        self.logging_enabled.store(value, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_state() {
        let flags = RuntimeFlags::new();
        assert!(!flags.paused());
        assert!(!flags.slow_cadence());
        assert!(!flags.stream_frames());
        assert!(!flags.logging_enabled());
    }

    #[test]
    fn test_toggles_are_idempotent() {
        let flags = RuntimeFlags::new();
        flags.set_paused(true);
        flags.set_paused(true);
        assert!(flags.paused());
        flags.set_paused(false);
        assert!(!flags.paused());
    }

    #[test]
    fn test_flags_are_independent() {
        let flags = RuntimeFlags::new();
        flags.set_stream_frames(true);
        assert!(flags.stream_frames());
        assert!(!flags.paused());
        assert!(!flags.slow_cadence());
        assert!(!flags.logging_enabled());
    }
}
