//! Append-only JSONL sink for broadcast payloads.
//!
//! The file is opened per append so the sink holds no descriptor between
//! ticks and the file can be rotated or deleted underneath it. Write
//! failures never reach the tracking loop; the first failure of a streak is
//! logged and the rest are suppressed until a write succeeds again.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

/// Payload log writing one JSON document per line.
#[derive(Debug)]
pub struct PayloadLog {
    path: PathBuf,
    failing: AtomicBool,
}

impl PayloadLog {
    /// Creates a sink for `path`. The file itself is created on first
    /// append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            failing: AtomicBool::new(false),
        }
    }

    /// Target path of the sink.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one payload line. Failures are contained here.
    pub fn append(&self, json: &str) {
        match self.write_line(json) {
            Ok(()) => {
                if self.failing.swap(false, Ordering::Relaxed) {
                    debug!(path = %self.path.display(), "payload log recovered");
                }
            }
            Err(error) => {
                if !self.failing.swap(true, Ordering::Relaxed) {
                    warn!(
                        path = %self.path.display(),
                        %error,
                        "payload log write failed"
                    );
                }
            }
        }
    }

    fn write_line(&self, json: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}
