//! Command line arguments and their validated runtime form.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use facetrack_capture::CameraConfig;
use facetrack_core::TrackerConfig;

use crate::orchestrator::CadenceConfig;

#[derive(Parser, Debug)]
#[command(name = "facetrack-server", about = "Face tracking broadcast server")]
pub struct Args {
    /// WebSocket port for the tracking stream
    #[arg(long, default_value = "8765")]
    pub port: u16,

    /// Bind address for the listeners
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Frame source: auto, synthetic, files
    #[arg(long, default_value = "auto")]
    pub source: String,

    /// Directory of still images for the files source
    #[arg(long, value_name = "DIR")]
    pub frames_dir: Option<PathBuf>,

    /// Capture device index
    #[arg(long, default_value = "0")]
    pub device: u32,

    /// Capture width in pixels
    #[arg(long, default_value = "640")]
    pub width: u32,

    /// Capture height in pixels
    #[arg(long, default_value = "480")]
    pub height: u32,

    /// Smoothing weight kept on the previous track per tick
    #[arg(long, default_value = "0.6")]
    pub smoothing: f32,

    /// Confidence decay applied per faceless tick
    #[arg(long, default_value = "0.85")]
    pub decay: f32,

    /// Confidence floor below which a track becomes no_face
    #[arg(long, default_value = "0.02")]
    pub epsilon: f32,

    /// Tick interval in milliseconds
    #[arg(long, default_value = "10")]
    pub tick_ms: u64,

    /// Tick interval while slow mode is on
    #[arg(long, default_value = "150")]
    pub slow_tick_ms: u64,

    /// Delay after a camera failure
    #[arg(long, default_value = "100")]
    pub camera_backoff_ms: u64,

    /// Delay after a detector failure
    #[arg(long, default_value = "200")]
    pub detector_backoff_ms: u64,

    /// JSONL file receiving payloads while logging is on
    #[arg(long, default_value = "face_log.jsonl")]
    pub log_path: PathBuf,

    /// TrueType font for annotation labels
    #[arg(long, value_name = "PATH")]
    pub overlay_font: Option<PathBuf>,

    /// Face detector: blob, off
    #[arg(long, default_value = "blob")]
    pub detector: String,
}

/// Frame source picked on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceSelection {
    /// Probe for a usable source, falling back to synthetic frames.
    Auto,
    /// Procedural frames with a moving synthetic face.
    Synthetic,
    /// Still images replayed from a directory.
    Files,
}

/// Detector picked on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorSelection {
    /// Brightness blob detector.
    Blob,
    /// No detection; every tick reports no candidates.
    Off,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds.
    pub listen: SocketAddr,
    /// Which frame source to build.
    pub source: SourceSelection,
    /// Capture geometry handed to the frame source.
    pub camera: CameraConfig,
    /// Image directory, required for [`SourceSelection::Files`].
    pub frames_dir: Option<PathBuf>,
    /// Which detector to build.
    pub detector: DetectorSelection,
    /// Smoothing parameters for the tracker.
    pub tracker: TrackerConfig,
    /// Loop timing.
    pub cadence: CadenceConfig,
    /// Payload log target.
    pub log_path: PathBuf,
    /// Optional label font for the overlay.
    pub overlay_font: Option<PathBuf>,
}

impl Args {
    /// Validates the arguments into a [`ServerConfig`].
    pub fn into_config(self) -> Result<ServerConfig> {
        let ip: IpAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address '{}'", self.bind))?;

        let source = match self.source.as_str() {
            "auto" => SourceSelection::Auto,
            "synthetic" => SourceSelection::Synthetic,
            "files" => SourceSelection::Files,
            other => bail!("unknown source '{other}', expected auto, synthetic or files"),
        };
        if source == SourceSelection::Files && self.frames_dir.is_none() {
            bail!("--source files requires --frames-dir");
        }

        let detector = match self.detector.as_str() {
            "blob" => DetectorSelection::Blob,
            "off" => DetectorSelection::Off,
            other => bail!("unknown detector '{other}', expected blob or off"),
        };

        let tracker = TrackerConfig {
            smoothing: self.smoothing,
            decay: self.decay,
            epsilon: self.epsilon,
        };
        tracker.validate().context("tracker parameters")?;

        if self.width == 0 || self.height == 0 {
            bail!("capture size must be non-zero");
        }

        Ok(ServerConfig {
            listen: SocketAddr::new(ip, self.port),
            source,
            camera: CameraConfig {
                device_index: self.device,
                width: self.width,
                height: self.height,
            },
            frames_dir: self.frames_dir,
            detector,
            tracker,
            cadence: CadenceConfig::from_millis(
                self.tick_ms,
                self.slow_tick_ms,
                self.camera_backoff_ms,
                self.detector_backoff_ms,
            ),
            log_path: self.log_path,
            overlay_font: self.overlay_font,
        })
    }
}
