//! Face tracking broadcast server.
//!
//! Wires the capture pipeline to a WebSocket fan-out:
//!
//! - **orchestrator**: the sampling loop driving source, detector, tracker
//! - **registry**: subscriber bookkeeping for the publish channel
//! - **protocol**: payload and control-command wire types
//! - **ws**: the `/ws` endpoint and `/health` document
//! - **config**: command line arguments and their validated runtime form
//! - **logsink**: append-only JSONL log for broadcast payloads
//!
//! The binary in `main.rs` assembles these; everything here is also usable
//! from integration tests without opening sockets.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logsink;
pub mod orchestrator;
pub mod protocol;
pub mod registry;
pub mod state;
pub mod ws;

pub use config::{Args, DetectorSelection, ServerConfig, SourceSelection};
pub use logsink::PayloadLog;
pub use orchestrator::{CadenceConfig, Orchestrator};
pub use protocol::{CameraStatusMessage, ControlCommand, FacePayload, StatusPayload};
pub use registry::{SubscriberId, SubscriberRegistry};
pub use state::{AppState, SharedState};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
