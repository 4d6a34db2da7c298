//! Binary entry point: argument parsing, pipeline assembly, shutdown.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use facetrack_capture::{
    BlobDetector, DetectorConfig, FaceDetector, FrameSource, ImageSequenceCamera, Overlay,
    SyntheticCamera, UnavailableDetector,
};
use facetrack_core::FaceTracker;
use facetrack_server::config::{Args, DetectorSelection, ServerConfig, SourceSelection};
use facetrack_server::logsink::PayloadLog;
use facetrack_server::orchestrator::Orchestrator;
use facetrack_server::state::{AppState, SharedState};
use facetrack_server::ws;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Args::parse().into_config()?;
    run(config).await
}

async fn run(config: ServerConfig) -> Result<()> {
    let source = build_source(&config)?;
    if !source.available() {
        warn!(
            source = source.name(),
            "frame source reports unavailable at startup"
        );
    }
    let detector = build_detector(&config);
    if !detector.available() {
        warn!(
            detector = detector.name(),
            "detector reports unavailable, stream will publish no_face heartbeats"
        );
    }
    let overlay = match &config.overlay_font {
        Some(path) => Overlay::from_font_file(path)
            .with_context(|| format!("cannot load overlay font {}", path.display()))?,
        None => Overlay::new(),
    };

    let state: SharedState = Arc::new(AppState::new(source.name(), detector.name()));
    let orchestrator = Orchestrator::new(
        Arc::clone(&state),
        source,
        detector,
        FaceTracker::new(config.tracker),
        overlay,
        PayloadLog::new(&config.log_path),
        config.cadence,
    );
    let running = orchestrator.shutdown_handle();
    let loop_task = tokio::spawn(orchestrator.run());

    let app = ws::router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("face tracking stream on ws://{}/ws", config.listen);
    info!("health document on http://{}/health", config.listen);

    let server_task = tokio::spawn(async move {
        if let Err(error) = axum::serve(listener, app).await {
            error!(%error, "server error");
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown signal received");

    // Stop the loop first so no payload is broadcast into closing sockets,
    // then drop subscriber channels so every handler unblocks and returns.
    running.store(false, Ordering::Relaxed);
    if let Err(error) = loop_task.await {
        error!(%error, "tracking loop task failed");
    }
    state.registry.close_all();
    server_task.abort();
    info!("shutdown complete");
    Ok(())
}

fn build_source(config: &ServerConfig) -> Result<Box<dyn FrameSource>> {
    match config.source {
        SourceSelection::Synthetic => {
            info!("using synthetic camera");
            Ok(Box::new(SyntheticCamera::new(config.camera)))
        }
        SourceSelection::Files => {
            let dir = config
                .frames_dir
                .as_ref()
                .context("files source requires a frame directory")?;
            let camera = ImageSequenceCamera::open(dir)
                .with_context(|| format!("cannot open frame directory {}", dir.display()))?;
            info!(frames = camera.len(), dir = %dir.display(), "using image sequence source");
            Ok(Box::new(camera))
        }
        SourceSelection::Auto => {
            if let Some(dir) = &config.frames_dir {
                match ImageSequenceCamera::open(dir) {
                    Ok(camera) => {
                        info!(
                            frames = camera.len(),
                            dir = %dir.display(),
                            "auto source: using image sequence"
                        );
                        return Ok(Box::new(camera));
                    }
                    Err(fault) => {
                        warn!(error = %fault, "auto source: frame directory unusable, falling back");
                    }
                }
            }
            info!("auto source: using synthetic camera");
            Ok(Box::new(SyntheticCamera::new(config.camera)))
        }
    }
}

fn build_detector(config: &ServerConfig) -> Box<dyn FaceDetector> {
    match config.detector {
        DetectorSelection::Blob => Box::new(BlobDetector::new(DetectorConfig::default())),
        DetectorSelection::Off => Box::new(UnavailableDetector),
    }
}
