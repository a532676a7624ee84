//! Readalong sync service - Main entry point
//!
//! Loads the transcript and chapter documents, wires the alignment engine
//! to a playback source (external by default, simulated with --simulate),
//! and serves the HTTP/SSE control interface.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use readalong_common::events::EventBus;
use readalong_sync::config::{Config, ConfigOverrides};
use readalong_sync::state::{BookInfo, SharedState};
use readalong_sync::sync::{PlaybackSource, RemotePlayer, SimulatedPlayer, SyncEngine};
use readalong_sync::{api, transcript};

/// Command-line arguments for readalong-sync
#[derive(Parser, Debug)]
#[command(name = "readalong-sync")]
#[command(about = "Audio/transcript sync service for Readalong")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "READALONG_PORT")]
    port: Option<u16>,

    /// Path to TOML configuration file
    #[arg(short, long, env = "READALONG_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the transcript JSON document
    #[arg(short, long, env = "READALONG_TRANSCRIPT")]
    transcript: Option<PathBuf>,

    /// Path to the chapters JSON document
    #[arg(long, env = "READALONG_CHAPTERS")]
    chapters: Option<PathBuf>,

    /// Drive playback with the built-in simulated player
    #[arg(long)]
    simulate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readalong_sync=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments
    let args = Args::parse();

    let config = Config::load(ConfigOverrides {
        config_path: args.config,
        port: args.port,
        transcript_path: args.transcript,
        chapters_path: args.chapters,
        simulate: args.simulate,
    })
    .context("Failed to load configuration")?;

    info!("Starting Readalong sync service on port {}", config.port);

    // Load the data documents
    let transcript_doc = transcript::load_transcript(&config.transcript_path)
        .await
        .context("Failed to load transcript document")?;

    let chapters_doc = match &config.chapters_path {
        Some(path) => Some(
            transcript::load_chapters(path)
                .await
                .context("Failed to load chapter document")?,
        ),
        None => None,
    };

    let units = transcript_doc.units();
    let book = BookInfo {
        title: chapters_doc
            .as_ref()
            .map(|d| d.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        author: chapters_doc.as_ref().and_then(|d| d.author.clone()),
        narrator: chapters_doc.as_ref().and_then(|d| d.narrator.clone()),
        chapter_count: chapters_doc.as_ref().map(|d| d.chapters.len()).unwrap_or(0),
        word_count: units.len(),
        duration: transcript_doc.duration,
    };
    let chapter_list = chapters_doc.map(|d| d.chapters).unwrap_or_default();

    // Wire the engine to its playback source
    let events = Arc::new(EventBus::new(256));
    let engine = SyncEngine::new(units, chapter_list, events.clone());

    let simulated = config.simulate.then(|| Arc::new(SimulatedPlayer::new()));
    let player: Arc<dyn PlaybackSource> = match &simulated {
        Some(sim) => sim.clone(),
        None => Arc::new(RemotePlayer::new()),
    };

    let state = Arc::new(SharedState::new(engine, player, events, book));

    // Demo mode: a fixed one-second tick drives the engine
    if let Some(sim) = simulated {
        info!("Simulated playback enabled (1s tick)");
        sim.play();
        let tick_state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            loop {
                interval.tick().await;
                let position = sim.tick(1.0);
                tick_state.engine.write().await.handle_tick(position);
            }
        });
    }

    // Build the application router
    let app = api::create_router(api::AppState {
        shared: state,
        port: config.port,
    });

    // Create socket address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting HTTP server on {}", addr);

    // Create and run the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
