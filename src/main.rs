//! kinetune - Main entry point
//!
//! Wires together the playlist catalog, SQLite settings store, simulated
//! transport, channel-fed motion sensor, coordinator task, and HTTP server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kinetune::api;
use kinetune::catalog::TrackCatalog;
use kinetune::config::Config;
use kinetune::events::EventBus;
use kinetune::motion::ChannelSensor;
use kinetune::player::{PlayerHandle, SimTransport};

/// Command-line arguments for kinetune
#[derive(Parser, Debug)]
#[command(name = "kinetune")]
#[command(about = "Motion-controlled music player daemon")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "kinetune.toml", env = "KINETUNE_CONFIG")]
    config: PathBuf,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "KINETUNE_PORT")]
    port: Option<u16>,

    /// Playlist file path (overrides the config file)
    #[arg(long, env = "KINETUNE_PLAYLIST")]
    playlist: Option<PathBuf>,

    /// Report the motion sensor as unavailable
    #[arg(long)]
    no_sensor: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config).context("Failed to load configuration")?;

    // RUST_LOG wins; the config file level is the fallback
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("kinetune={},tower_http=debug", config.logging.level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(playlist) = args.playlist {
        config.playlist_path = playlist;
    }

    info!("Starting kinetune on port {}", config.port);

    let catalog = Arc::new(
        TrackCatalog::load(&config.playlist_path).context("Failed to load playlist")?,
    );
    info!(
        "Loaded playlist: {} tracks from {}",
        catalog.len(),
        config.playlist_path.display()
    );

    let db = kinetune::db::connect(&config.database_path)
        .await
        .context("Failed to open database")?;

    let events = EventBus::new(256);
    let transport = Box::new(SimTransport::new(Arc::clone(&catalog)));
    let (sensor, sensor_feed) = ChannelSensor::new(!args.no_sensor);

    let player = PlayerHandle::spawn(
        &config,
        Arc::clone(&catalog),
        transport,
        Box::new(sensor),
        db,
        events.clone(),
    )
    .await
    .context("Failed to start playback coordinator")?;

    // Preload the first track so play is one tap away
    if let Some(first) = catalog.first_id() {
        player
            .select_track(first.to_string())
            .await
            .context("Failed to load initial track")?;
    }

    let ctx = api::AppContext {
        player: player.clone(),
        events,
        catalog,
        sensor_feed,
        port: config.port,
    };

    let app = api::create_router(ctx);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    player.shutdown().await.ok();
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
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
