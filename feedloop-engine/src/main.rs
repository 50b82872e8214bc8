//! Playback Engine (feedloop-engine) - Main entry point
//!
//! Replays project stream sources onto the message bus and serves the
//! observer WebSocket plus health/status endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedloop_engine::api::{self, AppState};
use feedloop_engine::config::EngineConfig;
use feedloop_engine::playback::TcpEmitter;
use feedloop_engine::SharedState;

/// Command-line arguments for feedloop-engine
#[derive(Parser, Debug)]
#[command(name = "feedloop-engine")]
#[command(about = "Playback engine for feedloop data streams")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to the stream-definition database
    #[arg(short, long)]
    database: Option<String>,

    /// Message bus address (host:port)
    #[arg(short, long)]
    bus: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedloop_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command-line arguments and resolve configuration
    let args = Args::parse();
    let config = EngineConfig::resolve(args.port, args.database.as_deref(), args.bus.as_deref())
        .context("Failed to resolve configuration")?;

    info!("Starting feedloop playback engine on port {}", config.port);
    info!("Stream definitions: {}", config.database_path.display());
    info!("Message bus: {}", config.bus_addr);

    // Open the record store (created on first run)
    let db = feedloop_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    // Bus connection is lazy; an unreachable bus surfaces per publish
    let emitter = Arc::new(TcpEmitter::new(config.bus_addr.clone()));

    let state = Arc::new(SharedState::new(db, emitter));

    // Build the application router
    let app_state = AppState {
        state,
        port: config.port,
    };
    let app = api::create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

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
