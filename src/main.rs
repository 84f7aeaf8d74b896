//! Lander Controller - pilot station for the remote lander game
//!
//! This is the main entry point for the controller. It handles:
//! - Sampling pilot input into throttle/roll commands
//! - Synchronous UDP command/telemetry exchange with the lander
//! - Best-effort state broadcast to the dashboard
//! - The pilot display and the console stand-in for the controller hardware

mod app;
mod config;
mod game;
mod net;
mod pilot;
mod util;

use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::{Config, LogFormat};
use crate::game::display::run_display;
use crate::pilot::console::{spawn_console, ConsoleDisplay};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    let started = Instant::now();

    info!("Starting Lander Controller");
    info!("Lander is on {}", config.lander_addr);
    info!("Dashboard is on {}", config.dashboard_addr);

    // One socket for both the lander exchange and the dashboard broadcast
    let socket = Arc::new(UdpSocket::bind(config.bind_addr).await?);
    info!("UDP bound to {}", socket.local_addr()?);

    let (state, controller) = AppState::new(config, socket);
    info!(session_id = %state.controller.session_id, "Session created");

    // Controller timeline: the only writer of session state
    let controller_task = tokio::spawn(controller.run(state.shutdown_rx()));

    // Display reads snapshots at its own cadence
    let display_task = tokio::spawn(run_display(
        state.controller.state_rx.clone(),
        ConsoleDisplay::new(),
        state.config.display_tick,
        state.shutdown_rx(),
    ));

    // Console pilot stands in for the controller hardware
    spawn_console(state.panel.clone(), state.controller.event_tx.clone())?;

    shutdown_signal().await;
    state.shutdown();

    let stats = controller_task.await?;
    display_task.await?;

    info!(
        uptime_secs = started.elapsed().as_secs(),
        fast_ticks = stats.fast_ticks,
        sync_failures = stats.sync_failures,
        "Controller shutdown complete"
    );
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
