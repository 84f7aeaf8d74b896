//! Handles shared between the controller, display and console tasks

use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;

use crate::config::Config;
use crate::game::{ControllerHandle, LanderController};
use crate::pilot::console::PilotPanel;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: ControllerHandle,
    pub panel: PilotPanel,
    shutdown_tx: Arc<watch::Sender<bool>>,
}

impl AppState {
    /// Build the shared handles and the controller that will own the session
    pub fn new(config: Config, socket: Arc<UdpSocket>) -> (Self, LanderController<UdpSocket, PilotPanel>) {
        let config = Arc::new(config);

        // Virtual controls read by the controller and written by the console
        let panel = PilotPanel::new();

        let (controller, handle) = LanderController::new(&config, socket, panel.clone());

        let (shutdown_tx, _) = watch::channel(false);

        let state = Self {
            config,
            controller: handle,
            panel,
            shutdown_tx: Arc::new(shutdown_tx),
        };

        (state, controller)
    }

    /// New receiver for the shutdown flag
    pub fn shutdown_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Ask every task to stop
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}
