//! Controller game logic

pub mod controller;
pub mod dashboard;
pub mod display;
pub mod input;
pub mod session;
pub mod status;

pub use controller::{ControllerHandle, LanderController};

/// Edge of the boost button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoostEdge {
    Pressed,
    Released,
}

/// Discrete pilot event queued onto the controller timeline
#[derive(Debug, Clone)]
pub struct PilotEvent {
    pub edge: BoostEdge,
    pub received_at: u64,
}
