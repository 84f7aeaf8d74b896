//! Game state derivation from lander telemetry

use super::session::{DerivedState, Telemetry};

/// Velocity (both axes) below which touchdown is survivable
pub const LANDABLE_SPEED: f32 = 10.0;

/// Terminal or running game outcome, as shown to the pilot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Flying,
    Crashed,
    Landed,
}

impl DerivedState {
    /// Recompute flags from the current telemetry.
    ///
    /// `landed` is only ever set here, never cleared. `landable` compares the
    /// signed velocities, so any negative component counts as slow enough.
    pub fn update(&mut self, telemetry: &Telemetry) {
        if !telemetry.crashed && !telemetry.flying {
            self.landed = true;
        }
        self.landable = telemetry.vx < LANDABLE_SPEED && telemetry.vy < LANDABLE_SPEED;
    }
}

impl GameOutcome {
    /// Crashed wins over landed
    pub fn from_state(telemetry: &Telemetry, derived: &DerivedState) -> Self {
        if telemetry.crashed {
            Self::Crashed
        } else if derived.landed {
            Self::Landed
        } else {
            Self::Flying
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Flying)
    }
}
