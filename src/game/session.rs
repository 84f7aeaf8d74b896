//! Session data model: command, telemetry and derived flags

/// Highest throttle the lander accepts
pub const MAX_THROTTLE: u8 = 100;

/// Control command sent to the lander each fast tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControlCommand {
    /// Throttle percentage (0..=100)
    pub throttle: u8,
    /// Roll demand (-1.0 = full left, 1.0 = full right)
    pub roll: f32,
}

impl ControlCommand {
    /// Build a command, clamping both fields into range
    pub fn new(throttle: i32, roll: f32) -> Self {
        let roll = if roll.is_finite() { roll.clamp(-1.0, 1.0) } else { 0.0 };
        Self {
            throttle: throttle.clamp(0, MAX_THROTTLE as i32) as u8,
            roll,
        }
    }
}

/// Last known lander telemetry
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Telemetry {
    pub altitude: f32,
    pub fuel: i32,
    pub flying: bool,
    pub crashed: bool,
    pub vx: f32,
    pub vy: f32,
}

/// Sparse telemetry update decoded from one reply.
///
/// Only fields present in the datagram are `Some`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryPatch {
    pub altitude: Option<f32>,
    pub fuel: Option<i32>,
    pub flying: Option<bool>,
    pub crashed: Option<bool>,
    pub vx: Option<f32>,
    pub vy: Option<f32>,
}

impl TelemetryPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Number of fields carried by this patch
    pub fn field_count(&self) -> usize {
        [
            self.altitude.is_some(),
            self.fuel.is_some(),
            self.flying.is_some(),
            self.crashed.is_some(),
            self.vx.is_some(),
            self.vy.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

impl Telemetry {
    /// Merge a patch, keeping every field the patch does not mention
    pub fn apply(&mut self, patch: &TelemetryPatch) {
        if let Some(altitude) = patch.altitude {
            self.altitude = altitude;
        }
        if let Some(fuel) = patch.fuel {
            self.fuel = fuel;
        }
        if let Some(flying) = patch.flying {
            self.flying = flying;
        }
        if let Some(crashed) = patch.crashed {
            self.crashed = crashed;
        }
        if let Some(vx) = patch.vx {
            self.vx = vx;
        }
        if let Some(vy) = patch.vy {
            self.vy = vy;
        }
    }
}

/// Flags derived from telemetry after every successful sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DerivedState {
    /// Sticky: never cleared once set
    pub landed: bool,
    pub landable: bool,
}

/// Throttle held by the boost button between press and release.
///
/// While `Held`, the value replaces whatever the fast tick computes, including
/// the full-throttle and cut switches, until the release edge arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoostHold {
    #[default]
    Released,
    Held(u8),
}

/// Everything the controller timeline owns
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SessionState {
    pub command: ControlCommand,
    pub telemetry: Telemetry,
    pub derived: DerivedState,
    pub boost: BoostHold,
    /// Fast ticks executed so far
    pub tick: u64,
}
