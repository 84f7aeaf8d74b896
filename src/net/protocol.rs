//! Lander wire protocol
//!
//! Datagrams are newline-separated `key:value` text lines with no framing,
//! checksum or version field:
//! - command (controller -> lander): `command:!`, `throttle:<int>`, `roll:<.2f>`
//! - telemetry (lander -> controller): any subset of `altitude`, `fuel`,
//!   `flying`, `crashed`, `Vx`, `Vy`, in any order, CR and/or LF separated
//! - dashboard (controller -> observer): command, telemetry and derived flags

use std::fmt::Write;

use crate::game::session::{ControlCommand, SessionState, TelemetryPatch};

/// Receive buffer size for one datagram
pub const MAX_DATAGRAM: usize = 512;

/// Telemetry keys understood by the decoder (case-sensitive)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryKey {
    Altitude,
    Fuel,
    Flying,
    Crashed,
    Vx,
    Vy,
}

impl TelemetryKey {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "altitude" => Some(Self::Altitude),
            "fuel" => Some(Self::Fuel),
            "flying" => Some(Self::Flying),
            "crashed" => Some(Self::Crashed),
            "Vx" => Some(Self::Vx),
            "Vy" => Some(Self::Vy),
            _ => None,
        }
    }
}

/// Encode a control command datagram
pub fn encode_command(cmd: &ControlCommand) -> String {
    format!("command:!\nthrottle:{}\nroll:{:.2}\n", cmd.throttle, cmd.roll)
}

/// Decode a telemetry datagram into a sparse patch.
///
/// Never fails: lines without a colon, empty values, unknown keys and
/// unparsable values are skipped individually.
pub fn decode_telemetry(datagram: &[u8]) -> TelemetryPatch {
    let text = String::from_utf8_lossy(datagram);
    let mut patch = TelemetryPatch::default();

    for (key, value) in key_values(&text) {
        let Some(key) = TelemetryKey::from_key(key) else {
            continue;
        };
        match key {
            TelemetryKey::Altitude => patch.altitude = parse_float(value).or(patch.altitude),
            TelemetryKey::Fuel => patch.fuel = parse_int(value).or(patch.fuel),
            TelemetryKey::Flying => patch.flying = parse_flag(value).or(patch.flying),
            TelemetryKey::Crashed => patch.crashed = parse_flag(value).or(patch.crashed),
            TelemetryKey::Vx => patch.vx = parse_float(value).or(patch.vx),
            TelemetryKey::Vy => patch.vy = parse_float(value).or(patch.vy),
        }
    }

    patch
}

/// Encode the dashboard broadcast (no trailing newline)
pub fn encode_dashboard(state: &SessionState) -> String {
    let mut out = String::with_capacity(160);
    let cmd = &state.command;
    let t = &state.telemetry;
    let d = &state.derived;

    // Writing into a String cannot fail
    let _ = write!(
        out,
        "throttle:{}\nroll:{:.2}\naltitude:{:.2}\nfuel:{}\nflying:{}\ncrashed:{}\nVx:{:.2}\nVy:{:.2}\nlanded:{}\nlandable:{}",
        cmd.throttle,
        cmd.roll,
        t.altitude,
        t.fuel,
        u8::from(t.flying),
        u8::from(t.crashed),
        t.vx,
        t.vy,
        u8::from(d.landed),
        u8::from(d.landable),
    );
    out
}

/// Split text into `(key, value)` pairs on the first colon of each line
fn key_values(text: &str) -> impl Iterator<Item = (&str, &str)> {
    text.split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key, value.trim()))
        .filter(|(_, value)| !value.is_empty())
}

fn parse_float(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Integers also accept a fractional form, truncated toward zero
fn parse_int(value: &str) -> Option<i32> {
    value.parse::<i32>().ok().or_else(|| {
        parse_float(value)
            .filter(|v| *v >= i32::MIN as f32 && *v <= i32::MAX as f32)
            .map(|v| v.trunc() as i32)
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    parse_int(value).map(|v| v != 0)
}

#[cfg(test)]
pub(crate) fn decode_command(datagram: &[u8]) -> Option<ControlCommand> {
    let text = String::from_utf8_lossy(datagram);
    let mut is_command = false;
    let mut throttle = None;
    let mut roll = None;

    for (key, value) in key_values(&text) {
        match key {
            "command" => is_command = value == "!",
            "throttle" => throttle = parse_int(value),
            "roll" => roll = parse_float(value),
            _ => {}
        }
    }

    if !is_command {
        return None;
    }
    Some(ControlCommand::new(throttle?, roll?))
}
