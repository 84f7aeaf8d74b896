//! Console pilot panel
//!
//! Stands in for the controller hardware: stdin commands move the virtual
//! potentiometer, tilt and switches, and the boost button raises events on the
//! controller timeline without blocking it. Display output is rendered
//! through tracing.

use std::io::{self, BufRead};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::game::input::Vector3;
use crate::game::{BoostEdge, PilotEvent};
use crate::util::time::unix_millis;

use super::{DigitalInput, LedState, OutputSink, PotChannel, SensorSource, Tone};

/// Current position of every virtual control
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    pub tilt: Vector3,
    pub left_pot: f32,
    pub full_throttle: bool,
    pub cut_throttle: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            // lying flat
            tilt: Vector3::new(0.0, 0.0, 1.0),
            left_pot: 0.0,
            full_throttle: false,
            cut_throttle: false,
        }
    }
}

/// Shared handle to the virtual controls
#[derive(Clone, Default)]
pub struct PilotPanel {
    state: Arc<Mutex<PanelState>>,
}

impl PilotPanel {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> PanelState {
        *self.state.lock()
    }

    /// Apply a non-event command to the panel
    fn apply(&self, command: &PanelCommand) {
        let mut state = self.state.lock();
        match *command {
            PanelCommand::Pot(value) => state.left_pot = value,
            PanelCommand::Tilt(tilt) => state.tilt = tilt,
            PanelCommand::Full(on) => state.full_throttle = on,
            PanelCommand::Cut(on) => state.cut_throttle = on,
            PanelCommand::Boost(_) => {}
        }
    }
}

impl SensorSource for PilotPanel {
    fn read_tilt(&mut self) -> Vector3 {
        self.state.lock().tilt
    }

    fn read_potentiometer(&mut self, channel: PotChannel) -> f32 {
        match channel {
            PotChannel::Left => self.state.lock().left_pot,
        }
    }

    fn read_digital_input(&mut self, input: DigitalInput) -> bool {
        let state = self.state.lock();
        match input {
            DigitalInput::FullThrottle => state.full_throttle,
            DigitalInput::CutThrottle => state.cut_throttle,
        }
    }
}

/// One line of console input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelCommand {
    Pot(f32),
    Tilt(Vector3),
    Full(bool),
    Cut(bool),
    Boost(BoostEdge),
}

/// Console input errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PanelCommandError {
    #[error("unknown command '{0}' (expected pot, tilt, full, cut or boost)")]
    Unknown(String),

    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),

    #[error("invalid argument '{value}' for '{command}'")]
    InvalidArgument { command: &'static str, value: String },
}

impl PanelCommand {
    pub fn parse(line: &str) -> Result<Self, PanelCommandError> {
        let mut words = line.split_whitespace();
        let name = words.next().unwrap_or_default();

        match name {
            "pot" => {
                let value = parse_number("pot", words.next())?;
                if !(0.0..=1.0).contains(&value) {
                    return Err(PanelCommandError::InvalidArgument {
                        command: "pot",
                        value: value.to_string(),
                    });
                }
                Ok(Self::Pot(value))
            }
            "tilt" => {
                let x = parse_number("tilt", words.next())?;
                let y = parse_number("tilt", words.next())?;
                let z = parse_number("tilt", words.next())?;
                Ok(Self::Tilt(Vector3::new(x, y, z)))
            }
            "full" => parse_switch("full", words.next()).map(Self::Full),
            "cut" => parse_switch("cut", words.next()).map(Self::Cut),
            "boost" => match words.next() {
                Some("press") => Ok(Self::Boost(BoostEdge::Pressed)),
                Some("release") => Ok(Self::Boost(BoostEdge::Released)),
                Some(other) => Err(PanelCommandError::InvalidArgument {
                    command: "boost",
                    value: other.to_string(),
                }),
                None => Err(PanelCommandError::MissingArgument("boost")),
            },
            other => Err(PanelCommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_number(command: &'static str, word: Option<&str>) -> Result<f32, PanelCommandError> {
    let word = word.ok_or(PanelCommandError::MissingArgument(command))?;
    word.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| PanelCommandError::InvalidArgument {
            command,
            value: word.to_string(),
        })
}

fn parse_switch(command: &'static str, word: Option<&str>) -> Result<bool, PanelCommandError> {
    match word {
        Some("on") | Some("1") => Ok(true),
        Some("off") | Some("0") => Ok(false),
        Some(other) => Err(PanelCommandError::InvalidArgument {
            command,
            value: other.to_string(),
        }),
        None => Err(PanelCommandError::MissingArgument(command)),
    }
}

/// Handle one console line. Boost edges only enqueue an event, never block.
///
/// Returns `false` once the controller timeline has gone away.
pub fn handle_line(line: &str, panel: &PilotPanel, event_tx: &mpsc::Sender<PilotEvent>) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    match PanelCommand::parse(line) {
        Ok(PanelCommand::Boost(edge)) => {
            let event = PilotEvent {
                edge,
                received_at: unix_millis(),
            };
            match event_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    warn!(edge = ?event.edge, "Pilot event queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Pilot event channel closed");
                    return false;
                }
            }
        }
        Ok(command) => {
            panel.apply(&command);
            debug!(?command, "Panel updated");
        }
        Err(e) => warn!(error = %e, "Ignoring console input"),
    }
    true
}

/// Read pilot commands from stdin on a dedicated thread.
///
/// The thread is never joined: a blocking stdin read cannot be cancelled, and
/// it ends with the process.
pub fn spawn_console(
    panel: PilotPanel,
    event_tx: mpsc::Sender<PilotEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    info!("Console pilot ready: pot <0..1> | tilt <x> <y> <z> | full on|off | cut on|off | boost press|release");

    thread::Builder::new()
        .name("console-pilot".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if !handle_line(&line, &panel, &event_tx) {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Console read failed");
                        break;
                    }
                }
            }
            debug!("Console input closed");
        })
}

/// Output sink that renders the display into the log
#[derive(Default)]
pub struct ConsoleDisplay {
    leds: Option<LedState>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for ConsoleDisplay {
    fn show(&mut self, lines: &[String]) {
        info!(target: "display", "{}", lines.join(" | "));
    }

    fn set_leds(&mut self, leds: LedState) {
        if self.leds != Some(leds) {
            debug!(target: "display", red = leds.red, green = leds.green, "LEDs");
            self.leds = Some(leds);
        }
    }

    fn play(&mut self, tune: &[Tone]) {
        let notes: Vec<String> = tune
            .iter()
            .map(|tone| match tone.frequency_hz {
                Some(hz) => format!("{hz:.2}Hz/{}ms", tone.duration_ms),
                None => format!("rest/{}ms", tone.duration_ms),
            })
            .collect();
        info!(target: "display", tune = %notes.join(" "), "Playing tune");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_panel_commands() {
        assert_eq!(PanelCommand::parse("pot 0.75"), Ok(PanelCommand::Pot(0.75)));
        assert_eq!(
            PanelCommand::parse("tilt 0.5 0 0.866"),
            Ok(PanelCommand::Tilt(Vector3::new(0.5, 0.0, 0.866)))
        );
        assert_eq!(PanelCommand::parse("full on"), Ok(PanelCommand::Full(true)));
        assert_eq!(PanelCommand::parse("cut 0"), Ok(PanelCommand::Cut(false)));
        assert_eq!(
            PanelCommand::parse("boost press"),
            Ok(PanelCommand::Boost(BoostEdge::Pressed))
        );
    }

    #[test]
    fn rejects_malformed_commands() {
        assert_eq!(
            PanelCommand::parse("warp 9"),
            Err(PanelCommandError::Unknown("warp".to_string()))
        );
        assert_eq!(
            PanelCommand::parse("tilt 1 2"),
            Err(PanelCommandError::MissingArgument("tilt"))
        );
        assert!(matches!(
            PanelCommand::parse("pot 1.5"),
            Err(PanelCommandError::InvalidArgument { command: "pot", .. })
        ));
        assert!(matches!(
            PanelCommand::parse("full maybe"),
            Err(PanelCommandError::InvalidArgument { command: "full", .. })
        ));
    }

    #[test]
    fn panel_feeds_sensor_sample() {
        let mut panel = PilotPanel::new();
        panel.apply(&PanelCommand::Pot(0.4));
        panel.apply(&PanelCommand::Cut(true));

        let sample = panel.sample();
        assert_eq!(sample.potentiometer, 0.4);
        assert!(sample.override_low);
        assert!(!sample.override_high);
        assert_eq!(sample.tilt, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn boost_lines_become_events() {
        let panel = PilotPanel::new();
        let (tx, mut rx) = mpsc::channel(4);

        assert!(handle_line("boost press", &panel, &tx));
        assert!(handle_line("pot 0.2", &panel, &tx));
        assert!(handle_line("nonsense", &panel, &tx));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.edge, BoostEdge::Pressed);
        assert!(rx.try_recv().is_err());
        assert_eq!(panel.snapshot().left_pot, 0.2);
    }

    #[test]
    fn full_queue_drops_event_but_keeps_reading() {
        let panel = PilotPanel::new();
        let (tx, mut rx) = mpsc::channel(1);

        assert!(handle_line("boost press", &panel, &tx));
        assert!(handle_line("boost release", &panel, &tx));

        assert_eq!(rx.try_recv().unwrap().edge, BoostEdge::Pressed);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stops_when_timeline_is_gone() {
        let panel = PilotPanel::new();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        assert!(!handle_line("boost release", &panel, &tx));
    }
}
