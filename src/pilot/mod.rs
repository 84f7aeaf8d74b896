//! Pilot-side collaborators: sensor inputs and display/tone outputs

pub mod console;

use crate::game::input::{SensorSample, Vector3};

/// Analog potentiometer channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PotChannel {
    /// Throttle
    Left,
}

/// Digital switches on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitalInput {
    /// Held for full throttle; also the boost button
    FullThrottle,
    /// Held to cut the throttle
    CutThrottle,
}

/// Source of raw pilot signals, read once per fast tick
pub trait SensorSource: Send {
    fn read_tilt(&mut self) -> Vector3;

    /// Position in `0.0..=1.0`
    fn read_potentiometer(&mut self, channel: PotChannel) -> f32;

    /// `true` when the switch is asserted
    fn read_digital_input(&mut self, input: DigitalInput) -> bool;

    /// Gather everything the input normalizer needs
    fn sample(&mut self) -> SensorSample {
        SensorSample {
            tilt: self.read_tilt(),
            potentiometer: self.read_potentiometer(PotChannel::Left),
            override_high: self.read_digital_input(DigitalInput::FullThrottle),
            override_low: self.read_digital_input(DigitalInput::CutThrottle),
        }
    }
}

/// Status LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedState {
    pub red: bool,
    pub green: bool,
}

/// A note, or a rest when `frequency_hz` is `None`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: Option<f32>,
    pub duration_ms: u32,
}

impl Tone {
    pub const fn note(frequency_hz: f32, duration_ms: u32) -> Self {
        Self {
            frequency_hz: Some(frequency_hz),
            duration_ms,
        }
    }

    pub const fn rest(duration_ms: u32) -> Self {
        Self {
            frequency_hz: None,
            duration_ms,
        }
    }
}

/// Display, LED and speaker output
pub trait OutputSink: Send {
    fn show(&mut self, lines: &[String]);
    fn set_leds(&mut self, leds: LedState);
    fn play(&mut self, tune: &[Tone]);
}
