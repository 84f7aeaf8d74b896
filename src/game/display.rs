//! Pilot display: read-only rendering of the session at its own cadence

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::pilot::{LedState, OutputSink, Tone};

use super::session::SessionState;
use super::status::GameOutcome;

const NOTE_MS: u32 = 100;

const D6: f32 = 1174.66;
const A5: f32 = 880.00;
const E5: f32 = 659.25;

pub const CRASH_TUNE: [Tone; 5] = [
    Tone::note(D6, NOTE_MS),
    Tone::note(A5, NOTE_MS),
    Tone::note(E5, NOTE_MS),
    Tone::note(E5, NOTE_MS),
    Tone::note(E5, NOTE_MS),
];

pub const LAND_TUNE: [Tone; 6] = [
    Tone::note(A5, NOTE_MS),
    Tone::rest(500),
    Tone::note(A5, NOTE_MS),
    Tone::note(D6, NOTE_MS),
    Tone::note(D6, NOTE_MS),
    Tone::note(D6, NOTE_MS),
];

/// Screen text and LEDs for a session snapshot
pub fn screen(state: &SessionState) -> (Vec<String>, LedState) {
    match GameOutcome::from_state(&state.telemetry, &state.derived) {
        GameOutcome::Crashed => (
            vec!["YOU CRASHED, GAME OVER".to_string()],
            LedState {
                red: true,
                green: false,
            },
        ),
        GameOutcome::Landed => (
            vec!["YOU LANDED!".to_string()],
            LedState {
                red: false,
                green: true,
            },
        ),
        GameOutcome::Flying => {
            let velocity = if state.derived.landable {
                "LANDABLE"
            } else {
                "TOO FAST"
            };
            (
                vec![
                    format!(
                        "Throttle : {} | Fuel : {}",
                        state.command.throttle, state.telemetry.fuel
                    ),
                    format!("Roll : {:.2}", state.command.roll),
                    format!("Velocity: {velocity}"),
                ],
                LedState {
                    red: false,
                    green: false,
                },
            )
        }
    }
}

/// Renders snapshots to an output sink, playing a tune on entering an end state
pub struct DisplayRenderer<O> {
    sink: O,
    last_outcome: GameOutcome,
}

impl<O: OutputSink> DisplayRenderer<O> {
    pub fn new(sink: O) -> Self {
        Self {
            sink,
            last_outcome: GameOutcome::Flying,
        }
    }

    pub fn render(&mut self, state: &SessionState) {
        let outcome = GameOutcome::from_state(&state.telemetry, &state.derived);
        let (lines, leds) = screen(state);

        self.sink.set_leds(leds);
        self.sink.show(&lines);

        if outcome != self.last_outcome && outcome.is_terminal() {
            let tune: &[Tone] = if outcome == GameOutcome::Crashed {
                &CRASH_TUNE
            } else {
                &LAND_TUNE
            };
            self.sink.play(tune);
        }
        self.last_outcome = outcome;
    }

    #[cfg(test)]
    pub fn sink(&self) -> &O {
        &self.sink
    }
}

/// Refresh the display every `period` until shutdown
pub async fn run_display<O: OutputSink>(
    mut state_rx: watch::Receiver<SessionState>,
    sink: O,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut renderer = DisplayRenderer::new(sink);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(period_ms = period.as_millis() as u64, "Display started");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let state = *state_rx.borrow_and_update();
                renderer.render(&state);
            }
        }
    }

    debug!("Display stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::{ControlCommand, DerivedState, Telemetry};

    #[derive(Default)]
    struct RecordingSink {
        screens: Vec<Vec<String>>,
        leds: Vec<LedState>,
        tunes: Vec<Vec<Tone>>,
    }

    impl OutputSink for RecordingSink {
        fn show(&mut self, lines: &[String]) {
            self.screens.push(lines.to_vec());
        }

        fn set_leds(&mut self, leds: LedState) {
            self.leds.push(leds);
        }

        fn play(&mut self, tune: &[Tone]) {
            self.tunes.push(tune.to_vec());
        }
    }

    fn flying(throttle: u8, fuel: i32, landable: bool) -> SessionState {
        SessionState {
            command: ControlCommand {
                throttle,
                roll: -0.25,
            },
            telemetry: Telemetry {
                fuel,
                flying: true,
                ..Default::default()
            },
            derived: DerivedState {
                landed: false,
                landable,
            },
            ..Default::default()
        }
    }

    #[test]
    fn flying_screen_shows_controls() {
        let (lines, leds) = screen(&flying(55, 80, false));
        assert_eq!(
            lines,
            vec![
                "Throttle : 55 | Fuel : 80".to_string(),
                "Roll : -0.25".to_string(),
                "Velocity: TOO FAST".to_string(),
            ]
        );
        assert_eq!(
            leds,
            LedState {
                red: false,
                green: false
            }
        );
        assert_eq!(screen(&flying(0, 0, true)).0[2], "Velocity: LANDABLE");
    }

    #[test]
    fn crash_overrides_landed() {
        let mut state = flying(0, 0, true);
        state.telemetry.crashed = true;
        state.derived.landed = true;
        let (lines, leds) = screen(&state);
        assert_eq!(lines, vec!["YOU CRASHED, GAME OVER".to_string()]);
        assert!(leds.red && !leds.green);
    }

    #[test]
    fn tune_plays_once_per_transition() {
        let mut renderer = DisplayRenderer::new(RecordingSink::default());
        renderer.render(&flying(30, 10, true));

        let mut landed = flying(0, 10, true);
        landed.telemetry.flying = false;
        landed.derived.landed = true;
        renderer.render(&landed);
        renderer.render(&landed);

        let sink = renderer.sink();
        assert_eq!(sink.tunes, vec![LAND_TUNE.to_vec()]);
        assert_eq!(sink.screens.len(), 3);
        assert_eq!(sink.screens[2], vec!["YOU LANDED!".to_string()]);
        assert!(sink.leds[2].green);
    }

    #[tokio::test]
    async fn display_task_stops_on_shutdown() {
        let (_state_tx, state_rx) = watch::channel(SessionState::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(run_display(
            state_rx,
            RecordingSink::default(),
            Duration::from_millis(5),
            shutdown_rx,
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
    }
}
