//! Controller timeline: input sampling, lander sync and dashboard broadcast

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::net::sync::LanderLink;
use crate::net::transport::Transport;
use crate::pilot::{PotChannel, SensorSource};
use crate::util::rate_limit::{LogGate, TRANSPORT_WARN_RATE};
use crate::util::time::unix_millis;

use super::dashboard::{DashboardPublisher, DashboardStats};
use super::input::InputNormalizer;
use super::session::{BoostHold, SessionState};
use super::status::GameOutcome;
use super::{BoostEdge, PilotEvent};

/// Pilot events that may be queued before the timeline drains them
const EVENT_QUEUE_DEPTH: usize = 64;

/// Counters reported when the timeline stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControllerStats {
    pub fast_ticks: u64,
    pub syncs_ok: u64,
    pub sync_failures: u64,
    pub events: u64,
    pub dashboard: DashboardStats,
}

/// Handle to a running controller
#[derive(Clone)]
pub struct ControllerHandle {
    pub session_id: Uuid,
    /// Queue pilot events onto the timeline
    pub event_tx: mpsc::Sender<PilotEvent>,
    /// Read-only view of the latest session state
    pub state_rx: watch::Receiver<SessionState>,
}

/// The single-writer controller timeline.
///
/// Owns the [`SessionState`]; every mutation happens inside one of its ticks
/// or event handlers, and other tasks only see copies through the watch channel.
pub struct LanderController<T, S> {
    session_id: Uuid,
    started_at: DateTime<Utc>,
    state: SessionState,
    sensors: S,
    link: LanderLink<T>,
    dashboard: DashboardPublisher<T>,
    event_rx: mpsc::Receiver<PilotEvent>,
    state_tx: watch::Sender<SessionState>,
    fast_tick: Duration,
    slow_tick: Duration,
    stats: ControllerStats,
    sync_warn_gate: LogGate,
}

impl<T: Transport, S: SensorSource> LanderController<T, S> {
    /// Create a controller bound to `transport`
    pub fn new(config: &Config, transport: Arc<T>, sensors: S) -> (Self, ControllerHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (state_tx, state_rx) = watch::channel(SessionState::default());
        let session_id = Uuid::new_v4();

        let handle = ControllerHandle {
            session_id,
            event_tx,
            state_rx,
        };

        let controller = Self {
            session_id,
            started_at: Utc::now(),
            state: SessionState::default(),
            sensors,
            link: LanderLink::new(transport.clone(), config.lander_addr, config.recv_timeout),
            dashboard: DashboardPublisher::new(transport, config.dashboard_addr),
            event_rx,
            state_tx,
            fast_tick: config.fast_tick,
            slow_tick: config.slow_tick,
            stats: ControllerStats::default(),
            sync_warn_gate: LogGate::new(TRANSPORT_WARN_RATE),
        };

        (controller, handle)
    }

    /// Run the timeline until `shutdown` flips to `true` or its sender drops
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> ControllerStats {
        info!(
            session_id = %self.session_id,
            started_at = %self.started_at.to_rfc3339(),
            lander = %self.link.lander(),
            fast_tick_ms = self.fast_tick.as_millis() as u64,
            slow_tick_ms = self.slow_tick.as_millis() as u64,
            "Controller started"
        );

        // A sync that overruns the fast interval skips ticks rather than overlapping them
        let mut fast = interval(self.fast_tick);
        fast.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut slow = interval(self.slow_tick);
        slow.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let started = Instant::now();

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                Some(event) = self.event_rx.recv() => {
                    self.handle_event(event);
                }

                // Publishing never blocks; polled ahead of the fast tick so a
                // sync that overruns its interval cannot shadow it
                _ = slow.tick() => {
                    self.process_events();
                    self.run_slow_tick().await;
                }

                _ = fast.tick() => {
                    self.process_events();
                    self.run_fast_tick().await;
                }
            }
        }

        self.stats.dashboard = self.dashboard.stats();
        info!(
            session_id = %self.session_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            fast_ticks = self.stats.fast_ticks,
            syncs_ok = self.stats.syncs_ok,
            sync_failures = self.stats.sync_failures,
            events = self.stats.events,
            dashboard_sent = self.stats.dashboard.datagrams_sent,
            dashboard_bytes = self.stats.dashboard.bytes_sent,
            dashboard_failures = self.stats.dashboard.send_failures,
            "Controller stopped"
        );

        self.stats
    }

    /// Drain every queued pilot event
    fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Apply a boost button edge
    fn handle_event(&mut self, event: PilotEvent) {
        let potentiometer = self.sensors.read_potentiometer(PotChannel::Left);

        let throttle = match event.edge {
            BoostEdge::Pressed => {
                let throttle =
                    InputNormalizer::boost_pressed(self.state.command.throttle, potentiometer);
                self.state.boost = BoostHold::Held(throttle);
                throttle
            }
            BoostEdge::Released => {
                self.state.boost = BoostHold::Released;
                InputNormalizer::boost_released(potentiometer)
            }
        };

        self.state.command.throttle = throttle;
        self.stats.events += 1;

        debug!(
            session_id = %self.session_id,
            edge = ?event.edge,
            throttle,
            queued_ms = unix_millis().saturating_sub(event.received_at),
            "Boost"
        );

        self.publish_state();
    }

    /// Sample inputs, then exchange the new command with the lander
    async fn run_fast_tick(&mut self) {
        let sample = self.sensors.sample();
        let mut command = InputNormalizer::compute(&sample);
        if let BoostHold::Held(throttle) = self.state.boost {
            command.throttle = throttle;
        }

        self.state.command = command;
        self.state.tick += 1;
        self.stats.fast_ticks += 1;

        match self.link.sync(&command).await {
            Ok(patch) => {
                let before = GameOutcome::from_state(&self.state.telemetry, &self.state.derived);

                self.state.telemetry.apply(&patch);
                self.state.derived.update(&self.state.telemetry);
                self.stats.syncs_ok += 1;

                let after = GameOutcome::from_state(&self.state.telemetry, &self.state.derived);
                if after != before {
                    info!(
                        session_id = %self.session_id,
                        tick = self.state.tick,
                        outcome = ?after,
                        altitude = self.state.telemetry.altitude,
                        fuel = self.state.telemetry.fuel,
                        "Game state changed"
                    );
                }
            }
            Err(e) => {
                // Next fast tick tries again with a fresh command
                self.stats.sync_failures += 1;
                if let Some(suppressed) = self.sync_warn_gate.admit() {
                    warn!(
                        session_id = %self.session_id,
                        tick = self.state.tick,
                        error = %e,
                        suppressed,
                        "Lander sync failed"
                    );
                }
            }
        }

        self.publish_state();
    }

    async fn run_slow_tick(&mut self) {
        self.dashboard.publish(&self.state).await;
    }

    fn publish_state(&self) {
        self.state_tx.send_replace(self.state);
    }
}
