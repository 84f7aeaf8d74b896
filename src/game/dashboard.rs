//! Best-effort state broadcast to the dashboard

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::net::protocol::encode_dashboard;
use crate::net::transport::Transport;
use crate::util::rate_limit::{LogGate, TRANSPORT_WARN_RATE};

use super::session::SessionState;

/// Dashboard send statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
    pub datagrams_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
}

impl DashboardStats {
    pub fn record(&mut self, bytes: usize) {
        self.datagrams_sent += 1;
        self.bytes_sent += bytes as u64;
    }
}

/// Sends merged session state to the observer; no reply is read
pub struct DashboardPublisher<T> {
    transport: Arc<T>,
    endpoint: SocketAddr,
    stats: DashboardStats,
    warn_gate: LogGate,
}

impl<T: Transport> DashboardPublisher<T> {
    pub fn new(transport: Arc<T>, endpoint: SocketAddr) -> Self {
        Self {
            transport,
            endpoint,
            stats: DashboardStats::default(),
            warn_gate: LogGate::new(TRANSPORT_WARN_RATE),
        }
    }

    pub fn stats(&self) -> DashboardStats {
        self.stats
    }

    /// Send one broadcast; failures are logged and counted, never returned
    pub async fn publish(&mut self, state: &SessionState) {
        let payload = encode_dashboard(state);

        match self.transport.send_to(payload.as_bytes(), self.endpoint).await {
            Ok(n) => {
                self.stats.record(n);
                trace!(bytes = n, "Dashboard update sent");
            }
            Err(e) => {
                self.stats.send_failures += 1;
                if let Some(suppressed) = self.warn_gate.admit() {
                    warn!(
                        endpoint = %self.endpoint,
                        error = %e,
                        suppressed,
                        "Dashboard send failed"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::session::{ControlCommand, Telemetry};
    use crate::net::transport::testing::ScriptedTransport;
    use std::io;

    fn dashboard_addr() -> SocketAddr {
        "10.0.0.5:65250".parse().unwrap()
    }

    #[tokio::test]
    async fn publishes_one_datagram_per_call() {
        let transport = Arc::new(ScriptedTransport::new());
        let mut publisher = DashboardPublisher::new(transport.clone(), dashboard_addr());

        let state = SessionState {
            command: ControlCommand {
                throttle: 10,
                roll: 0.0,
            },
            telemetry: Telemetry {
                fuel: 42,
                ..Default::default()
            },
            ..Default::default()
        };
        publisher.publish(&state).await;

        let sent = transport.sent_to(dashboard_addr());
        assert_eq!(sent.len(), 1);
        assert!(sent[0].starts_with("throttle:10\n"));
        assert!(sent[0].contains("\nfuel:42\n"));
        assert!(!sent[0].ends_with('\n'));
        assert_eq!(publisher.stats().datagrams_sent, 1);
        assert_eq!(publisher.stats().bytes_sent, sent[0].len() as u64);
    }

    #[tokio::test]
    async fn send_failure_is_counted_not_raised() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail_next_send(io::ErrorKind::PermissionDenied);
        let mut publisher = DashboardPublisher::new(transport.clone(), dashboard_addr());

        publisher.publish(&SessionState::default()).await;
        publisher.publish(&SessionState::default()).await;

        assert_eq!(publisher.stats().send_failures, 1);
        assert_eq!(publisher.stats().datagrams_sent, 1);
    }
}
