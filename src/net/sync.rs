//! Request/reply exchange with the lander

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, trace};

use crate::game::session::{ControlCommand, TelemetryPatch};

use super::protocol::{decode_telemetry, encode_command, MAX_DATAGRAM};
use super::transport::Transport;

/// Failure of a single sync cycle
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to send command: {0}")]
    Send(#[source] io::Error),

    #[error("failed to receive telemetry: {0}")]
    Receive(#[source] io::Error),

    #[error("no telemetry within {0:?}")]
    Timeout(Duration),
}

/// Client side of the lander link.
///
/// One call to [`LanderLink::sync`] is one at-most-once exchange; nothing is
/// retried here.
pub struct LanderLink<T> {
    transport: Arc<T>,
    lander: SocketAddr,
    recv_timeout: Duration,
    buf: [u8; MAX_DATAGRAM],
}

impl<T: Transport> LanderLink<T> {
    pub fn new(transport: Arc<T>, lander: SocketAddr, recv_timeout: Duration) -> Self {
        Self {
            transport,
            lander,
            recv_timeout,
            buf: [0; MAX_DATAGRAM],
        }
    }

    pub fn lander(&self) -> SocketAddr {
        self.lander
    }

    /// Send `cmd` and wait for one telemetry reply from any source
    pub async fn sync(&mut self, cmd: &ControlCommand) -> Result<TelemetryPatch, SyncError> {
        let datagram = encode_command(cmd);
        trace!(throttle = cmd.throttle, roll = cmd.roll, "Sending command");

        self.transport
            .send_to(datagram.as_bytes(), self.lander)
            .await
            .map_err(SyncError::Send)?;

        let (n, source) = timeout(self.recv_timeout, self.transport.recv_from(&mut self.buf))
            .await
            .map_err(|_| SyncError::Timeout(self.recv_timeout))?
            .map_err(SyncError::Receive)?;

        if source != self.lander {
            debug!(%source, lander = %self.lander, "Telemetry from unexpected source");
        }

        let patch = decode_telemetry(&self.buf[..n]);
        if patch.is_empty() {
            debug!(bytes = n, "Reply carried no telemetry fields");
        } else {
            trace!(bytes = n, fields = patch.field_count(), "Telemetry received");
        }
        Ok(patch)
    }
}
