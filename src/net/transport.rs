//! Datagram transport seam
//!
//! The controller talks to the lander and the dashboard through this trait so
//! the timeline can run against a real UDP socket or a scripted double.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

/// Unreliable datagram socket
pub trait Transport: Send + Sync {
    /// Send one datagram to `target`
    fn send_to(
        &self,
        buf: &[u8],
        target: SocketAddr,
    ) -> impl Future<Output = io::Result<usize>> + Send;

    /// Wait for one datagram from any source
    fn recv_from(
        &self,
        buf: &mut [u8],
    ) -> impl Future<Output = io::Result<(usize, SocketAddr)>> + Send;
}

impl Transport for UdpSocket {
    async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, target).await
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for failure injection

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    pub enum Reply {
        Datagram(Vec<u8>, SocketAddr),
        Error(io::ErrorKind),
        /// Never answers
        Silence,
    }

    #[derive(Default)]
    pub struct ScriptedTransport {
        pub sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
        send_failures: Mutex<VecDeque<io::ErrorKind>>,
        replies: Mutex<VecDeque<Reply>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_next_send(&self, kind: io::ErrorKind) {
            self.send_failures.lock().push_back(kind);
        }

        pub fn push_reply(&self, reply: Reply) {
            self.replies.lock().push_back(reply);
        }

        pub fn sent_to(&self, target: SocketAddr) -> Vec<String> {
            self.sent
                .lock()
                .iter()
                .filter(|(_, addr)| *addr == target)
                .map(|(bytes, _)| String::from_utf8_lossy(bytes).into_owned())
                .collect()
        }
    }

    impl Transport for ScriptedTransport {
        async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
            if let Some(kind) = self.send_failures.lock().pop_front() {
                return Err(io::Error::from(kind));
            }
            self.sent.lock().push((buf.to_vec(), target));
            Ok(buf.len())
        }

        async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
            let next = self.replies.lock().pop_front();
            match next {
                Some(Reply::Datagram(bytes, from)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok((n, from))
                }
                Some(Reply::Error(kind)) => Err(io::Error::from(kind)),
                Some(Reply::Silence) | None => std::future::pending().await,
            }
        }
    }
}
