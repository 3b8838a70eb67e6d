//! Mock transport for testing.
//!
//! Provides an in-memory transport so agent behavior can be exercised
//! without a real socket: tests inject datagrams as if a manager had sent
//! them and inspect whatever the agent sends back.

use super::AgentTransport;
use crate::error::{Error, Result};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// In-memory transport driven by a [`MockHandle`].
///
/// Created with [`MockTransport::pair`]. The transport side goes to the
/// agent; the handle stays with the test.
pub struct MockTransport {
    local_addr: SocketAddr,
    inbound: Mutex<mpsc::UnboundedReceiver<(Bytes, SocketAddr)>>,
    outbound: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
}

/// Test-side handle for a [`MockTransport`].
#[derive(Clone)]
pub struct MockHandle {
    inject: mpsc::UnboundedSender<(Bytes, SocketAddr)>,
    sent: Arc<Mutex<mpsc::UnboundedReceiver<(Bytes, SocketAddr)>>>,
}

impl MockTransport {
    /// Create a transport/handle pair pretending to listen on `local_addr`.
    pub fn pair(local_addr: SocketAddr) -> (Self, MockHandle) {
        let (inject_tx, inject_rx) = mpsc::unbounded_channel();
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();

        let transport = Self {
            local_addr,
            inbound: Mutex::new(inject_rx),
            outbound: sent_tx,
        };
        let handle = MockHandle {
            inject: inject_tx,
            sent: Arc::new(Mutex::new(sent_rx)),
        };
        (transport, handle)
    }

    fn closed(&self, addr: SocketAddr) -> Box<Error> {
        Error::Network {
            addr,
            source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "mock handle dropped"),
        }
        .boxed()
    }
}

impl AgentTransport for MockTransport {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let mut inbound = self.inbound.lock().await;
        match inbound.recv().await {
            Some((data, source)) => {
                // Oversized injections are truncated, matching recvfrom(2).
                let len = data.len().min(buf.len());
                buf[..len].copy_from_slice(&data[..len]);
                Ok((len, source))
            }
            None => Err(self.closed(self.local_addr)),
        }
    }

    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        self.outbound
            .send((Bytes::copy_from_slice(data), target))
            .map_err(|_| self.closed(target))
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl MockHandle {
    /// Deliver a datagram to the transport as if `source` had sent it.
    pub fn inject(&self, data: impl Into<Bytes>, source: SocketAddr) {
        // A dropped transport is fine; the test will notice on next_sent.
        let _ = self.inject.send((data.into(), source));
    }

    /// Wait for the next datagram the agent sent.
    pub async fn next_sent(&self) -> (Bytes, SocketAddr) {
        let mut sent = self.sent.lock().await;
        sent.recv().await.expect("mock transport dropped")
    }

    /// Return the next sent datagram if one is already queued.
    pub fn try_next_sent(&self) -> Option<(Bytes, SocketAddr)> {
        self.sent.try_lock().ok()?.try_recv().ok()
    }
}
