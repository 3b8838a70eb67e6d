//! UDP transport implementation.

use super::AgentTransport;
use crate::error::{Error, Result};
use crate::util::{bind_ephemeral_udp_socket, bind_udp_socket};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// UDP transport for an agent listener.
///
/// Wraps a bound, unconnected UDP socket. The agent's receive loop calls
/// [`AgentTransport::recv_from`] and replies to whatever source address
/// each datagram carried, so one transport serves every manager.
pub struct UdpTransport {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpTransport {
    /// Bind a listening socket on the given address.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        Self::bind_with(addr, None).await
    }

    /// Bind with an optional kernel receive buffer size.
    pub(crate) async fn bind_with(
        addr: SocketAddr,
        recv_buffer_size: Option<usize>,
    ) -> Result<Self> {
        let socket = bind_udp_socket(addr)
            .await
            .map_err(|e| Error::Network { addr, source: e }.boxed())?;

        if let Some(size) = recv_buffer_size {
            socket2::SockRef::from(&socket)
                .set_recv_buffer_size(size)
                .map_err(|e| Error::Network { addr, source: e }.boxed())?;
        }

        let local_addr = socket
            .local_addr()
            .map_err(|e| Error::Network { addr, source: e }.boxed())?;

        tracing::debug!(
            target: "async_snmp_agent::transport",
            { snmp.local_addr = %local_addr },
            "UDP transport bound"
        );

        Ok(Self { socket, local_addr })
    }

    /// Bind an ephemeral socket in the target's address family.
    ///
    /// Used by the notification sender, which sends to one manager and
    /// (for informs) waits for the acknowledgement on the same socket.
    pub(crate) async fn ephemeral(target: SocketAddr) -> Result<Self> {
        let socket = bind_ephemeral_udp_socket(target).await.map_err(|e| {
            Error::Network {
                addr: target,
                source: e,
            }
            .boxed()
        })?;

        let local_addr = socket.local_addr().map_err(|e| {
            Error::Network {
                addr: target,
                source: e,
            }
            .boxed()
        })?;

        Ok(Self { socket, local_addr })
    }
}

impl AgentTransport for UdpTransport {
    async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        let (len, source) = self.socket.recv_from(buf).await.map_err(|e| {
            Error::Network {
                addr: self.local_addr,
                source: e,
            }
            .boxed()
        })?;

        tracing::trace!(
            target: "async_snmp_agent::transport",
            { snmp.peer = %source, snmp.bytes = len },
            "UDP recv"
        );

        Ok((len, source))
    }

    async fn send_to(&self, data: &[u8], target: SocketAddr) -> Result<()> {
        tracing::trace!(
            target: "async_snmp_agent::transport",
            { snmp.peer = %target, snmp.bytes = data.len() },
            "UDP send"
        );

        self.socket.send_to(data, target).await.map_err(|e| {
            Error::Network {
                addr: target,
                source: e,
            }
            .boxed()
        })?;

        Ok(())
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
