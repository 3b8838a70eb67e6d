//! Transport layer abstraction.
//!
//! Provides the [`AgentTransport`] trait and the standard UDP implementation.
//! The agent listens on one transport; the notification sender binds an
//! ephemeral one per destination.

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::error::Result;
use std::future::Future;
use std::net::SocketAddr;

/// Agent-side transport abstraction (listener mode).
///
/// Implementations are driven from a single receive loop, so `recv_from`
/// takes `&self` and must be cancel-safe: dropping the returned future
/// before completion must not lose a datagram that was not yet read.
pub trait AgentTransport: Send + Sync {
    /// Receive data from any source.
    fn recv_from(&self, buf: &mut [u8])
    -> impl Future<Output = Result<(usize, SocketAddr)>> + Send;

    /// Send data to a specific target.
    fn send_to(&self, data: &[u8], target: SocketAddr) -> impl Future<Output = Result<()>> + Send;

    /// Local bind address.
    fn local_addr(&self) -> SocketAddr;
}
