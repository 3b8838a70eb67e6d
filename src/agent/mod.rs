//! SNMP agent: run loop, dispatch, and statistics.
//!
//! The agent listens on a UDP socket (or any [`AgentTransport`]), decodes
//! community messages, authenticates them against the [`AccessTable`],
//! and serves GET, GETNEXT, GETBULK, and SET from the registered
//! [`MibTree`]. Requests are processed concurrently up to a configurable
//! limit; shutdown is driven by a [`CancellationToken`].
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_agent::agent::Agent;
//! use async_snmp_agent::mib::Scalar;
//! use async_snmp_agent::access::Community;
//! use async_snmp_agent::{Value, oid};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<async_snmp_agent::Error>> {
//!     let agent = Agent::builder()
//!         .bind("0.0.0.0:161")
//!         .community(Community::read_only("public"))
//!         .register(
//!             oid!(1, 3, 6, 1, 4, 1, 46410, 1),
//!             Arc::new(Scalar::new(Value::OctetString("demo agent".into()))),
//!         )
//!         .build()
//!         .await?;
//!
//!     agent.run().await
//! }
//! ```

mod request;

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::access::{AccessTable, Community};
use crate::error::{Error, Result};
use crate::mib::{MibHandler, MibTree};
use crate::oid::Oid;
use crate::transport::{AgentTransport, UdpTransport};

/// Default maximum message size for UDP (RFC 3417 recommendation).
const DEFAULT_MAX_MESSAGE_SIZE: usize = 1472;

/// Overhead for SNMP message encoding (approximate conservative estimate).
/// This accounts for version, community, PDU headers, etc.
pub(crate) const RESPONSE_OVERHEAD: usize = 100;

/// What to do when a request carries an unknown community string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthFailurePolicy {
    /// Drop the request without answering. The default; an attacker
    /// probing community strings learns nothing.
    #[default]
    SilentDrop,
    /// Answer with a Response carrying authorizationError
    /// (noSuchName for v1 managers).
    ErrorResponse,
}

/// Protocol statistics, RFC 3418 snmp-group flavored.
///
/// Counters are relaxed atomics; reads are snapshots, not a consistent
/// cut. The same block can be shared with a
/// [`NotificationSender`](crate::notification::NotificationSender) so
/// `out_traps` covers both directions of the agent.
#[derive(Debug, Default)]
pub struct Statistics {
    pub(crate) in_pkts: AtomicU64,
    pub(crate) out_pkts: AtomicU64,
    pub(crate) in_bad_versions: AtomicU64,
    pub(crate) in_bad_community_names: AtomicU64,
    pub(crate) in_asn_parse_errs: AtomicU64,
    pub(crate) in_get_requests: AtomicU64,
    pub(crate) in_get_nexts: AtomicU64,
    pub(crate) in_set_requests: AtomicU64,
    pub(crate) out_get_responses: AtomicU64,
    pub(crate) out_traps: AtomicU64,
}

macro_rules! counter_getter {
    ($(#[$doc:meta] $name:ident),* $(,)?) => {
        $(
            #[$doc]
            pub fn $name(&self) -> u64 {
                self.$name.load(Ordering::Relaxed)
            }
        )*
    };
}

impl Statistics {
    /// Create a zeroed statistics block.
    pub fn new() -> Self {
        Self::default()
    }

    counter_getter! {
        /// Datagrams received (snmpInPkts).
        in_pkts,
        /// Datagrams sent (snmpOutPkts).
        out_pkts,
        /// Messages with an unserved SNMP version (snmpInBadVersions).
        in_bad_versions,
        /// Messages with an unknown community (snmpInBadCommunityNames).
        in_bad_community_names,
        /// Messages that failed BER parsing (snmpInASNParseErrs).
        in_asn_parse_errs,
        /// GetRequest PDUs processed (snmpInGetRequests).
        in_get_requests,
        /// GetNextRequest and GetBulkRequest PDUs processed (snmpInGetNexts).
        in_get_nexts,
        /// SetRequest PDUs processed (snmpInSetRequests).
        in_set_requests,
        /// Response PDUs emitted (snmpOutGetResponses).
        out_get_responses,
        /// Trap and Inform PDUs emitted (snmpOutTraps).
        out_traps,
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Builder for [`Agent`].
///
/// # Example
///
/// ```rust,no_run
/// use async_snmp_agent::agent::Agent;
/// use async_snmp_agent::access::Community;
///
/// # async fn example() -> Result<(), Box<async_snmp_agent::Error>> {
/// let agent = Agent::builder()
///     .bind("127.0.0.1:1161") // non-privileged port
///     .community(Community::read_only("public"))
///     .community(Community::read_write("private"))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct AgentBuilder {
    bind_addr: String,
    access: AccessTable,
    registrations: Vec<(Oid, Arc<dyn MibHandler>)>,
    max_message_size: usize,
    max_concurrent_requests: Option<usize>,
    recv_buffer_size: Option<usize>,
    auth_failure_policy: AuthFailurePolicy,
    statistics: Option<Arc<Statistics>>,
    cancel: Option<CancellationToken>,
}

impl AgentBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Bind address: `0.0.0.0:161` (UDP)
    /// - Max message size: 1472 bytes (Ethernet MTU - IP/UDP headers)
    /// - Max concurrent requests: 1000
    /// - Receive buffer size: 4MB (requested from the kernel)
    /// - Auth failure policy: silent drop
    /// - No communities (all requests rejected), no handlers
    pub fn new() -> Self {
        Self {
            bind_addr: "0.0.0.0:161".to_string(),
            access: AccessTable::new(),
            registrations: Vec::new(),
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_concurrent_requests: Some(1000),
            recv_buffer_size: Some(4 * 1024 * 1024), // 4MB
            auth_failure_policy: AuthFailurePolicy::default(),
            statistics: None,
            cancel: None,
        }
    }

    /// Set the UDP bind address.
    ///
    /// Default is `0.0.0.0:161` (standard SNMP agent port). Binding UDP
    /// port 161 typically requires elevated privileges.
    pub fn bind(mut self, addr: impl Into<String>) -> Self {
        self.bind_addr = addr.into();
        self
    }

    /// Add an accepted community with its permission rules.
    ///
    /// Multiple communities can be added. If none are added, all
    /// requests are rejected.
    pub fn community(mut self, community: Community) -> Self {
        self.access.add(community);
        self
    }

    /// Add multiple communities.
    pub fn communities<I>(mut self, communities: I) -> Self
    where
        I: IntoIterator<Item = Community>,
    {
        for c in communities {
            self.access.add(c);
        }
        self
    }

    /// Register a MIB handler for an OID subtree.
    ///
    /// Requests are resolved to the handler with the deepest matching
    /// prefix. Registering the same prefix twice fails at
    /// [`build()`](Self::build).
    pub fn register(mut self, prefix: Oid, handler: Arc<dyn MibHandler>) -> Self {
        self.registrations.push((prefix, handler));
        self
    }

    /// Set the maximum message size for responses.
    ///
    /// Default is 1472 octets (fits Ethernet MTU minus IP/UDP headers).
    /// GETBULK responses are truncated to fit; other responses that
    /// exceed the limit become a tooBig Response.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the maximum number of concurrently processed requests.
    ///
    /// Default is 1000. Requests beyond this limit queue until a slot
    /// becomes available. `None` means unbounded.
    pub fn max_concurrent_requests(mut self, limit: Option<usize>) -> Self {
        self.max_concurrent_requests = limit;
        self
    }

    /// Set the UDP socket receive buffer size.
    ///
    /// Default is 4MB. The kernel may cap this at `net.core.rmem_max`.
    /// A larger buffer prevents packet loss during request bursts.
    /// `None` uses the kernel default.
    pub fn recv_buffer_size(mut self, size: Option<usize>) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Set the behavior for requests with an unknown community.
    pub fn auth_failure_policy(mut self, policy: AuthFailurePolicy) -> Self {
        self.auth_failure_policy = policy;
        self
    }

    /// Share an existing statistics block.
    ///
    /// Lets a [`NotificationSender`](crate::notification::NotificationSender)
    /// and an agent account into the same counters. If not set, the
    /// agent creates its own, accessible via [`Agent::statistics`].
    pub fn statistics(mut self, statistics: Arc<Statistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Set a cancellation token for graceful shutdown.
    ///
    /// If not set, the agent creates its own token accessible via
    /// [`Agent::cancel`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind the UDP socket and build the agent.
    pub async fn build(self) -> Result<Agent<UdpTransport>> {
        let bind_addr: SocketAddr = self
            .bind_addr
            .parse()
            .map_err(|_| Error::config(format!("invalid bind address: {}", self.bind_addr)))?;

        let transport = UdpTransport::bind_with(bind_addr, self.recv_buffer_size).await?;
        self.build_with_transport(transport)
    }

    /// Build the agent on an already-constructed transport.
    ///
    /// Used with the mock transport in tests; `bind` and
    /// `recv_buffer_size` settings are ignored.
    pub fn build_with_transport<T: AgentTransport>(self, transport: T) -> Result<Agent<T>> {
        let mut mib = MibTree::new();
        for (prefix, handler) in self.registrations {
            mib.register(prefix, handler)?;
        }

        if self.access.is_empty() {
            tracing::warn!(
                target: "async_snmp_agent::agent",
                "no communities configured, all requests will be dropped"
            );
        }

        let concurrency_limit = self
            .max_concurrent_requests
            .map(|n| Arc::new(Semaphore::new(n)));

        Ok(Agent {
            inner: Arc::new(AgentInner {
                transport,
                access: self.access,
                mib,
                max_message_size: self.max_message_size,
                concurrency_limit,
                auth_failure_policy: self.auth_failure_policy,
                stats: self.statistics.unwrap_or_default(),
                cancel: self.cancel.unwrap_or_default(),
            }),
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Inner state shared across agent clones.
pub(crate) struct AgentInner<T> {
    pub(crate) transport: T,
    pub(crate) access: AccessTable,
    pub(crate) mib: MibTree,
    pub(crate) max_message_size: usize,
    pub(crate) concurrency_limit: Option<Arc<Semaphore>>,
    pub(crate) auth_failure_policy: AuthFailurePolicy,
    pub(crate) stats: Arc<Statistics>,
    pub(crate) cancel: CancellationToken,
}

/// SNMP agent serving GET, GETNEXT, GETBULK, and SET.
pub struct Agent<T: AgentTransport = UdpTransport> {
    pub(crate) inner: Arc<AgentInner<T>>,
}

impl Agent<UdpTransport> {
    /// Create a builder for configuring the agent.
    pub fn builder() -> AgentBuilder {
        AgentBuilder::new()
    }
}

impl<T: AgentTransport + 'static> Agent<T> {
    /// Get the local address the agent is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.transport.local_addr()
    }

    /// Get the cancellation token for this agent.
    ///
    /// Call `token.cancel()` to initiate graceful shutdown.
    pub fn cancel(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Get the agent's statistics block.
    pub fn statistics(&self) -> Arc<Statistics> {
        Arc::clone(&self.inner.stats)
    }

    /// Run the agent, processing requests concurrently.
    ///
    /// Requests are processed in parallel up to the configured
    /// `max_concurrent_requests` limit. This method runs until the
    /// cancellation token is triggered.
    #[instrument(skip(self), err, fields(snmp.local_addr = %self.local_addr()))]
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; 65535];

        loop {
            let (len, source) = tokio::select! {
                result = self.inner.transport.recv_from(&mut buf) => {
                    result?
                }
                _ = self.inner.cancel.cancelled() => {
                    tracing::info!(target: "async_snmp_agent::agent", "agent shutdown requested");
                    return Ok(());
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            let agent = self.clone();

            let permit = if let Some(ref sem) = self.inner.concurrency_limit {
                Some(sem.clone().acquire_owned().await.expect("semaphore closed"))
            } else {
                None
            };

            tokio::spawn(async move {
                match agent.handle_datagram(data, source).await {
                    Ok(Some(response_bytes)) => {
                        if let Err(e) = agent
                            .inner
                            .transport
                            .send_to(&response_bytes, source)
                            .await
                        {
                            tracing::warn!(target: "async_snmp_agent::agent", { snmp.source = %source, error = %e }, "failed to send response");
                        } else {
                            Statistics::incr(&agent.inner.stats.out_pkts);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::debug!(target: "async_snmp_agent::agent", { snmp.source = %source, error = %e }, "request dropped");
                    }
                }

                drop(permit);
            });
        }
    }
}

impl<T: AgentTransport> Clone for Agent<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mib::Scalar;
    use crate::oid;
    use crate::transport::MockTransport;
    use crate::value::Value;

    #[test]
    fn builder_defaults() {
        let builder = AgentBuilder::new();
        assert_eq!(builder.bind_addr, "0.0.0.0:161");
        assert_eq!(builder.max_message_size, DEFAULT_MAX_MESSAGE_SIZE);
        assert_eq!(builder.max_concurrent_requests, Some(1000));
        assert_eq!(builder.auth_failure_policy, AuthFailurePolicy::SilentDrop);
        assert!(builder.access.is_empty());
        assert!(builder.registrations.is_empty());
    }

    #[test]
    fn builder_rejects_bad_bind_addr() {
        let (transport, _handle) = MockTransport::pair("127.0.0.1:161".parse().unwrap());
        // build_with_transport skips the address, so only build() can fail on it
        let agent = AgentBuilder::new()
            .bind("not an address")
            .community(Community::read_only("public"))
            .build_with_transport(transport);
        assert!(agent.is_ok());
    }

    #[test]
    fn builder_rejects_duplicate_registration() {
        let (transport, _handle) = MockTransport::pair("127.0.0.1:161".parse().unwrap());
        let result = AgentBuilder::new()
            .community(Community::read_only("public"))
            .register(
                oid!(1, 3, 6, 1, 4, 1, 46410),
                Arc::new(Scalar::new(Value::Integer(1))),
            )
            .register(
                oid!(1, 3, 6, 1, 4, 1, 46410),
                Arc::new(Scalar::new(Value::Integer(2))),
            )
            .build_with_transport(transport);
        assert!(matches!(
            result.map(|_| ()).unwrap_err().as_ref(),
            Error::DuplicateRegistration { .. }
        ));
    }

    #[test]
    fn statistics_start_zeroed() {
        let stats = Statistics::new();
        assert_eq!(stats.in_pkts(), 0);
        assert_eq!(stats.out_traps(), 0);

        Statistics::incr(&stats.in_pkts);
        assert_eq!(stats.in_pkts(), 1);
    }
}
