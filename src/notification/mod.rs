//! SNMP notification sender: v1 traps, v2c traps, and informs.
//!
//! Traps are fire-and-forget; informs are confirmed and retried by the
//! [`InformDispatcher`] until acknowledged, timed out, or canceled. One
//! ephemeral UDP socket carries every notification and receives the
//! inform acknowledgements.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_snmp_agent::notification::{NotificationSender, Target, oids};
//! use async_snmp_agent::oid;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<async_snmp_agent::Error>> {
//!     let sender = NotificationSender::builder()
//!         .target(Target::v2c("192.0.2.10:162".parse().unwrap(), "public"))
//!         .build()
//!         .await?;
//!
//!     // drive retransmission and acknowledgements in the background
//!     let driver = sender.clone();
//!     tokio::spawn(async move { driver.run().await });
//!
//!     sender.send_trap(oids::cold_start(), vec![]).await?;
//!
//!     let mut inform = sender
//!         .send_inform(oid!(1, 3, 6, 1, 4, 1, 46410, 0, 1), vec![])
//!         .await?;
//!     let status = inform.wait().await;
//!     println!("inform resolved: {status}");
//!     Ok(())
//! }
//! ```

mod inform;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::agent::Statistics;
use crate::error::{Error, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
use crate::transport::{AgentTransport, UdpTransport};
use crate::varbind::VarBind;
use crate::version::Version;

pub use inform::{InformDispatcher, InformHandle, InformStatus};

/// Well-known trap OIDs (RFC 3418).
pub mod oids {
    use crate::oid;

    /// Standard trap OID prefix (snmpTraps)
    pub fn snmp_traps() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5)
    }

    /// coldStart trap OID (snmpTraps.1)
    pub fn cold_start() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1)
    }

    /// warmStart trap OID (snmpTraps.2)
    pub fn warm_start() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 2)
    }

    /// linkDown trap OID (snmpTraps.3)
    pub fn link_down() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)
    }

    /// linkUp trap OID (snmpTraps.4)
    pub fn link_up() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 4)
    }

    /// authenticationFailure trap OID (snmpTraps.5)
    pub fn auth_failure() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 5)
    }

    /// egpNeighborLoss trap OID (snmpTraps.6)
    pub fn egp_neighbor_loss() -> crate::Oid {
        oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 6)
    }
}

/// One notification destination.
#[derive(Debug, Clone)]
pub struct Target {
    /// Manager address, normally port 162.
    pub addr: SocketAddr,
    /// Message version for this target. v1 targets receive only
    /// [`send_trap_v1`](NotificationSender::send_trap_v1) traps; v2c
    /// targets receive v2c traps and informs.
    pub version: Version,
    /// Community string sent to this target.
    pub community: Bytes,
}

impl Target {
    /// A target addressed with SNMPv1 trap messages.
    pub fn v1(addr: SocketAddr, community: impl Into<Bytes>) -> Self {
        Self {
            addr,
            version: Version::V1,
            community: community.into(),
        }
    }

    /// A target addressed with SNMPv2c messages.
    pub fn v2c(addr: SocketAddr, community: impl Into<Bytes>) -> Self {
        Self {
            addr,
            version: Version::V2c,
            community: community.into(),
        }
    }
}

/// Builder for [`NotificationSender`].
pub struct NotificationBuilder {
    targets: Vec<Target>,
    agent_addr: Ipv4Addr,
    timeout: Duration,
    retries: u32,
    statistics: Option<Arc<Statistics>>,
    uptime_source: Option<Box<dyn Fn() -> u32 + Send + Sync>>,
    cancel: Option<CancellationToken>,
}

impl NotificationBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - Inform timeout: 2s, retries: 3
    /// - Agent address (v1 trap field): 0.0.0.0
    /// - Uptime: hundredths of seconds since `build()`
    /// - No targets (build fails until one is added)
    pub fn new() -> Self {
        Self {
            targets: Vec::new(),
            agent_addr: Ipv4Addr::UNSPECIFIED,
            timeout: Duration::from_secs(2),
            retries: 3,
            statistics: None,
            uptime_source: None,
            cancel: None,
        }
    }

    /// Add a notification target.
    pub fn target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    /// Set the agent IPv4 address carried in v1 trap PDUs.
    pub fn agent_addr(mut self, addr: Ipv4Addr) -> Self {
        self.agent_addr = addr;
        self
    }

    /// Set the inform acknowledgement timeout. Also the interval
    /// between retransmissions.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set how many times an unacknowledged inform is resent before it
    /// times out. 0 means a single transmission.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Share a statistics block (normally the agent's), so `out_traps`
    /// counts notifications from this sender too.
    pub fn statistics(mut self, statistics: Arc<Statistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Override the sysUpTime source (hundredths of seconds).
    ///
    /// An agent embedded in a larger system passes its own uptime so
    /// traps and GET responses agree.
    pub fn uptime_source(mut self, source: impl Fn() -> u32 + Send + Sync + 'static) -> Self {
        self.uptime_source = Some(Box::new(source));
        self
    }

    /// Set a cancellation token stopping [`NotificationSender::run`].
    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Bind an ephemeral UDP socket and build the sender.
    pub async fn build(self) -> Result<NotificationSender<UdpTransport>> {
        let Some(first) = self.targets.first() else {
            return Err(Error::config("notification sender needs at least one target"));
        };
        let transport = UdpTransport::ephemeral(first.addr).await?;
        self.build_with_transport(transport)
    }

    /// Build the sender on an already-constructed transport.
    pub fn build_with_transport<T: AgentTransport>(
        self,
        transport: T,
    ) -> Result<NotificationSender<T>> {
        if self.targets.is_empty() {
            return Err(Error::config("notification sender needs at least one target"));
        }
        if let Some(bad) = self.targets.iter().find(|t| t.version == Version::V3) {
            return Err(Error::config(format!(
                "v3 target {} is not supported",
                bad.addr
            )));
        }

        // Drives retransmission often enough that a deadline slips by
        // at most half the timeout.
        let tick_period = (self.timeout / 2).max(Duration::from_millis(10));

        let start = Instant::now();
        let uptime_source = self
            .uptime_source
            .unwrap_or_else(|| Box::new(move || (start.elapsed().as_millis() / 10) as u32));

        Ok(NotificationSender {
            inner: Arc::new(SenderInner {
                transport,
                targets: self.targets,
                agent_addr: self.agent_addr,
                timeout: self.timeout,
                retries: self.retries,
                tick_period,
                uptime_source,
                dispatcher: Arc::new(InformDispatcher::new()),
                next_request_id: AtomicI32::new(1),
                stats: self.statistics.unwrap_or_default(),
                cancel: self.cancel.unwrap_or_default(),
            }),
        })
    }
}

impl Default for NotificationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct SenderInner<T> {
    transport: T,
    targets: Vec<Target>,
    agent_addr: Ipv4Addr,
    timeout: Duration,
    retries: u32,
    tick_period: Duration,
    uptime_source: Box<dyn Fn() -> u32 + Send + Sync>,
    dispatcher: Arc<InformDispatcher>,
    next_request_id: AtomicI32,
    stats: Arc<Statistics>,
    cancel: CancellationToken,
}

/// Sends traps and informs to a configured set of managers.
pub struct NotificationSender<T: AgentTransport = UdpTransport> {
    inner: Arc<SenderInner<T>>,
}

impl NotificationSender<UdpTransport> {
    /// Create a builder for configuring the sender.
    pub fn builder() -> NotificationBuilder {
        NotificationBuilder::new()
    }
}

impl<T: AgentTransport + 'static> NotificationSender<T> {
    /// Current sysUpTime in hundredths of seconds.
    pub fn uptime(&self) -> u32 {
        (self.inner.uptime_source)()
    }

    /// The cancellation token stopping [`run`](Self::run).
    pub fn cancel(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// The inform state machine, for stepping it manually in tests.
    pub fn dispatcher(&self) -> Arc<InformDispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    /// Drive inform retransmission and acknowledgement processing.
    ///
    /// Runs until the cancellation token fires. Spawn it alongside the
    /// agent; without it informs are sent once and never resolve.
    #[instrument(skip(self), err)]
    pub async fn run(&self) -> Result<()> {
        let mut interval = tokio::time::interval(self.inner.tick_period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut buf = vec![0u8; 65535];

        loop {
            tokio::select! {
                _ = self.inner.cancel.cancelled() => {
                    tracing::info!(target: "async_snmp_agent::notify", "notification sender shutdown requested");
                    return Ok(());
                }
                _ = interval.tick() => {
                    self.tick(Instant::now()).await;
                }
                result = self.inner.transport.recv_from(&mut buf) => {
                    let (len, source) = result?;
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    match CommunityMessage::decode(data, source) {
                        Ok(msg) if msg.pdu.pdu_type == PduType::Response => {
                            if !self.inner.dispatcher.process_response(&msg.pdu) {
                                tracing::debug!(target: "async_snmp_agent::notify", { snmp.source = %source, snmp.request_id = msg.pdu.request_id }, "response matches no pending inform");
                            }
                        }
                        Ok(msg) => {
                            tracing::debug!(target: "async_snmp_agent::notify", { snmp.source = %source, snmp.pdu_type = %msg.pdu.pdu_type }, "ignoring unexpected PDU");
                        }
                        Err(e) => {
                            tracing::debug!(target: "async_snmp_agent::notify", { snmp.source = %source, error = %e }, "undecodable datagram on notification socket");
                        }
                    }
                }
            }
        }
    }

    /// Resend overdue informs as of `now`. Returns the number of
    /// datagrams sent.
    pub async fn tick(&self, now: Instant) -> usize {
        let sent = self
            .inner
            .dispatcher
            .tick(now, &self.inner.transport)
            .await;
        for _ in 0..sent {
            Statistics::incr(&self.inner.stats.out_traps);
        }
        sent
    }

    /// Send an SNMPv1 Trap to every v1 target. Fire-and-forget.
    pub async fn send_trap_v1(
        &self,
        enterprise: Oid,
        generic: GenericTrap,
        specific_trap: i32,
        varbinds: Vec<VarBind>,
    ) -> Result<()> {
        let trap = TrapV1Pdu::new(
            enterprise,
            self.inner.agent_addr.octets(),
            generic,
            specific_trap,
            self.uptime(),
            varbinds,
        );

        let mut sent = 0;
        for target in self.targets_with_version(Version::V1) {
            let bytes = CommunityMessage::encode_trap_v1(target.community.clone(), &trap);
            self.inner.transport.send_to(&bytes, target.addr).await?;
            Statistics::incr(&self.inner.stats.out_traps);
            sent += 1;
        }

        if sent == 0 {
            tracing::debug!(target: "async_snmp_agent::notify", "no v1 targets configured, trap not sent");
        }
        Ok(())
    }

    /// Send an SNMPv2c Trap to every v2c target. Fire-and-forget.
    ///
    /// sysUpTime.0 and snmpTrapOID.0 are prepended per RFC 3416.
    pub async fn send_trap(&self, trap_oid: Oid, varbinds: Vec<VarBind>) -> Result<()> {
        let pdu = Pdu::notification(
            PduType::TrapV2,
            self.alloc_request_id(),
            self.uptime(),
            trap_oid,
            varbinds,
        );

        let mut sent = 0;
        for target in self.targets_with_version(Version::V2c) {
            let bytes = CommunityMessage::v2c(target.community.clone(), pdu.clone()).encode();
            self.inner.transport.send_to(&bytes, target.addr).await?;
            Statistics::incr(&self.inner.stats.out_traps);
            sent += 1;
        }

        if sent == 0 {
            tracing::debug!(target: "async_snmp_agent::notify", "no v2c targets configured, trap not sent");
        }
        Ok(())
    }

    /// Send an InformRequest to every v2c target and track it until
    /// acknowledged.
    ///
    /// The returned handle resolves once any target acknowledges, the
    /// retries are exhausted, or [`InformHandle::cancel`] is called.
    pub async fn send_inform(
        &self,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
    ) -> Result<InformHandle> {
        let request_id = self.alloc_request_id();
        let pdu = Pdu::notification(
            PduType::InformRequest,
            request_id,
            self.uptime(),
            trap_oid,
            varbinds,
        );

        let frames: Vec<(Bytes, SocketAddr)> = self
            .targets_with_version(Version::V2c)
            .map(|target| {
                let bytes = CommunityMessage::v2c(target.community.clone(), pdu.clone()).encode();
                (bytes, target.addr)
            })
            .collect();

        if frames.is_empty() {
            return Err(Error::config("no v2c targets configured for inform"));
        }

        // Register before the first send so an immediate ack cannot race
        // past the pending entry.
        let handle = self.inner.dispatcher.register(
            request_id,
            frames.clone(),
            self.inner.timeout,
            self.inner.retries,
        );

        for (frame, target) in &frames {
            self.inner.transport.send_to(frame, *target).await?;
            Statistics::incr(&self.inner.stats.out_traps);
        }

        tracing::debug!(target: "async_snmp_agent::notify", { snmp.request_id = request_id, snmp.targets = frames.len() }, "inform sent");
        Ok(handle)
    }

    fn targets_with_version(&self, version: Version) -> impl Iterator<Item = &Target> {
        self.inner
            .targets
            .iter()
            .filter(move |t| t.version == version)
    }

    fn alloc_request_id(&self) -> i32 {
        // Stay positive through wraparound
        self.inner.next_request_id.fetch_add(1, Ordering::Relaxed) & 0x7FFF_FFFF
    }
}

impl<T: AgentTransport> Clone for NotificationSender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
