//! Pending-inform tracking and retransmission.
//!
//! An inform is a confirmed notification: the manager acknowledges it
//! with a Response carrying the same request-id. Until that arrives the
//! dispatcher keeps the originally encoded datagram and resends it on a
//! deadline, so every retransmission is byte-identical to the first
//! send.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::pdu::{Pdu, PduType};
use crate::transport::AgentTransport;

/// Lifecycle of one inform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InformStatus {
    /// Sent, no acknowledgement yet.
    WaitingForAck,
    /// Acknowledged with error-status 0.
    AckReceived,
    /// Acknowledged, but the Response carried an error-status.
    NackReceived,
    /// All retries exhausted without an acknowledgement.
    TimedOut,
    /// Withdrawn via [`InformHandle::cancel`].
    Canceled,
}

impl InformStatus {
    /// Whether this state is final.
    pub fn is_terminal(self) -> bool {
        self != Self::WaitingForAck
    }
}

impl std::fmt::Display for InformStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WaitingForAck => write!(f, "waitingForAck"),
            Self::AckReceived => write!(f, "ackReceived"),
            Self::NackReceived => write!(f, "nackReceived"),
            Self::TimedOut => write!(f, "timedOut"),
            Self::Canceled => write!(f, "canceled"),
        }
    }
}

struct PendingInform {
    /// Encoded datagram per target; resent verbatim.
    frames: Vec<(Bytes, SocketAddr)>,
    deadline: Instant,
    interval: Duration,
    retries_left: u32,
    status_tx: watch::Sender<InformStatus>,
}

/// Tracks unacknowledged informs keyed by request-id.
///
/// Normally driven by [`NotificationSender::run`]
/// (crate::notification::NotificationSender::run); `tick` and
/// `process_response` are public so tests can step the state machine
/// deterministically.
#[derive(Default)]
pub struct InformDispatcher {
    pending: Mutex<HashMap<i32, PendingInform>>,
}

impl InformDispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Number of informs still waiting for an acknowledgement.
    pub fn pending(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub(crate) fn register(
        self: &Arc<Self>,
        request_id: i32,
        frames: Vec<(Bytes, SocketAddr)>,
        timeout: Duration,
        retries: u32,
    ) -> InformHandle {
        let (status_tx, status_rx) = watch::channel(InformStatus::WaitingForAck);
        self.pending.lock().unwrap().insert(
            request_id,
            PendingInform {
                frames,
                deadline: Instant::now() + timeout,
                interval: timeout,
                retries_left: retries,
                status_tx,
            },
        );
        InformHandle {
            request_id,
            status_rx,
            dispatcher: Arc::clone(self),
        }
    }

    /// Resend every pending inform whose deadline has passed, or time
    /// it out when its retries are exhausted.
    ///
    /// Returns the number of datagrams resent.
    pub async fn tick<T: AgentTransport>(&self, now: Instant, transport: &T) -> usize {
        let mut resend: Vec<(Bytes, SocketAddr)> = Vec::new();

        {
            let mut pending = self.pending.lock().unwrap();
            pending.retain(|request_id, entry| {
                if now < entry.deadline {
                    return true;
                }
                if entry.retries_left == 0 {
                    tracing::debug!(target: "async_snmp_agent::notify", { snmp.request_id = *request_id }, "inform timed out");
                    let _ = entry.status_tx.send(InformStatus::TimedOut);
                    return false;
                }
                entry.retries_left -= 1;
                entry.deadline = now + entry.interval;
                resend.extend(entry.frames.iter().cloned());
                true
            });
        }

        let mut sent = 0;
        for (frame, target) in resend {
            match transport.send_to(&frame, target).await {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::warn!(target: "async_snmp_agent::notify", { snmp.peer = %target, error = %e }, "inform resend failed");
                }
            }
        }
        sent
    }

    /// Match a Response PDU to a pending inform.
    ///
    /// Returns `true` if the response acknowledged one; error-status 0
    /// resolves it as acknowledged, anything else as rejected.
    pub fn process_response(&self, pdu: &Pdu) -> bool {
        if pdu.pdu_type != PduType::Response {
            return false;
        }

        let Some(entry) = self.pending.lock().unwrap().remove(&pdu.request_id) else {
            return false;
        };

        let status = if pdu.is_error() {
            InformStatus::NackReceived
        } else {
            InformStatus::AckReceived
        };
        tracing::debug!(target: "async_snmp_agent::notify", { snmp.request_id = pdu.request_id, snmp.status = %status }, "inform acknowledged");
        let _ = entry.status_tx.send(status);
        true
    }

    fn cancel(&self, request_id: i32) -> bool {
        let Some(entry) = self.pending.lock().unwrap().remove(&request_id) else {
            return false;
        };
        let _ = entry.status_tx.send(InformStatus::Canceled);
        true
    }
}

/// Handle to one in-flight inform.
#[derive(Clone)]
pub struct InformHandle {
    request_id: i32,
    status_rx: watch::Receiver<InformStatus>,
    dispatcher: Arc<InformDispatcher>,
}

impl InformHandle {
    /// The request-id carried by the inform and its acknowledgement.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// Current state.
    pub fn status(&self) -> InformStatus {
        *self.status_rx.borrow()
    }

    /// Wait for a terminal state.
    pub async fn wait(&mut self) -> InformStatus {
        loop {
            let current = *self.status_rx.borrow_and_update();
            if current.is_terminal() {
                return current;
            }
            if self.status_rx.changed().await.is_err() {
                return *self.status_rx.borrow();
            }
        }
    }

    /// Withdraw the inform: no further resends, state becomes
    /// [`InformStatus::Canceled`]. A no-op if already terminal.
    pub fn cancel(&self) {
        self.dispatcher.cancel(self.request_id);
    }
}
