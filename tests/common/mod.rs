//! Shared test infrastructure: an in-process agent serving a small
//! enterprise MIB and a minimal manager speaking raw datagrams through
//! the public codec.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_snmp_agent::{
    Access, Agent, Community, CommunityMessage, ErrorStatus, MibHandler, Oid, Pdu, PduType,
    PermRule, Statistics, Value, VarBind, Version, oid,
};
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;

pub fn enterprise() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 46410)
}

/// Aggregate status instance, read-only.
pub fn status_oid() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 46410, 0)
}

/// Third LED cell, writable.
pub fn led3_oid() -> Oid {
    oid!(1, 3, 6, 1, 4, 1, 46410, 3)
}

/// LED control node: index 0 is a read-only aggregate, indices 1..=3
/// are writable on/off cells.
pub struct LedMib {
    leds: Mutex<[i32; 3]>,
}

impl LedMib {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            leds: Mutex::new([0; 3]),
        })
    }
}

impl MibHandler for LedMib {
    fn get(&self, index: &[u32]) -> Result<Value, ErrorStatus> {
        match index {
            [0] => Ok(Value::Integer(12345)),
            [n @ 1..=3] => Ok(Value::Integer(self.leds.lock().unwrap()[(n - 1) as usize])),
            _ => Err(ErrorStatus::NoSuchName),
        }
    }

    fn next(&self, index: Option<&[u32]>) -> Option<(Oid, Value)> {
        let next = match index {
            None => 0,
            Some([n]) if *n < 3 => n + 1,
            Some(_) => return None,
        };
        let value = self.get(&[next]).ok()?;
        Some((Oid::from_slice(&[next]), value))
    }

    fn set(&self, index: &[u32], value: &Value) -> Result<Value, ErrorStatus> {
        match index {
            [0] => Err(ErrorStatus::NoAccess),
            [n @ 1..=3] => {
                let v = value.as_i32().ok_or(ErrorStatus::WrongType)?;
                if !(0..=1).contains(&v) {
                    return Err(ErrorStatus::WrongValue);
                }
                self.leds.lock().unwrap()[(n - 1) as usize] = v;
                Ok(Value::Integer(v))
            }
            _ => Err(ErrorStatus::NoSuchName),
        }
    }
}

/// An agent bound to an ephemeral localhost port, running in a spawned
/// task until dropped.
pub struct TestAgent {
    addr: SocketAddr,
    stats: Arc<Statistics>,
    cancel: CancellationToken,
}

impl TestAgent {
    /// Agent serving [`LedMib`] at the enterprise root, with "public"
    /// read-only and "private" read-write.
    pub async fn start() -> Self {
        Self::start_with(Agent::builder()).await
    }

    pub async fn start_with(builder: async_snmp_agent::AgentBuilder) -> Self {
        let stats = Arc::new(Statistics::new());
        let cancel = CancellationToken::new();

        let agent = builder
            .bind("127.0.0.1:0")
            .community(Community::read_only("public"))
            .community(Community::read_write("private"))
            .register(enterprise(), LedMib::new())
            .statistics(Arc::clone(&stats))
            .cancel(cancel.clone())
            .build()
            .await
            .unwrap();

        let addr = agent.local_addr();
        tokio::spawn(async move { agent.run().await });

        Self {
            addr,
            stats,
            cancel,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Manager side of the exchange: encodes requests, decodes responses.
pub struct Manager {
    socket: UdpSocket,
    agent: SocketAddr,
    next_request_id: i32,
}

impl Manager {
    pub async fn connect(agent: SocketAddr) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        Self {
            socket,
            agent,
            next_request_id: 1000,
        }
    }

    /// Send a PDU and wait for the agent's response.
    pub async fn exchange(&mut self, version: Version, community: &str, pdu: Pdu) -> Pdu {
        self.send(version, community, pdu).await;
        self.recv().await.expect("agent did not respond").into_pdu()
    }

    pub async fn send(&mut self, version: Version, community: &str, pdu: Pdu) {
        let msg = CommunityMessage::new(version, Bytes::copy_from_slice(community.as_bytes()), pdu);
        self.socket.send_to(&msg.encode(), self.agent).await.unwrap();
    }

    pub async fn send_raw(&self, data: &[u8]) {
        self.socket.send_to(data, self.agent).await.unwrap();
    }

    /// Receive one datagram, or None after a short quiet period.
    pub async fn recv(&self) -> Option<CommunityMessage> {
        let mut buf = vec![0u8; 65535];
        let recv = self.socket.recv_from(&mut buf);
        match tokio::time::timeout(Duration::from_millis(500), recv).await {
            Ok(result) => {
                let (len, source) = result.unwrap();
                Some(CommunityMessage::decode(Bytes::copy_from_slice(&buf[..len]), source).unwrap())
            }
            Err(_) => None,
        }
    }

    pub fn request_id(&mut self) -> i32 {
        self.next_request_id += 1;
        self.next_request_id
    }

    pub fn get(&mut self, oids: &[Oid]) -> Pdu {
        Pdu::request(
            PduType::GetRequest,
            self.request_id(),
            oids.iter().cloned().map(VarBind::null).collect(),
        )
    }

    pub fn get_next(&mut self, oids: &[Oid]) -> Pdu {
        Pdu::request(
            PduType::GetNextRequest,
            self.request_id(),
            oids.iter().cloned().map(VarBind::null).collect(),
        )
    }

    pub fn set(&mut self, varbinds: Vec<VarBind>) -> Pdu {
        Pdu::request(PduType::SetRequest, self.request_id(), varbinds)
    }

    pub fn get_bulk(&mut self, non_repeaters: i32, max_repetitions: i32, oids: &[Oid]) -> Pdu {
        let mut pdu = Pdu::request(
            PduType::GetBulkRequest,
            self.request_id(),
            oids.iter().cloned().map(VarBind::null).collect(),
        );
        pdu.error_status = non_repeaters;
        pdu.error_index = max_repetitions;
        pdu
    }
}

/// A community limited to a single subtree.
pub fn subtree_only(name: &str, prefix: Oid, access: Access) -> Community {
    Community::new(
        name.as_bytes().to_vec(),
        vec![PermRule::subtree(prefix, access)],
    )
}
