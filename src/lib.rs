//! # async-snmp-agent
//!
//! Async SNMP agent library for Rust: serve a MIB over SNMPv1/v2c and
//! emit traps and informs.
//!
//! ## Features
//!
//! - GET, GET-NEXT, GET-BULK, and SET over UDP, SNMPv1 and v2c
//! - MIB subtree registration with a simple [`MibHandler`] trait
//! - Per-community access control with OID-prefix permission rules
//! - v1/v2c trap sending and confirmed informs with retry
//! - Zero-copy BER encoding/decoding
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_snmp_agent::{Agent, Community, Scalar, Value, oid};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<async_snmp_agent::Error>> {
//!     let agent = Agent::builder()
//!         .bind("0.0.0.0:161")
//!         .community(Community::read_only("public"))
//!         .register(
//!             oid!(1, 3, 6, 1, 4, 1, 46410, 0),
//!             Arc::new(Scalar::new(Value::Integer(12345))),
//!         )
//!         .build()
//!         .await?;
//!
//!     agent.run().await
//! }
//! ```
//!
//! ## Sending Notifications
//!
//! ```rust,no_run
//! use async_snmp_agent::notification::{NotificationSender, Target, oids};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<async_snmp_agent::Error>> {
//!     let sender = NotificationSender::builder()
//!         .target(Target::v2c("192.0.2.10:162".parse().unwrap(), "public"))
//!         .build()
//!         .await?;
//!     sender.send_trap(oids::cold_start(), vec![]).await?;
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod agent;
pub(crate) mod ber;
pub mod error;
pub mod message;
pub mod mib;
pub mod notification;
pub mod oid;
pub mod pdu;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

// Re-exports for convenience
pub use access::{Access, AccessTable, Community, PermRule};
pub use agent::{Agent, AgentBuilder, AuthFailurePolicy, Statistics};
pub use error::{Error, ErrorStatus, Result};
pub use message::CommunityMessage;
pub use mib::{MibHandler, MibTree, Scalar};
pub use notification::{
    InformHandle, InformStatus, NotificationBuilder, NotificationSender, Target,
};
pub use oid::Oid;
pub use pdu::{GenericTrap, Pdu, PduType, TrapV1Pdu};
pub use transport::{AgentTransport, UdpTransport};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;

#[cfg(feature = "testing")]
pub use transport::{MockHandle, MockTransport};
