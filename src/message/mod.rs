//! SNMP message framing.
//!
//! A community message wraps one PDU as
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`.
//! That layout covers both served versions; v1 and v2c differ only in
//! the version number.

mod community;

pub use community::CommunityMessage;
