//! Community-based SNMP message format (v1/v2c).

use std::net::SocketAddr;

use crate::ber::{Decoder, EncodeBuf};
use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result};
use crate::pdu::{Pdu, TrapV1Pdu};
use crate::version::Version;
use bytes::Bytes;

/// Community-based SNMP message.
///
/// One type serves both versions; the structure is identical and only
/// the version number differs.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunityMessage {
    /// SNMP version (V1 or V2c)
    pub version: Version,
    /// Community string
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Create a new community message.
    ///
    /// # Panics
    /// Panics if version is V3.
    pub fn new(version: Version, community: impl Into<Bytes>, pdu: Pdu) -> Self {
        assert!(
            matches!(version, Version::V1 | Version::V2c),
            "community messages are v1/v2c only, not {}",
            version
        );
        Self {
            version,
            community: community.into(),
            pdu,
        }
    }

    /// Create a v1 message.
    pub fn v1(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self::new(Version::V1, community, pdu)
    }

    /// Create a v2c message.
    pub fn v2c(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self::new(Version::V2c, community, pdu)
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();

        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(self.version.as_i32());
        });

        buf.finish()
    }

    /// Encode an SNMPv1 trap message.
    ///
    /// The Trap-PDU does not share the generic PDU header, so it gets
    /// its own framing entry point. Always version 0 on the wire.
    pub fn encode_trap_v1(community: impl Into<Bytes>, trap: &TrapV1Pdu) -> Bytes {
        let community = community.into();
        let mut buf = EncodeBuf::new();

        buf.push_sequence(|buf| {
            trap.encode(buf);
            buf.push_octet_string(&community);
            buf.push_integer(Version::V1.as_i32());
        });

        buf.finish()
    }

    /// Decode an incoming datagram.
    ///
    /// `source` attributes decode failures to the sending peer. A v3
    /// message or an unknown version number fails with
    /// [`Error::UnsupportedVersion`] so the caller can count it
    /// separately from parse errors.
    pub fn decode(data: Bytes, source: SocketAddr) -> Result<Self> {
        let mut decoder = Decoder::with_source(data, source);
        let mut seq = decoder.read_sequence()?;

        let version_num = seq.read_integer()?;
        let version = match Version::from_i32(version_num) {
            Some(v @ (Version::V1 | Version::V2c)) => v,
            _ => {
                tracing::debug!(
                    target: "async_snmp_agent::ber",
                    { snmp.offset = seq.offset(), snmp.decode_error = %DecodeErrorKind::UnknownVersion(version_num) },
                    "unsupported version"
                );
                return Err(Error::UnsupportedVersion {
                    source,
                    version: version_num,
                }
                .boxed());
            }
        };

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(CommunityMessage {
            version,
            community,
            pdu,
        })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}
