//! SNMP Protocol Data Units (PDUs).
//!
//! A PDU carries one SNMP operation. The generic [`Pdu`] covers every
//! operation sharing the request-id/error-status/error-index header;
//! the SNMPv1 trap has its own structure ([`TrapV1Pdu`]).

use crate::ber::{tag, Decoder, EncodeBuf};
use crate::error::internal::DecodeErrorKind;
use crate::error::{ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::Value;
use crate::varbind::{decode_varbind_list, encode_varbind_list, VarBind};

/// sysUpTime.0, the first varbind of every v2c notification.
pub(crate) const SYS_UPTIME_OID: [u32; 9] = [1, 3, 6, 1, 2, 1, 1, 3, 0];

/// snmpTrapOID.0, the second varbind of every v2c notification.
pub(crate) const SNMP_TRAP_OID: [u32; 11] = [1, 3, 6, 1, 6, 3, 1, 1, 4, 1, 0];

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    SetRequest = 0xA3,
    TrapV1 = 0xA4,
    GetBulkRequest = 0xA5,
    InformRequest = 0xA6,
    TrapV2 = 0xA7,
    Report = 0xA8,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xA0 => Some(Self::GetRequest),
            0xA1 => Some(Self::GetNextRequest),
            0xA2 => Some(Self::Response),
            0xA3 => Some(Self::SetRequest),
            0xA4 => Some(Self::TrapV1),
            0xA5 => Some(Self::GetBulkRequest),
            0xA6 => Some(Self::InformRequest),
            0xA7 => Some(Self::TrapV2),
            0xA8 => Some(Self::Report),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether an agent answers this PDU type with a Response.
    pub fn is_request(self) -> bool {
        matches!(
            self,
            Self::GetRequest | Self::GetNextRequest | Self::GetBulkRequest | Self::SetRequest
        )
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
            Self::TrapV1 => write!(f, "TrapV1"),
            Self::GetBulkRequest => write!(f, "GetBulkRequest"),
            Self::InformRequest => write!(f, "InformRequest"),
            Self::TrapV2 => write!(f, "TrapV2"),
            Self::Report => write!(f, "Report"),
        }
    }
}

/// Generic PDU covering every type with the shared header layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Pdu {
    /// PDU type
    pub pdu_type: PduType,
    /// Request ID correlating requests and responses
    pub request_id: i32,
    /// Error status (non-repeaters for GETBULK)
    pub error_status: i32,
    /// 1-based index of the failing varbind (max-repetitions for GETBULK)
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    /// Create a request PDU with zeroed error fields.
    pub fn request(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a v2c notification PDU (Trap or Inform).
    ///
    /// Builds the varbind list RFC 3416 Section 4.2.6 mandates:
    /// sysUpTime.0, then snmpTrapOID.0, then the caller's varbinds.
    pub fn notification(
        pdu_type: PduType,
        request_id: i32,
        uptime: u32,
        trap_oid: Oid,
        varbinds: Vec<VarBind>,
    ) -> Self {
        let mut all = Vec::with_capacity(varbinds.len() + 2);
        all.push(VarBind::new(
            Oid::from_slice(&SYS_UPTIME_OID),
            Value::TimeTicks(uptime),
        ));
        all.push(VarBind::new(
            Oid::from_slice(&SNMP_TRAP_OID),
            Value::ObjectIdentifier(trap_oid),
        ));
        all.extend(varbinds);

        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: all,
        }
    }

    /// Encode to BER.
    pub(crate) fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode from BER.
    pub(crate) fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag)
            .ok_or_else(|| decoder.malformed(DecodeErrorKind::UnknownPduType(tag)))?;

        let len = decoder.read_length()?;
        let mut pdu = decoder.sub_decoder(len)?;

        let request_id = pdu.read_integer()?;
        let error_status = pdu.read_integer()?;
        let error_index = pdu.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }

    /// Whether this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// The error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// Build a success Response echoing the given varbinds.
    pub fn to_response(&self, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Build an error Response.
    ///
    /// Per RFC 3416 Section 4.2.1, an error response echoes the request's
    /// varbind list unmodified.
    pub fn to_error_response(&self, error_status: ErrorStatus, error_index: i32) -> Self {
        Self {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: error_status.as_i32(),
            error_index,
            varbinds: self.varbinds.clone(),
        }
    }
}

/// SNMPv1 generic trap types (RFC 1157 Section 4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GenericTrap {
    /// coldStart(0), agent is reinitializing and config may change
    ColdStart = 0,
    /// warmStart(1), agent is reinitializing with config unchanged
    WarmStart = 1,
    /// linkDown(2)
    LinkDown = 2,
    /// linkUp(3)
    LinkUp = 3,
    /// authenticationFailure(4)
    AuthenticationFailure = 4,
    /// egpNeighborLoss(5)
    EgpNeighborLoss = 5,
    /// enterpriseSpecific(6), see the specific_trap field
    EnterpriseSpecific = 6,
}

impl GenericTrap {
    /// Create from integer value.
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::ColdStart),
            1 => Some(Self::WarmStart),
            2 => Some(Self::LinkDown),
            3 => Some(Self::LinkUp),
            4 => Some(Self::AuthenticationFailure),
            5 => Some(Self::EgpNeighborLoss),
            6 => Some(Self::EnterpriseSpecific),
            _ => None,
        }
    }

    /// Get the integer value.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// SNMPv1 Trap PDU (RFC 1157 Section 4.1.6).
///
/// Structurally unlike every other PDU type; only sent to v1 targets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrapV1Pdu {
    /// Enterprise OID (sysObjectID of the sending entity)
    pub enterprise: Oid,
    /// IPv4 address of the sending agent
    pub agent_addr: [u8; 4],
    /// Generic trap type
    pub generic_trap: i32,
    /// Specific trap code, meaningful when generic_trap is
    /// enterpriseSpecific
    pub specific_trap: i32,
    /// Hundredths of seconds since agent start
    pub time_stamp: u32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl TrapV1Pdu {
    /// Create a new SNMPv1 Trap PDU.
    pub fn new(
        enterprise: Oid,
        agent_addr: [u8; 4],
        generic_trap: GenericTrap,
        specific_trap: i32,
        time_stamp: u32,
        varbinds: Vec<VarBind>,
    ) -> Self {
        Self {
            enterprise,
            agent_addr,
            generic_trap: generic_trap.as_i32(),
            specific_trap,
            time_stamp,
            varbinds,
        }
    }

    /// Whether this is an enterprise-specific trap.
    pub fn is_enterprise_specific(&self) -> bool {
        self.generic_trap == GenericTrap::EnterpriseSpecific as i32
    }

    /// The equivalent SNMPv2 snmpTrapOID.0 value (RFC 3584 Section 3).
    ///
    /// Generic traps 0-5 map to `snmpTraps.{generic_trap + 1}`;
    /// enterprise-specific traps map to `enterprise.0.specific_trap`.
    pub fn v2_trap_oid(&self) -> Oid {
        if self.is_enterprise_specific() {
            self.enterprise.concat(&[0, self.specific_trap as u32])
        } else {
            // snmpTraps = 1.3.6.1.6.3.1.1.5
            let trap_num = self.generic_trap + 1;
            crate::oid!(1, 3, 6, 1, 6, 3, 1, 1, 5).child(trap_num as u32)
        }
    }

    /// Encode to BER.
    pub(crate) fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(tag::pdu::TRAP_V1, |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_unsigned32(tag::application::TIMETICKS, self.time_stamp);
            buf.push_integer(self.specific_trap);
            buf.push_integer(self.generic_trap);
            // NetworkAddress is APPLICATION 0 IMPLICIT IpAddress
            buf.push_ip_address(&self.agent_addr);
            buf.push_oid(&self.enterprise);
        });
    }

    /// Decode from BER.
    pub(crate) fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut pdu = decoder.read_constructed(tag::pdu::TRAP_V1)?;

        let enterprise = pdu.read_oid()?;
        let agent_addr = pdu.read_ip_address()?;
        let generic_trap = pdu.read_integer()?;
        let specific_trap = pdu.read_integer()?;

        let ts_len = pdu.expect_tag(tag::application::TIMETICKS)?;
        let time_stamp = pdu.read_unsigned32_value(ts_len)?;

        let varbinds = decode_varbind_list(&mut pdu)?;

        Ok(TrapV1Pdu {
            enterprise,
            agent_addr,
            generic_trap,
            specific_trap,
            time_stamp,
            varbinds,
        })
    }
}

/// A GETBULK request's parameter view of a generic [`Pdu`].
///
/// In GETBULK requests the error-status field carries non-repeaters and
/// the error-index field carries max-repetitions (RFC 3416 Section 4.2.3).
/// Negative values are treated as zero.
#[derive(Debug, Clone, Copy)]
pub struct BulkParams {
    /// Varbinds processed as plain GETNEXT
    pub non_repeaters: usize,
    /// Iterations over the remaining varbinds
    pub max_repetitions: usize,
}

impl BulkParams {
    /// Extract GETBULK parameters from a decoded PDU.
    pub fn from_pdu(pdu: &Pdu) -> Self {
        Self {
            non_repeaters: pdu.error_status.max(0) as usize,
            max_repetitions: pdu.error_index.max(0) as usize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn request_roundtrip() {
        let pdu = Pdu::request(
            PduType::GetRequest,
            12345,
            vec![VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0))],
        );

        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        let decoded = Pdu::decode(&mut decoder).unwrap();

        assert_eq!(decoded, pdu);
        assert!(decoded.pdu_type.is_request());
    }

    #[test]
    fn unknown_pdu_tag_rejected() {
        // 0xA9 is outside the defined PDU tag range
        let mut decoder = Decoder::from_slice(&[0xA9, 0x00]);
        assert!(Pdu::decode(&mut decoder).is_err());
    }

    #[test]
    fn bulk_params_clamp_negative() {
        let pdu = Pdu {
            pdu_type: PduType::GetBulkRequest,
            request_id: 1,
            error_status: -3,
            error_index: 10,
            varbinds: vec![],
        };

        let params = BulkParams::from_pdu(&pdu);
        assert_eq!(params.non_repeaters, 0);
        assert_eq!(params.max_repetitions, 10);
    }

    #[test]
    fn notification_prepends_mandatory_varbinds() {
        let pdu = Pdu::notification(
            PduType::TrapV2,
            77,
            4200,
            oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1),
            vec![VarBind::new(oid!(1, 3, 6, 1, 4, 1, 46410, 0), Value::Integer(1))],
        );

        assert_eq!(pdu.varbinds.len(), 3);
        assert_eq!(pdu.varbinds[0].oid, Oid::from_slice(&SYS_UPTIME_OID));
        assert_eq!(pdu.varbinds[0].value, Value::TimeTicks(4200));
        assert_eq!(pdu.varbinds[1].oid, Oid::from_slice(&SNMP_TRAP_OID));
        assert_eq!(
            pdu.varbinds[1].value,
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1))
        );
    }

    #[test]
    fn error_response_echoes_request_varbinds() {
        let request = Pdu::request(
            PduType::SetRequest,
            9,
            vec![VarBind::new(oid!(1, 3, 6, 1, 4, 1, 46410, 1), Value::Integer(5))],
        );

        let response = request.to_error_response(ErrorStatus::NoAccess, 1);
        assert_eq!(response.pdu_type, PduType::Response);
        assert_eq!(response.request_id, 9);
        assert_eq!(response.error_status_enum(), ErrorStatus::NoAccess);
        assert_eq!(response.error_index, 1);
        assert_eq!(response.varbinds, request.varbinds);
        assert!(response.is_error());
    }

    #[test]
    fn trap_v1_roundtrip() {
        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 46410),
            [192, 168, 1, 1],
            GenericTrap::LinkDown,
            0,
            12345678,
            vec![VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, 1),
                Value::Integer(1),
            )],
        );

        let mut buf = EncodeBuf::new();
        trap.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        let decoded = TrapV1Pdu::decode(&mut decoder).unwrap();

        assert_eq!(decoded, trap);
    }

    #[test]
    fn trap_v1_wire_layout() {
        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 5),
            [10, 0, 0, 1],
            GenericTrap::ColdStart,
            0,
            100,
            vec![],
        );

        let mut buf = EncodeBuf::new();
        trap.encode(&mut buf);
        let bytes = buf.finish();

        assert_eq!(
            bytes.as_ref(),
            &[
                0xA4, 0x17, // Trap-PDU
                0x06, 0x06, 0x2B, 0x06, 0x01, 0x04, 0x01, 0x05, // enterprise
                0x40, 0x04, 0x0A, 0x00, 0x00, 0x01, // agent-addr
                0x02, 0x01, 0x00, // generic-trap coldStart
                0x02, 0x01, 0x00, // specific-trap
                0x43, 0x01, 0x64, // time-stamp 100
                0x30, 0x00, // empty varbind list
            ]
        );
    }

    #[test]
    fn v2_trap_oid_translation() {
        // RFC 3584 Section 3: generic traps map to snmpTraps.{g+1}
        let cases = [
            (GenericTrap::ColdStart, oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 1)),
            (GenericTrap::LinkDown, oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 3)),
            (
                GenericTrap::AuthenticationFailure,
                oid!(1, 3, 6, 1, 6, 3, 1, 1, 5, 5),
            ),
        ];

        for (generic, expected) in cases {
            let trap = TrapV1Pdu::new(
                oid!(1, 3, 6, 1, 4, 1, 46410),
                [0, 0, 0, 0],
                generic,
                0,
                0,
                vec![],
            );
            assert_eq!(trap.v2_trap_oid(), expected, "{:?}", generic);
        }

        // Enterprise-specific maps to enterprise.0.specific
        let trap = TrapV1Pdu::new(
            oid!(1, 3, 6, 1, 4, 1, 46410, 1, 2),
            [0, 0, 0, 0],
            GenericTrap::EnterpriseSpecific,
            42,
            0,
            vec![],
        );
        assert_eq!(trap.v2_trap_oid(), oid!(1, 3, 6, 1, 4, 1, 46410, 1, 2, 0, 42));
    }
}
