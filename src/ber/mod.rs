//! BER (Basic Encoding Rules) codec.
//!
//! SNMP uses a small subset of BER: definite lengths only, primitive
//! encodings for everything except SEQUENCE and the PDU wrappers.
//! Decoding is zero-copy over [`bytes::Bytes`]; encoding builds the
//! message back-to-front in an [`EncodeBuf`] so every length field is
//! known exactly when it is written (no placeholder back-patching).

pub(crate) mod decode;
pub(crate) mod encode;
pub(crate) mod length;

pub(crate) use decode::Decoder;
pub(crate) use encode::{
    integer_content_len, unsigned32_content_len, unsigned64_content_len, EncodeBuf,
};
pub(crate) use length::{encoded_len as length_encoded_len, MAX_LENGTH};

/// BER tag constants used by SNMP.
pub(crate) mod tag {
    /// Universal class tags.
    pub(crate) mod universal {
        pub(crate) const INTEGER: u8 = 0x02;
        pub(crate) const OCTET_STRING: u8 = 0x04;
        pub(crate) const NULL: u8 = 0x05;
        pub(crate) const OBJECT_IDENTIFIER: u8 = 0x06;
        pub(crate) const SEQUENCE: u8 = 0x30;
        /// Constructed form of OCTET STRING; rejected by this decoder.
        pub(crate) const OCTET_STRING_CONSTRUCTED: u8 = 0x24;
    }

    /// Application class tags (SNMP SMI types, RFC 2578).
    pub(crate) mod application {
        pub(crate) const IP_ADDRESS: u8 = 0x40;
        pub(crate) const COUNTER32: u8 = 0x41;
        pub(crate) const GAUGE32: u8 = 0x42;
        pub(crate) const TIMETICKS: u8 = 0x43;
        pub(crate) const OPAQUE: u8 = 0x44;
        pub(crate) const COUNTER64: u8 = 0x46;
    }

    /// Context class tags (SNMPv2c exception values, RFC 3416).
    pub(crate) mod context {
        pub(crate) const NO_SUCH_OBJECT: u8 = 0x80;
        pub(crate) const NO_SUCH_INSTANCE: u8 = 0x81;
        pub(crate) const END_OF_MIB_VIEW: u8 = 0x82;
    }

    /// PDU tags (context class, constructed).
    pub(crate) mod pdu {
        pub(crate) const TRAP_V1: u8 = 0xA4;
        pub(crate) const GET_BULK_REQUEST: u8 = 0xA5;
    }
}
