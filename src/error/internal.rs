//! Internal error detail kinds.
//!
//! These enums carry the precise reason a decode/encode/OID operation
//! failed. They are logged at the failure site via `tracing` and then
//! collapsed into the simplified public [`Error`](super::Error)
//! variants, so remote peers and library users never see internals
//! that could aid probing.

/// BER decode error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeErrorKind {
    /// Expected different tag.
    UnexpectedTag { expected: u8, actual: u8 },
    /// Data truncated unexpectedly.
    TruncatedData,
    /// Indefinite length not supported.
    IndefiniteLength,
    /// Integer value overflow.
    IntegerOverflow,
    /// Zero-length integer.
    ZeroLengthInteger,
    /// Unknown SNMP version.
    UnknownVersion(i32),
    /// Unknown PDU type.
    UnknownPduType(u8),
    /// Constructed OCTET STRING not supported.
    ConstructedOctetString,
    /// NULL with non-zero length.
    InvalidNull,
    /// Invalid IP address length.
    InvalidIpAddressLength { length: usize },
    /// Length field too long.
    LengthTooLong { octets: usize },
    /// Length exceeds maximum.
    LengthExceedsMax { length: usize, max: usize },
    /// Integer64 too long.
    Integer64TooLong { length: usize },
    /// TLV extends past end of data.
    TlvOverflow,
    /// Insufficient data for read.
    InsufficientData { needed: usize, available: usize },
    /// OID exceeds the arc-count limit.
    OidTooLong { count: usize, max: usize },
    /// Trailing bytes after a complete message.
    TrailingData { remaining: usize },
}

impl std::fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedTag { expected, actual } => {
                write!(f, "expected tag 0x{:02X}, got 0x{:02X}", expected, actual)
            }
            Self::TruncatedData => write!(f, "unexpected end of data"),
            Self::IndefiniteLength => write!(f, "indefinite length not supported"),
            Self::IntegerOverflow => write!(f, "integer value overflow"),
            Self::ZeroLengthInteger => write!(f, "zero-length integer"),
            Self::UnknownVersion(v) => write!(f, "unknown SNMP version {}", v),
            Self::UnknownPduType(t) => write!(f, "unknown PDU type 0x{:02X}", t),
            Self::ConstructedOctetString => {
                write!(f, "constructed OCTET STRING not supported")
            }
            Self::InvalidNull => write!(f, "NULL with non-zero length"),
            Self::InvalidIpAddressLength { length } => {
                write!(f, "invalid IP address length {}", length)
            }
            Self::LengthTooLong { octets } => {
                write!(f, "length field uses {} octets", octets)
            }
            Self::LengthExceedsMax { length, max } => {
                write!(f, "length {} exceeds maximum {}", length, max)
            }
            Self::Integer64TooLong { length } => {
                write!(f, "64-bit integer content of {} bytes", length)
            }
            Self::TlvOverflow => write!(f, "TLV extends past end of data"),
            Self::InsufficientData { needed, available } => {
                write!(f, "need {} bytes, {} available", needed, available)
            }
            Self::OidTooLong { count, max } => {
                write!(f, "OID has {} arcs, maximum is {}", count, max)
            }
            Self::TrailingData { remaining } => {
                write!(f, "{} trailing bytes after message", remaining)
            }
        }
    }
}

/// OID construction/parse error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OidErrorKind {
    /// Arc is not a valid decimal number.
    InvalidArc,
    /// First arc must be 0, 1, or 2.
    InvalidFirstArc(u32),
    /// Second arc must be <= 39 when the first arc is 0 or 1.
    InvalidSecondArc { first: u32, second: u32 },
    /// Too many arcs.
    TooManyArcs { count: usize, max: usize },
}

impl std::fmt::Display for OidErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArc => write!(f, "arc is not a valid number"),
            Self::InvalidFirstArc(arc) => {
                write!(f, "first arc must be 0, 1, or 2 (got {})", arc)
            }
            Self::InvalidSecondArc { first, second } => {
                write!(
                    f,
                    "second arc must be <= 39 when first arc is {} (got {})",
                    first, second
                )
            }
            Self::TooManyArcs { count, max } => {
                write!(f, "{} arcs exceeds maximum of {}", count, max)
            }
        }
    }
}
