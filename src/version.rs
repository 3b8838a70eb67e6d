//! SNMP protocol versions.

/// SNMP protocol version.
///
/// The agent serves v1 and v2c. The v3 discriminant exists only so an
/// incoming v3 message is rejected with a version error instead of a
/// parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Version {
    /// SNMPv1 (RFC 1157)
    V1 = 0,
    /// SNMPv2c (RFC 1901)
    V2c = 1,
    /// SNMPv3 (RFC 3412), not served
    V3 = 3,
}

impl Version {
    /// Create from the wire integer.
    pub fn from_i32(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::V1),
            1 => Some(Self::V2c),
            3 => Some(Self::V3),
            _ => None,
        }
    }

    /// The wire integer.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2c => write!(f, "v2c"),
            Self::V3 => write!(f, "v3"),
        }
    }
}
