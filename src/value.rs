//! SNMP value types.
//!
//! The `Value` enum represents all SNMP data types a varbind can carry,
//! including the SNMPv2c exception values an agent places in responses.

use crate::ber::{tag, Decoder, EncodeBuf};
use crate::error::internal::DecodeErrorKind;
use crate::error::Result;
use crate::oid::Oid;
use crate::util::hex_encode;
use bytes::Bytes;

// net-snmp convention for typed values wrapped in Opaque:
// context-class high-tag-number form, one length byte, then the payload.
const OPAQUE_FLOAT_PREFIX: [u8; 3] = [0x9F, 0x78, 0x04];
const OPAQUE_DOUBLE_PREFIX: [u8; 3] = [0x9F, 0x79, 0x08];

/// SNMP value.
///
/// Covers the SMIv2 wire types plus exception values. Unknown tags are
/// preserved as raw bytes for forward compatibility.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Value {
    /// INTEGER (ASN.1 primitive, signed 32-bit)
    Integer(i32),

    /// OCTET STRING (arbitrary bytes).
    ///
    /// Per RFC 2578 (SMIv2), OCTET STRING values have a maximum size of
    /// 65535 octets. The limit is not enforced during decoding to keep
    /// parsing permissive.
    OctetString(Bytes),

    /// NULL (the value placeholder in GET/GET-NEXT request varbinds)
    Null,

    /// OBJECT IDENTIFIER
    ObjectIdentifier(Oid),

    /// IpAddress (4 bytes, big-endian)
    IpAddress([u8; 4]),

    /// Counter32 (unsigned 32-bit, wrapping)
    Counter32(u32),

    /// Gauge32 / Unsigned32 (unsigned 32-bit, non-wrapping)
    Gauge32(u32),

    /// TimeTicks (hundredths of seconds since epoch)
    TimeTicks(u32),

    /// Opaque (arbitrary bytes; also carries wrapped Float/Double, see
    /// [`Value::opaque_float`] and [`Value::opaque_double`])
    Opaque(Bytes),

    /// Counter64 (unsigned 64-bit, wrapping). SNMPv2c only; RFC 2576
    /// forbids it in v1 responses.
    Counter64(u64),

    /// noSuchObject exception: no handler covers the requested OID.
    NoSuchObject,

    /// noSuchInstance exception: the object exists but the requested
    /// instance does not. This is the end-of-table marker a handler's
    /// instance iteration produces.
    NoSuchInstance,

    /// endOfMibView exception: GET-NEXT/GET-BULK walked past the last
    /// registered instance.
    EndOfMibView,

    /// Unknown/unrecognized value type (for forward compatibility)
    Unknown { tag: u8, data: Bytes },
}

impl Value {
    /// Try to get as i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as u32 (Counter32, Gauge32, TimeTicks, or a
    /// non-negative Integer).
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v),
            Value::Integer(v) if *v >= 0 => Some(*v as u32),
            _ => None,
        }
    }

    /// Try to get as u64 (Counter64, any 32-bit unsigned type, or a
    /// non-negative Integer).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Counter64(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(*v as u64),
            Value::Integer(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// Try to get as bytes (OctetString or Opaque).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(v) | Value::Opaque(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get as a UTF-8 string (OctetString or Opaque).
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Try to get as OID.
    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Value::ObjectIdentifier(oid) => Some(oid),
            _ => None,
        }
    }

    /// Try to get as IP address.
    pub fn as_ip(&self) -> Option<std::net::Ipv4Addr> {
        match self {
            Value::IpAddress(bytes) => Some(std::net::Ipv4Addr::from(*bytes)),
            _ => None,
        }
    }

    /// Wrap an f32 in an Opaque per the net-snmp convention.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::Value;
    ///
    /// let v = Value::opaque_float(21.5);
    /// assert_eq!(v.as_opaque_float(), Some(21.5));
    /// ```
    pub fn opaque_float(value: f32) -> Self {
        let mut content = Vec::with_capacity(7);
        content.extend_from_slice(&OPAQUE_FLOAT_PREFIX);
        content.extend_from_slice(&value.to_be_bytes());
        Value::Opaque(Bytes::from(content))
    }

    /// Wrap an f64 in an Opaque per the net-snmp convention.
    pub fn opaque_double(value: f64) -> Self {
        let mut content = Vec::with_capacity(11);
        content.extend_from_slice(&OPAQUE_DOUBLE_PREFIX);
        content.extend_from_slice(&value.to_be_bytes());
        Value::Opaque(Bytes::from(content))
    }

    /// Extract a wrapped f32 from an Opaque value.
    pub fn as_opaque_float(&self) -> Option<f32> {
        match self {
            Value::Opaque(data) if data.len() == 7 && data[..3] == OPAQUE_FLOAT_PREFIX => {
                Some(f32::from_be_bytes([data[3], data[4], data[5], data[6]]))
            }
            _ => None,
        }
    }

    /// Extract a wrapped f64 from an Opaque value.
    pub fn as_opaque_double(&self) -> Option<f64> {
        match self {
            Value::Opaque(data) if data.len() == 11 && data[..3] == OPAQUE_DOUBLE_PREFIX => {
                let mut bytes = [0u8; 8];
                bytes.copy_from_slice(&data[3..]);
                Some(f64::from_be_bytes(bytes))
            }
            _ => None,
        }
    }

    /// Check if this is an exception value.
    pub fn is_exception(&self) -> bool {
        matches!(
            self,
            Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView
        )
    }

    /// Total BER-encoded length (tag + length field + content).
    ///
    /// Used for response-size accounting before a varbind is committed.
    pub(crate) fn ber_encoded_len(&self) -> usize {
        use crate::ber::{
            integer_content_len, length_encoded_len, unsigned32_content_len,
            unsigned64_content_len,
        };

        let content_len = match self {
            Value::Integer(v) => integer_content_len(*v),
            Value::OctetString(data) | Value::Opaque(data) => data.len(),
            Value::Null | Value::NoSuchObject | Value::NoSuchInstance | Value::EndOfMibView => 0,
            Value::ObjectIdentifier(oid) => oid.to_ber().len(),
            Value::IpAddress(_) => 4,
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => {
                unsigned32_content_len(*v)
            }
            Value::Counter64(v) => unsigned64_content_len(*v),
            Value::Unknown { data, .. } => data.len(),
        };
        1 + length_encoded_len(content_len) + content_len
    }

    /// Encode to BER.
    pub(crate) fn encode(&self, buf: &mut EncodeBuf) {
        match self {
            Value::Integer(v) => buf.push_integer(*v),
            Value::OctetString(data) => buf.push_octet_string(data),
            Value::Null => buf.push_null(),
            Value::ObjectIdentifier(oid) => buf.push_oid(oid),
            Value::IpAddress(addr) => buf.push_ip_address(addr),
            Value::Counter32(v) => buf.push_unsigned32(tag::application::COUNTER32, *v),
            Value::Gauge32(v) => buf.push_unsigned32(tag::application::GAUGE32, *v),
            Value::TimeTicks(v) => buf.push_unsigned32(tag::application::TIMETICKS, *v),
            Value::Opaque(data) => {
                buf.push_bytes(data);
                buf.push_length(data.len());
                buf.push_tag(tag::application::OPAQUE);
            }
            Value::Counter64(v) => buf.push_unsigned64(tag::application::COUNTER64, *v),
            Value::NoSuchObject => {
                buf.push_length(0);
                buf.push_tag(tag::context::NO_SUCH_OBJECT);
            }
            Value::NoSuchInstance => {
                buf.push_length(0);
                buf.push_tag(tag::context::NO_SUCH_INSTANCE);
            }
            Value::EndOfMibView => {
                buf.push_length(0);
                buf.push_tag(tag::context::END_OF_MIB_VIEW);
            }
            Value::Unknown { tag: t, data } => {
                buf.push_bytes(data);
                buf.push_length(data.len());
                buf.push_tag(*t);
            }
        }
    }

    /// Decode from BER.
    pub(crate) fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let len = decoder.read_length()?;

        match tag {
            tag::universal::INTEGER => Ok(Value::Integer(decoder.read_integer_value(len)?)),
            tag::universal::OCTET_STRING => Ok(Value::OctetString(decoder.read_bytes(len)?)),
            tag::universal::NULL => {
                if len != 0 {
                    return Err(decoder.malformed(DecodeErrorKind::InvalidNull));
                }
                Ok(Value::Null)
            }
            tag::universal::OBJECT_IDENTIFIER => {
                Ok(Value::ObjectIdentifier(decoder.read_oid_value(len)?))
            }
            tag::application::IP_ADDRESS => {
                if len != 4 {
                    return Err(
                        decoder.malformed(DecodeErrorKind::InvalidIpAddressLength { length: len })
                    );
                }
                let data = decoder.read_bytes(4)?;
                Ok(Value::IpAddress([data[0], data[1], data[2], data[3]]))
            }
            tag::application::COUNTER32 => {
                Ok(Value::Counter32(decoder.read_unsigned32_value(len)?))
            }
            tag::application::GAUGE32 => Ok(Value::Gauge32(decoder.read_unsigned32_value(len)?)),
            tag::application::TIMETICKS => {
                Ok(Value::TimeTicks(decoder.read_unsigned32_value(len)?))
            }
            tag::application::OPAQUE => Ok(Value::Opaque(decoder.read_bytes(len)?)),
            tag::application::COUNTER64 => {
                Ok(Value::Counter64(decoder.read_unsigned64_value(len)?))
            }
            tag::context::NO_SUCH_OBJECT => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::NoSuchObject)
            }
            tag::context::NO_SUCH_INSTANCE => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::NoSuchInstance)
            }
            tag::context::END_OF_MIB_VIEW => {
                let _ = decoder.read_bytes(len)?;
                Ok(Value::EndOfMibView)
            }
            // Net-snmp documents but never parses the constructed form; same here.
            tag::universal::OCTET_STRING_CONSTRUCTED => {
                Err(decoder.malformed(DecodeErrorKind::ConstructedOctetString))
            }
            _ => {
                let data = decoder.read_bytes(len)?;
                Ok(Value::Unknown { tag, data })
            }
        }
    }

    /// The type name used in log output.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::OctetString(_) => "OCTET STRING",
            Value::Null => "NULL",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Value::IpAddress(_) => "IpAddress",
            Value::Counter32(_) => "Counter32",
            Value::Gauge32(_) => "Gauge32",
            Value::TimeTicks(_) => "TimeTicks",
            Value::Opaque(_) => "Opaque",
            Value::Counter64(_) => "Counter64",
            Value::NoSuchObject => "noSuchObject",
            Value::NoSuchInstance => "noSuchInstance",
            Value::EndOfMibView => "endOfMibView",
            Value::Unknown { .. } => "unknown",
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::OctetString(data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    write!(f, "{}", s)
                } else {
                    write!(f, "0x{}", hex_encode(data))
                }
            }
            Value::Null => write!(f, "NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{}", oid),
            Value::IpAddress(addr) => {
                write!(f, "{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
            }
            Value::Counter32(v) => write!(f, "{}", v),
            Value::Gauge32(v) => write!(f, "{}", v),
            Value::TimeTicks(v) => {
                let secs = v / 100;
                let days = secs / 86400;
                let hours = (secs % 86400) / 3600;
                let mins = (secs % 3600) / 60;
                let s = secs % 60;
                write!(f, "{}d {}h {}m {}s", days, hours, mins, s)
            }
            Value::Opaque(data) => {
                if let Some(v) = self.as_opaque_float() {
                    write!(f, "Float({})", v)
                } else if let Some(v) = self.as_opaque_double() {
                    write!(f, "Double({})", v)
                } else {
                    write!(f, "Opaque(0x{})", hex_encode(data))
                }
            }
            Value::Counter64(v) => write!(f, "{}", v),
            Value::NoSuchObject => write!(f, "noSuchObject"),
            Value::NoSuchInstance => write!(f, "noSuchInstance"),
            Value::EndOfMibView => write!(f, "endOfMibView"),
            Value::Unknown { tag, data } => {
                write!(f, "Unknown(tag=0x{:02X}, data=0x{})", tag, hex_encode(data))
            }
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::OctetString(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::OctetString(Bytes::from(s))
    }
}

impl From<&[u8]> for Value {
    fn from(data: &[u8]) -> Self {
        Value::OctetString(Bytes::copy_from_slice(data))
    }
}

impl From<Oid> for Value {
    fn from(oid: Oid) -> Self {
        Value::ObjectIdentifier(oid)
    }
}

impl From<std::net::Ipv4Addr> for Value {
    fn from(addr: std::net::Ipv4Addr) -> Self {
        Value::IpAddress(addr.octets())
    }
}

impl From<Bytes> for Value {
    fn from(data: Bytes) -> Self {
        Value::OctetString(data)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Counter64(v)
    }
}

impl From<[u8; 4]> for Value {
    fn from(addr: [u8; 4]) -> Self {
        Value::IpAddress(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn roundtrip(value: Value) -> Value {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        Value::decode(&mut decoder).unwrap()
    }

    #[test]
    fn integer_boundary_roundtrips() {
        for v in [0, 1, -1, 127, 128, -128, -129, i32::MIN, i32::MAX] {
            let value = Value::Integer(v);
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn unsigned_boundary_roundtrips() {
        for v in [0u32, 1, 0x7FFF_FFFF, 0x8000_0000, u32::MAX] {
            for value in [Value::Counter32(v), Value::Gauge32(v), Value::TimeTicks(v)] {
                assert_eq!(roundtrip(value.clone()), value);
            }
        }
        for v in [0u64, 1, u64::from(u32::MAX) + 1, u64::MAX] {
            let value = Value::Counter64(v);
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn octet_string_roundtrips() {
        for data in [&b""[..], b"hello world", &[0x00, 0xFF, 0x80, 0x7F]] {
            let value = Value::OctetString(Bytes::copy_from_slice(data));
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn remaining_types_roundtrip() {
        for value in [
            Value::Null,
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 46410, 0)),
            Value::IpAddress([192, 168, 1, 1]),
            Value::IpAddress([0, 0, 0, 0]),
            Value::IpAddress([255, 255, 255, 255]),
            Value::Opaque(Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF])),
            Value::NoSuchObject,
            Value::NoSuchInstance,
            Value::EndOfMibView,
        ] {
            assert_eq!(roundtrip(value.clone()), value);
        }
    }

    #[test]
    fn opaque_float_wrapping() {
        let value = Value::opaque_float(21.5);
        assert_eq!(value.as_opaque_float(), Some(21.5));
        assert_eq!(roundtrip(value.clone()), value);

        // Wire form: Opaque containing 9F 78 04 + IEEE 754 bits
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let bytes = buf.finish();
        assert_eq!(&bytes[..5], &[0x44, 0x07, 0x9F, 0x78, 0x04]);
    }

    #[test]
    fn opaque_double_wrapping() {
        let value = Value::opaque_double(-1234.5678);
        assert_eq!(value.as_opaque_double(), Some(-1234.5678));
        assert_eq!(roundtrip(value.clone()), value);

        // A plain Opaque is not misread as a wrapped number
        let plain = Value::Opaque(Bytes::from_static(b"raw"));
        assert_eq!(plain.as_opaque_float(), None);
        assert_eq!(plain.as_opaque_double(), None);
    }

    #[test]
    fn reject_constructed_octet_string() {
        let data = Bytes::from_static(&[0x24, 0x03, 0x04, 0x01, 0x41]);
        let mut decoder = Decoder::new(data);
        assert!(Value::decode(&mut decoder).is_err());
    }

    #[test]
    fn unknown_tag_preserved() {
        // Tag 0x45 is application class but not a standard SNMP type
        let data = Bytes::from_static(&[0x45, 0x03, 0x01, 0x02, 0x03]);
        let mut decoder = Decoder::new(data);
        let value = Value::decode(&mut decoder).unwrap();

        match &value {
            Value::Unknown { tag, data } => {
                assert_eq!(*tag, 0x45);
                assert_eq!(data.as_ref(), &[0x01, 0x02, 0x03]);
            }
            other => panic!("expected Unknown variant, got {:?}", other),
        }

        assert_eq!(roundtrip(value.clone()), value);
    }

    #[test]
    fn exception_with_content_accepted() {
        // Content inside an exception value is skipped, not fatal
        let data = Bytes::from_static(&[0x80, 0x01, 0xFF]);
        let mut decoder = Decoder::new(data);
        assert_eq!(Value::decode(&mut decoder).unwrap(), Value::NoSuchObject);
    }

    #[test]
    fn decode_invalid_null_and_ip() {
        let mut decoder = Decoder::new(Bytes::from_static(&[0x05, 0x01, 0x00]));
        assert!(Value::decode(&mut decoder).is_err());

        let mut decoder = Decoder::new(Bytes::from_static(&[0x40, 0x03, 0x01, 0x02, 0x03]));
        assert!(Value::decode(&mut decoder).is_err());
    }

    #[test]
    fn ber_encoded_len_matches_encoding() {
        for value in [
            Value::Integer(0),
            Value::Integer(i32::MIN),
            Value::OctetString(Bytes::from_static(b"some description")),
            Value::Null,
            Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 46410)),
            Value::IpAddress([10, 0, 0, 1]),
            Value::Counter32(u32::MAX),
            Value::Gauge32(0x8000_0000),
            Value::TimeTicks(123456),
            Value::Counter64(u64::MAX),
            Value::opaque_double(2.5),
            Value::EndOfMibView,
        ] {
            let mut buf = EncodeBuf::new();
            value.encode(&mut buf);
            assert_eq!(buf.len(), value.ber_encoded_len(), "value {:?}", value);
        }
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::Integer(42).as_i32(), Some(42));
        assert_eq!(Value::Counter32(100).as_i32(), None);

        assert_eq!(Value::Counter32(100).as_u32(), Some(100));
        assert_eq!(Value::Integer(-1).as_u32(), None);
        assert_eq!(Value::Counter64(100).as_u32(), None);

        assert_eq!(Value::Counter64(100).as_u64(), Some(100));
        assert_eq!(Value::TimeTicks(300).as_u64(), Some(300));

        let s = Value::OctetString(Bytes::from_static(b"hello"));
        assert_eq!(s.as_str(), Some("hello"));
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[0xFF, 0xFE])).as_str(),
            None
        );

        let v = Value::IpAddress([192, 168, 1, 1]);
        assert_eq!(v.as_ip(), Some(std::net::Ipv4Addr::new(192, 168, 1, 1)));

        assert!(Value::NoSuchInstance.is_exception());
        assert!(!Value::Null.is_exception());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Integer(-42).to_string(), "-42");
        assert_eq!(
            Value::OctetString(Bytes::from_static(b"hello")).to_string(),
            "hello"
        );
        assert_eq!(
            Value::OctetString(Bytes::from_static(&[0xFF, 0xFE])).to_string(),
            "0xfffe"
        );
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::IpAddress([192, 168, 1, 1]).to_string(), "192.168.1.1");
        assert_eq!(Value::TimeTicks(123456).to_string(), "0d 0h 20m 34s");
        assert_eq!(
            Value::Opaque(Bytes::from_static(&[0xBE, 0xEF])).to_string(),
            "Opaque(0xbeef)"
        );
        assert_eq!(Value::opaque_float(1.5).to_string(), "Float(1.5)");
        assert_eq!(Value::EndOfMibView.to_string(), "endOfMibView");
    }

    #[test]
    fn from_conversions() {
        assert_eq!(Value::from(42i32), Value::Integer(42));
        assert_eq!(Value::from("hello").as_str(), Some("hello"));
        assert_eq!(
            Value::from(std::net::Ipv4Addr::new(10, 0, 0, 1)),
            Value::IpAddress([10, 0, 0, 1])
        );
        assert_eq!(Value::from(10u64), Value::Counter64(10));
        assert_eq!(
            Value::from(oid!(1, 3, 6, 1)).as_oid(),
            Some(&oid!(1, 3, 6, 1))
        );
    }
}
