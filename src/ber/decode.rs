//! BER decoding.
//!
//! Zero-copy decoding using `Bytes`. The decoder carries the datagram's
//! source address so every parse failure can be attributed to a peer in
//! logs without threading it through each call site.

use std::net::SocketAddr;

use super::length::decode_length;
use super::tag;
use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result, UNKNOWN_PEER};
use crate::oid::Oid;
use bytes::Bytes;

/// BER decoder that reads from a byte buffer.
pub(crate) struct Decoder {
    data: Bytes,
    offset: usize,
    source: Option<SocketAddr>,
}

impl Decoder {
    /// Create a new decoder from bytes.
    pub(crate) fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            source: None,
        }
    }

    /// Create a decoder carrying the datagram's source address for error context.
    pub(crate) fn with_source(data: Bytes, source: SocketAddr) -> Self {
        Self {
            data,
            offset: 0,
            source: Some(source),
        }
    }

    /// Create a decoder from a byte slice (copies the data).
    #[cfg(test)]
    pub(crate) fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    fn source(&self) -> SocketAddr {
        self.source.unwrap_or(UNKNOWN_PEER)
    }

    pub(crate) fn malformed(&self, kind: DecodeErrorKind) -> Box<Error> {
        tracing::debug!(
            target: "async_snmp_agent::ber",
            { snmp.offset = self.offset, snmp.decode_error = %kind },
            "decode error"
        );
        Error::MalformedMessage {
            source: self.source(),
        }
        .boxed()
    }

    /// Get the current offset.
    pub(crate) fn offset(&self) -> usize {
        self.offset
    }

    /// Get remaining bytes.
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if we've reached the end.
    pub(crate) fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    /// Peek at the next tag without consuming it.
    pub(crate) fn peek_tag(&self) -> Option<u8> {
        if self.offset < self.data.len() {
            Some(self.data[self.offset])
        } else {
            None
        }
    }

    /// Read a single byte.
    pub(crate) fn read_byte(&mut self) -> Result<u8> {
        if self.offset >= self.data.len() {
            return Err(self.malformed(DecodeErrorKind::TruncatedData));
        }
        let byte = self.data[self.offset];
        self.offset += 1;
        Ok(byte)
    }

    /// Read a tag byte.
    pub(crate) fn read_tag(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Read a length field.
    pub(crate) fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) =
            decode_length(&self.data[self.offset..], self.offset, self.source)?;
        self.offset += consumed;
        Ok(len)
    }

    /// Read raw bytes without copying.
    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        // saturating_add keeps an overflowing length from bypassing the bounds check
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.malformed(DecodeErrorKind::InsufficientData {
                needed: len,
                available: self.remaining(),
            }));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Read and expect a specific tag, returning the content length.
    pub(crate) fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let actual = self.read_tag()?;
        if actual != expected {
            self.offset -= 1;
            return Err(self.malformed(DecodeErrorKind::UnexpectedTag { expected, actual }));
        }
        self.read_length()
    }

    /// Read a BER INTEGER (signed).
    pub(crate) fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Read a signed integer value given the content length.
    ///
    /// Content longer than 4 bytes is truncated with a warning rather than
    /// rejected, matching net-snmp's permissive overflow handling.
    pub(crate) fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 4 {
            tracing::warn!(
                target: "async_snmp_agent::ber",
                { snmp.offset = self.offset, snmp.length = len },
                "integer too long, truncating to 4 bytes"
            );
        }

        let bytes = self.read_bytes(len)?;

        // Sign extend from the first content byte
        let is_negative = bytes[0] & 0x80 != 0;
        let mut value: i32 = if is_negative { -1 } else { 0 };

        for &byte in bytes.iter().take(4) {
            value = (value << 8) | (byte as i32);
        }

        Ok(value)
    }

    /// Read an unsigned 32-bit integer with a specific tag (Counter32,
    /// Gauge32, TimeTicks).
    pub(crate) fn read_unsigned32(&mut self, expected_tag: u8) -> Result<u32> {
        let len = self.expect_tag(expected_tag)?;
        self.read_unsigned32_value(len)
    }

    /// Read an unsigned 32-bit value given the content length.
    pub(crate) fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 5 {
            // 5 bytes max: 1 disambiguating zero + 4 value bytes
            tracing::warn!(
                target: "async_snmp_agent::ber",
                { snmp.offset = self.offset, snmp.length = len },
                "unsigned integer too long, truncating to 4 bytes"
            );
        }

        let bytes = self.read_bytes(len)?;
        let mut value: u32 = 0;

        for &byte in bytes.iter().take(5) {
            value = (value << 8) | (byte as u32);
        }

        Ok(value)
    }

    /// Read a 64-bit unsigned integer (Counter64).
    pub(crate) fn read_unsigned64(&mut self, expected_tag: u8) -> Result<u64> {
        let len = self.expect_tag(expected_tag)?;
        self.read_unsigned64_value(len)
    }

    /// Read a 64-bit unsigned value given the content length.
    pub(crate) fn read_unsigned64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.malformed(DecodeErrorKind::ZeroLengthInteger));
        }
        if len > 9 {
            // 9 bytes max: 1 disambiguating zero + 8 value bytes
            return Err(self.malformed(DecodeErrorKind::Integer64TooLong { length: len }));
        }

        let bytes = self.read_bytes(len)?;
        let mut value: u64 = 0;

        for &byte in bytes.iter() {
            value = (value << 8) | (byte as u64);
        }

        Ok(value)
    }

    /// Read an OCTET STRING.
    pub(crate) fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    /// Read a NULL.
    pub(crate) fn read_null(&mut self) -> Result<()> {
        let len = self.expect_tag(tag::universal::NULL)?;
        if len != 0 {
            return Err(self.malformed(DecodeErrorKind::InvalidNull));
        }
        Ok(())
    }

    /// Read an OBJECT IDENTIFIER.
    pub(crate) fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    /// Read an OID given a pre-read length.
    pub(crate) fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes)
    }

    /// Read an IpAddress (must be exactly 4 bytes).
    pub(crate) fn read_ip_address(&mut self) -> Result<[u8; 4]> {
        let len = self.expect_tag(tag::application::IP_ADDRESS)?;
        if len != 4 {
            return Err(self.malformed(DecodeErrorKind::InvalidIpAddressLength { length: len }));
        }
        let bytes = self.read_bytes(4)?;
        Ok([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    /// Read a SEQUENCE, returning a decoder for its contents.
    pub(crate) fn read_sequence(&mut self) -> Result<Decoder> {
        self.read_constructed(tag::universal::SEQUENCE)
    }

    /// Read a constructed type with a specific tag, returning a decoder
    /// for its contents.
    pub(crate) fn read_constructed(&mut self, expected_tag: u8) -> Result<Decoder> {
        let len = self.expect_tag(expected_tag)?;
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            source: self.source,
        })
    }

    /// Split off the next `len` bytes as a child decoder.
    pub(crate) fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            source: self.source,
        })
    }

    /// Skip a TLV (tag-length-value) without parsing.
    pub(crate) fn skip_tlv(&mut self) -> Result<()> {
        let _tag = self.read_tag()?;
        let len = self.read_length()?;
        let new_offset = self.offset.saturating_add(len);
        if new_offset > self.data.len() {
            return Err(self.malformed(DecodeErrorKind::TlvOverflow));
        }
        self.offset = new_offset;
        Ok(())
    }
}
