//! BER encoding.
//!
//! [`EncodeBuf`] builds a message back-to-front: bytes are stored in
//! reverse order internally and the whole buffer is reversed once in
//! [`finish()`](EncodeBuf::finish). Writing the last field first means
//! every SEQUENCE/PDU length is exact at the moment it is written, so
//! there is no placeholder length to back-patch and an abandoned
//! half-written varbind can never leave a stale length field behind.
//!
//! Callers therefore encode fields in reverse order:
//!
//! ```text
//! buf.push_sequence(|buf| {
//!     pdu.encode(buf);                  // last field of the SEQUENCE
//!     buf.push_octet_string(&community);
//!     buf.push_integer(version);        // first field of the SEQUENCE
//! });
//! ```

use super::length::encode_length;
use super::tag;
use crate::oid::Oid;
use bytes::Bytes;
use smallvec::SmallVec;

/// BER encoder that prepends to a byte buffer.
pub(crate) struct EncodeBuf {
    // Stored in reverse order; reversed once on finish().
    buf: Vec<u8>,
}

impl EncodeBuf {
    /// Create an empty buffer.
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
        }
    }

    /// Number of bytes encoded so far.
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Consume the buffer and return the encoded message.
    pub(crate) fn finish(mut self) -> Bytes {
        self.buf.reverse();
        Bytes::from(self.buf)
    }

    /// Prepend a single tag byte.
    pub(crate) fn push_tag(&mut self, tag: u8) {
        self.buf.push(tag);
    }

    /// Prepend a length field for `len` content bytes.
    pub(crate) fn push_length(&mut self, len: usize) {
        let (bytes, n) = encode_length(len);
        // encode_length already returns bytes in reversed order
        self.buf.extend_from_slice(&bytes[..n]);
    }

    /// Prepend raw bytes; they appear in the output in the given order.
    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend(bytes.iter().rev());
    }

    /// Prepend a complete primitive TLV.
    fn push_primitive(&mut self, tag: u8, content: &[u8]) {
        self.push_bytes(content);
        self.push_length(content.len());
        self.push_tag(tag);
    }

    /// Prepend an INTEGER with minimal two's-complement content.
    pub(crate) fn push_integer(&mut self, value: i32) {
        self.push_primitive(tag::universal::INTEGER, &integer_content(value));
    }

    /// Prepend an unsigned 32-bit value under the given tag
    /// (Counter32, Gauge32, TimeTicks).
    pub(crate) fn push_unsigned32(&mut self, tag: u8, value: u32) {
        self.push_primitive(tag, &unsigned_content(value as u64));
    }

    /// Prepend an unsigned 64-bit value under the given tag (Counter64).
    pub(crate) fn push_unsigned64(&mut self, tag: u8, value: u64) {
        self.push_primitive(tag, &unsigned_content(value));
    }

    /// Prepend an OCTET STRING.
    pub(crate) fn push_octet_string(&mut self, bytes: &[u8]) {
        self.push_primitive(tag::universal::OCTET_STRING, bytes);
    }

    /// Prepend a NULL.
    pub(crate) fn push_null(&mut self) {
        self.push_length(0);
        self.push_tag(tag::universal::NULL);
    }

    /// Prepend an OBJECT IDENTIFIER.
    pub(crate) fn push_oid(&mut self, oid: &Oid) {
        self.push_primitive(tag::universal::OBJECT_IDENTIFIER, &oid.to_ber());
    }

    /// Prepend an IpAddress.
    pub(crate) fn push_ip_address(&mut self, addr: &[u8; 4]) {
        self.push_primitive(tag::application::IP_ADDRESS, addr);
    }

    /// Prepend a SEQUENCE whose contents are encoded by `f`.
    ///
    /// `f` must encode the sequence fields in reverse order.
    pub(crate) fn push_sequence(&mut self, f: impl FnOnce(&mut Self)) {
        self.push_constructed(tag::universal::SEQUENCE, f);
    }

    /// Prepend a constructed TLV (SEQUENCE, PDU wrapper) whose contents
    /// are encoded by `f` in reverse field order.
    pub(crate) fn push_constructed(&mut self, tag: u8, f: impl FnOnce(&mut Self)) {
        let before = self.buf.len();
        f(self);
        let content_len = self.buf.len() - before;
        self.push_length(content_len);
        self.push_tag(tag);
    }
}

/// Minimal two's-complement content bytes for a signed integer.
fn integer_content(value: i32) -> SmallVec<[u8; 4]> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    // Drop redundant leading 0x00/0xFF bytes while the sign bit survives
    while start < 3 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if redundant {
            start += 1;
        } else {
            break;
        }
    }
    SmallVec::from_slice(&bytes[start..])
}

/// Minimal content bytes for an unsigned integer.
///
/// A value whose top remaining byte has the high bit set gets a leading
/// zero so it cannot be misread as a negative two's-complement number.
fn unsigned_content(value: u64) -> SmallVec<[u8; 9]> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 && bytes[start] == 0 {
        start += 1;
    }

    let mut content = SmallVec::new();
    if bytes[start] & 0x80 != 0 {
        content.push(0x00);
    }
    content.extend_from_slice(&bytes[start..]);
    content
}

/// Content length of a signed INTEGER (excluding tag and length field).
pub(crate) fn integer_content_len(value: i32) -> usize {
    integer_content(value).len()
}

/// Content length of an unsigned 32-bit value.
pub(crate) fn unsigned32_content_len(value: u32) -> usize {
    unsigned_content(value as u64).len()
}

/// Content length of an unsigned 64-bit value.
pub(crate) fn unsigned64_content_len(value: u64) -> usize {
    unsigned_content(value).len()
}
