//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: single byte, bit 8=0, value 0-127
//! - Long form: initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): rejected per net-snmp behavior

use std::net::SocketAddr;

use crate::error::internal::DecodeErrorKind;
use crate::error::{Error, Result, UNKNOWN_PEER};

/// Maximum content length we'll accept (to prevent DoS).
///
/// 2MB is far larger than any realistic SNMP message (typical messages
/// are hundreds of bytes). A hostile length field can therefore never
/// drive a large allocation.
pub(crate) const MAX_LENGTH: usize = 0x200000; // 2MB

/// Encode a length value, returning bytes in reverse order for prepending.
///
/// Uses short form for lengths <= 127, long form otherwise. The reversed
/// byte order matches [`EncodeBuf`](super::EncodeBuf)'s back-to-front
/// internal storage.
pub(crate) fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];

    if len <= 127 {
        buf[0] = len as u8;
        (buf, 1)
    } else if len <= 0xFF {
        buf[0] = len as u8;
        buf[1] = 0x81;
        (buf, 2)
    } else if len <= 0xFFFF {
        buf[0] = len as u8;
        buf[1] = (len >> 8) as u8;
        buf[2] = 0x82;
        (buf, 3)
    } else if len <= 0xFFFFFF {
        buf[0] = len as u8;
        buf[1] = (len >> 8) as u8;
        buf[2] = (len >> 16) as u8;
        buf[3] = 0x83;
        (buf, 4)
    } else {
        buf[0] = len as u8;
        buf[1] = (len >> 8) as u8;
        buf[2] = (len >> 16) as u8;
        buf[3] = (len >> 24) as u8;
        buf[4] = 0x84;
        (buf, 5)
    }
}

/// Number of bytes the length field for `len` occupies on the wire.
pub(crate) fn encoded_len(len: usize) -> usize {
    match len {
        0..=127 => 1,
        128..=0xFF => 2,
        0x100..=0xFFFF => 3,
        0x10000..=0xFFFFFF => 4,
        _ => 5,
    }
}

/// Decode a length, returning (length, bytes_consumed).
///
/// `base_offset` and `source` feed the diagnostic log when the field is
/// invalid; the public error is always [`Error::MalformedMessage`].
pub(crate) fn decode_length(
    data: &[u8],
    base_offset: usize,
    source: Option<SocketAddr>,
) -> Result<(usize, usize)> {
    let fail = |kind: DecodeErrorKind| {
        tracing::debug!(
            target: "async_snmp_agent::ber",
            { snmp.offset = base_offset, snmp.decode_error = %kind },
            "invalid length field"
        );
        Error::MalformedMessage {
            source: source.unwrap_or(UNKNOWN_PEER),
        }
        .boxed()
    };

    if data.is_empty() {
        return Err(fail(DecodeErrorKind::TruncatedData));
    }

    let first = data[0];

    if first == 0x80 {
        return Err(fail(DecodeErrorKind::IndefiniteLength));
    }

    if first & 0x80 == 0 {
        // Short form
        Ok((first as usize, 1))
    } else {
        let num_octets = (first & 0x7F) as usize;

        if num_octets > 4 {
            return Err(fail(DecodeErrorKind::LengthTooLong { octets: num_octets }));
        }

        if data.len() < 1 + num_octets {
            return Err(fail(DecodeErrorKind::TruncatedData));
        }

        let mut len: usize = 0;
        for i in 0..num_octets {
            len = (len << 8) | (data[1 + i] as usize);
        }

        if len > MAX_LENGTH {
            return Err(fail(DecodeErrorKind::LengthExceedsMax {
                length: len,
                max: MAX_LENGTH,
            }));
        }

        Ok((len, 1 + num_octets))
    }
}
