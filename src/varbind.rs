//! Variable binding (VarBind) type and response accumulation.
//!
//! A VarBind pairs an OID with a value. `VarBindBuffer` accumulates
//! response varbinds against a byte budget so a response PDU never
//! exceeds the transport's message size limit.

use crate::ber::{length_encoded_len, Decoder, EncodeBuf};
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;

/// Variable binding, an OID-value pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    /// The object identifier.
    pub oid: Oid,
    /// The value.
    pub value: Value,
}

impl VarBind {
    /// Create a new VarBind.
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Create a VarBind with a NULL value (request varbinds).
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    /// Encode to BER.
    pub(crate) fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    /// Exact encoded size in bytes, computed arithmetically without
    /// allocating. Drives response size accounting and GETBULK
    /// truncation.
    pub fn encoded_size(&self) -> usize {
        let content_len = self.oid.ber_encoded_len() + self.value.ber_encoded_len();
        1 + length_encoded_len(content_len) + content_len
    }

    /// Decode from BER.
    pub(crate) fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        let value = Value::decode(&mut seq)?;
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// Encode a list of VarBinds as SEQUENCE OF SEQUENCE.
pub(crate) fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // Reverse buffer, so encode back to front
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Decode a BER-encoded VarBind list.
pub(crate) fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;

    // A typical varbind runs 20-50 bytes; 16 keeps the estimate on the
    // generous side without over-allocating
    let estimated_capacity = (seq.remaining() / 16).max(1);
    let mut varbinds = Vec::with_capacity(estimated_capacity);

    while !seq.is_empty() {
        varbinds.push(VarBind::decode(&mut seq)?);
    }

    Ok(varbinds)
}

/// The varbind that did not fit in a [`VarBindBuffer`].
#[derive(Debug, Clone, PartialEq)]
pub struct VarBindOverflow(pub VarBind);

/// Accumulates response varbinds against a byte budget.
///
/// `push` is transactional: a varbind that would push the encoded list
/// past the budget is rejected and the buffer is left exactly as it
/// was, so the caller can fall back to a tooBig response or stop a
/// GETBULK fill early.
#[derive(Debug)]
pub struct VarBindBuffer {
    varbinds: Vec<VarBind>,
    content_len: usize,
    budget: usize,
}

impl VarBindBuffer {
    /// Create a buffer whose encoded varbind list may not exceed
    /// `budget` bytes.
    pub fn new(budget: usize) -> Self {
        Self {
            varbinds: Vec::new(),
            content_len: 0,
            budget,
        }
    }

    /// Append a varbind if it fits in the remaining budget.
    pub fn push(&mut self, varbind: VarBind) -> std::result::Result<(), VarBindOverflow> {
        let grown = self.content_len + varbind.encoded_size();
        if 1 + length_encoded_len(grown) + grown > self.budget {
            return Err(VarBindOverflow(varbind));
        }
        self.content_len = grown;
        self.varbinds.push(varbind);
        Ok(())
    }

    /// Number of varbinds accumulated so far.
    pub fn len(&self) -> usize {
        self.varbinds.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.varbinds.is_empty()
    }

    /// Exact encoded size of the varbind list (SEQUENCE header
    /// included).
    pub fn encoded_size(&self) -> usize {
        1 + length_encoded_len(self.content_len) + self.content_len
    }

    /// Drop varbinds from the tail until only `len` remain.
    pub fn truncate(&mut self, len: usize) {
        while self.varbinds.len() > len {
            if let Some(vb) = self.varbinds.pop() {
                self.content_len -= vb.encoded_size();
            }
        }
    }

    /// Consume the buffer, yielding the accumulated varbinds.
    pub fn into_varbinds(self) -> Vec<VarBind> {
        self.varbinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use bytes::Bytes;

    fn roundtrip_list(varbinds: &[VarBind]) -> Vec<VarBind> {
        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, varbinds);
        let mut decoder = Decoder::new(buf.finish());
        decode_varbind_list(&mut decoder).unwrap()
    }

    #[test]
    fn varbind_roundtrip() {
        let vb = VarBind::new(oid!(1, 3, 6, 1), Value::Integer(42));

        let mut buf = EncodeBuf::new();
        vb.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());

        assert_eq!(VarBind::decode(&mut decoder).unwrap(), vb);
    }

    #[test]
    fn list_roundtrip_mixed_types() {
        let varbinds = vec![
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 1, 0),
                Value::OctetString(Bytes::from_static(b"test")),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), Value::Integer(42)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::Counter32(1000)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::Gauge32(0x8000_0000)),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::TimeTicks(99999)),
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 6, 0),
                Value::IpAddress([192, 168, 1, 1]),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Counter64(u64::MAX)),
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 8, 0),
                Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4)),
            ),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 9, 0), Value::Null),
        ];

        assert_eq!(roundtrip_list(&varbinds), varbinds);
    }

    #[test]
    fn list_roundtrip_empty() {
        assert!(roundtrip_list(&[]).is_empty());
    }

    #[test]
    fn list_roundtrip_exceptions() {
        let varbinds = vec![
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::NoSuchObject),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), Value::NoSuchInstance),
            VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::EndOfMibView),
        ];

        let decoded = roundtrip_list(&varbinds);
        assert_eq!(decoded, varbinds);
        assert!(decoded.iter().all(|vb| vb.value.is_exception()));
    }

    #[test]
    fn display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::Integer(42));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.1.0 = 42");
    }

    /// encoded_size() must match the real encoding exactly or the
    /// response budget drifts.
    #[test]
    fn encoded_size_matches_encoding() {
        let cases = vec![
            VarBind::null(oid!(1, 3, 6, 1)),
            VarBind::new(oid!(1, 3, 6, 1), Value::Integer(i32::MIN)),
            VarBind::new(oid!(1, 3, 6, 1), Value::Integer(128)),
            VarBind::new(
                oid!(1, 3, 6, 1),
                Value::OctetString(Bytes::from(vec![0u8; 200])),
            ),
            VarBind::new(oid!(1, 3, 6, 1), Value::Counter32(u32::MAX)),
            VarBind::new(oid!(1, 3, 6, 1), Value::Counter64(u64::MAX)),
            VarBind::new(oid!(1, 3, 6, 1), Value::IpAddress([10, 0, 0, 1])),
            VarBind::new(
                oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
                Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 46410)),
            ),
            VarBind::new(oid!(1, 3, 6, 1), Value::EndOfMibView),
        ];

        for vb in cases {
            let mut buf = EncodeBuf::new();
            vb.encode(&mut buf);
            assert_eq!(vb.encoded_size(), buf.len(), "varbind {:?}", vb);
        }
    }

    #[test]
    fn buffer_accepts_within_budget() {
        let mut buffer = VarBindBuffer::new(1024);
        for i in 0..10 {
            buffer
                .push(VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::Integer(i)))
                .unwrap();
        }
        assert_eq!(buffer.len(), 10);

        let mut buf = EncodeBuf::new();
        let size = buffer.encoded_size();
        let varbinds = buffer.into_varbinds();
        encode_varbind_list(&mut buf, &varbinds);
        assert_eq!(buf.len(), size);
    }

    #[test]
    fn buffer_rejects_overflow_unchanged() {
        let small = VarBind::new(oid!(1, 3, 6, 1), Value::Integer(1));
        let budget = 2 + 3 * small.encoded_size();

        let mut buffer = VarBindBuffer::new(budget);
        for _ in 0..3 {
            buffer.push(small.clone()).unwrap();
        }
        let size_before = buffer.encoded_size();

        let big = VarBind::new(
            oid!(1, 3, 6, 1),
            Value::OctetString(Bytes::from_static(b"does not fit")),
        );
        let rejected = buffer.push(big.clone()).unwrap_err();

        assert_eq!(rejected, VarBindOverflow(big));
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.encoded_size(), size_before);

        // The rejected push is not sticky; a smaller one still fits
        // once there is room after truncation
        buffer.truncate(2);
        buffer.push(small).unwrap();
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.encoded_size(), size_before);
    }

    #[test]
    fn buffer_truncate_restores_budget_accounting() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, 1), Value::Counter32(5));
        let mut buffer = VarBindBuffer::new(4096);
        for _ in 0..8 {
            buffer.push(vb.clone()).unwrap();
        }

        buffer.truncate(3);
        assert_eq!(buffer.len(), 3);

        let mut reference = VarBindBuffer::new(4096);
        for _ in 0..3 {
            reference.push(vb.clone()).unwrap();
        }
        assert_eq!(buffer.encoded_size(), reference.encoded_size());
    }

    mod proptests {
        use super::*;
        use crate::oid::Oid;
        use proptest::prelude::*;

        fn arb_oid() -> impl Strategy<Value = Oid> {
            (0u32..3, 0u32..40, prop::collection::vec(0u32..10000, 0..8)).prop_map(
                |(arc1, arc2, rest)| {
                    let mut arcs = vec![arc1, arc2];
                    arcs.extend(rest);
                    Oid::from_slice(&arcs)
                },
            )
        }

        fn arb_value() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<i32>().prop_map(Value::Integer),
                prop::collection::vec(any::<u8>(), 0..256)
                    .prop_map(|v| Value::OctetString(Bytes::from(v))),
                Just(Value::Null),
                arb_oid().prop_map(Value::ObjectIdentifier),
                any::<[u8; 4]>().prop_map(Value::IpAddress),
                any::<u32>().prop_map(Value::Counter32),
                any::<u32>().prop_map(Value::Gauge32),
                any::<u32>().prop_map(Value::TimeTicks),
                any::<u64>().prop_map(Value::Counter64),
                Just(Value::NoSuchObject),
                Just(Value::NoSuchInstance),
                Just(Value::EndOfMibView),
            ]
        }

        proptest! {
            #[test]
            fn encoded_size_exact(oid in arb_oid(), value in arb_value()) {
                let vb = VarBind::new(oid, value);
                let mut buf = EncodeBuf::new();
                vb.encode(&mut buf);
                prop_assert_eq!(vb.encoded_size(), buf.len());
            }

            #[test]
            fn varbind_roundtrips(oid in arb_oid(), value in arb_value()) {
                let vb = VarBind::new(oid, value);
                let mut buf = EncodeBuf::new();
                vb.encode(&mut buf);
                let mut decoder = Decoder::new(buf.finish());
                prop_assert_eq!(VarBind::decode(&mut decoder).unwrap(), vb);
            }

            #[test]
            fn buffer_never_exceeds_budget(
                budget in 16usize..512,
                values in prop::collection::vec(arb_value(), 0..32)
            ) {
                let mut buffer = VarBindBuffer::new(budget);
                for value in values {
                    let _ = buffer.push(VarBind::new(Oid::from_slice(&[1, 3, 6, 1]), value));
                    prop_assert!(buffer.encoded_size() <= budget.max(2));
                }
            }
        }
    }
}
