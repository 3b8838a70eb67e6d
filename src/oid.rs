//! Object Identifier (OID) type.
//!
//! OIDs are stored as `SmallVec<[u32; 16]>` so the common MIB-2 and
//! enterprise OIDs never touch the heap. Ordering is lexicographic over
//! the arc sequence, which is exactly the order GET-NEXT walks the tree.

use crate::error::internal::{DecodeErrorKind, OidErrorKind};
use crate::error::{Error, Result, UNKNOWN_PEER};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in an OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
/// Enforced during BER decoding; protects the agent from maliciously long
/// OIDs in inbound requests.
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// A sequence of arc values (u32) naming a position in the MIB namespace,
/// e.g. `1.3.6.1.4.1.46410` for a private enterprise subtree.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::oid::Oid;
    ///
    /// let oid = Oid::new(vec![1, 3, 6, 1, 2, 1]);
    /// assert_eq!(oid.arcs(), &[1, 3, 6, 1, 2, 1]);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// Parsing does **not** validate arc constraints per X.690 Section
    /// 8.19.4; call [`validate()`](Self::validate) when the OID will be
    /// encoded on the wire.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        for part in s.split('.') {
            if part.is_empty() {
                continue;
            }

            let arc: u32 = part
                .parse()
                .map_err(|_| Error::invalid_oid(OidErrorKind::InvalidArc))?;

            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    ///
    /// An OID always starts with itself, and any OID starts with an
    /// empty OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// The arcs remaining after a registered prefix.
    ///
    /// This is how a request OID splits into (node, instance index):
    /// the deepest registered prefix owns the node, the suffix names the
    /// instance. Returns `None` when `prefix` is not a prefix of `self`.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::oid;
    ///
    /// let request = oid!(1, 3, 6, 1, 4, 1, 46410, 3);
    /// let node = oid!(1, 3, 6, 1, 4, 1, 46410);
    /// assert_eq!(request.suffix(&node), Some(&[3u32][..]));
    /// assert_eq!(node.suffix(&request), None);
    /// ```
    pub fn suffix<'a>(&'a self, prefix: &Oid) -> Option<&'a [u32]> {
        if self.starts_with(prefix) {
            Some(&self.arcs[prefix.len()..])
        } else {
            None
        }
    }

    /// Get the parent OID (all arcs except the last).
    ///
    /// Returns `None` if the OID is empty.
    pub fn parent(&self) -> Option<Oid> {
        if self.arcs.is_empty() {
            None
        } else {
            Some(Oid {
                arcs: SmallVec::from_slice(&self.arcs[..self.arcs.len() - 1]),
            })
        }
    }

    /// Create a child OID by appending an arc.
    ///
    /// # Examples
    ///
    /// ```
    /// use async_snmp_agent::oid::Oid;
    ///
    /// let node = Oid::parse("1.3.6.1.4.1.46410").unwrap();
    /// assert_eq!(node.child(0).to_string(), "1.3.6.1.4.1.46410.0");
    /// ```
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create a new OID by appending an index suffix.
    ///
    /// The inverse of [`suffix()`](Self::suffix): joins a node prefix
    /// with the instance index a handler reported.
    pub fn concat(&self, index: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(index);
        Oid { arcs }
    }

    /// Validate OID arcs per X.690 Section 8.19.4.
    ///
    /// - arc1 must be 0, 1, or 2
    /// - arc2 must be <= 39 when arc1 is 0 or 1
    /// - arc2 can be any value when arc1 is 2
    pub fn validate(&self) -> Result<()> {
        if self.arcs.is_empty() {
            return Ok(());
        }

        let arc1 = self.arcs[0];

        if arc1 > 2 {
            return Err(Error::invalid_oid(OidErrorKind::InvalidFirstArc(arc1)));
        }

        if self.arcs.len() >= 2 {
            let arc2 = self.arcs[1];
            if arc1 < 2 && arc2 >= 40 {
                return Err(Error::invalid_oid(OidErrorKind::InvalidSecondArc {
                    first: arc1,
                    second: arc2,
                }));
            }
        }

        Ok(())
    }

    /// Validate that the OID doesn't exceed [`MAX_OID_LEN`] arcs.
    pub fn validate_length(&self) -> Result<()> {
        if self.arcs.len() > MAX_OID_LEN {
            return Err(Error::invalid_oid(OidErrorKind::TooManyArcs {
                count: self.arcs.len(),
                max: MAX_OID_LEN,
            }));
        }
        Ok(())
    }

    /// Encode to BER content octets, stack-allocated for typical lengths.
    ///
    /// OID encoding (X.690 Section 8.19):
    /// - First two arcs packed as (arc1 * 40) + arc2 in one subidentifier
    /// - Every subidentifier in base-128 with continuation bits
    pub fn to_ber(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        if self.arcs.is_empty() {
            return bytes;
        }

        // The first subidentifier may be multi-byte: arc2 can exceed 127
        // when arc1 is 2.
        if self.arcs.len() >= 2 {
            encode_subidentifier(&mut bytes, self.arcs[0] * 40 + self.arcs[1]);
        } else {
            encode_subidentifier(&mut bytes, self.arcs[0] * 40);
        }

        for &arc in self.arcs.iter().skip(2) {
            encode_subidentifier(&mut bytes, arc);
        }

        bytes
    }

    /// BER-encoded length (tag + length field + content) without
    /// allocating.
    pub(crate) fn ber_encoded_len(&self) -> usize {
        let content_len = self.ber_content_len();
        1 + crate::ber::length_encoded_len(content_len) + content_len
    }

    fn ber_content_len(&self) -> usize {
        if self.arcs.is_empty() {
            return 0;
        }

        let first = if self.arcs.len() >= 2 {
            self.arcs[0] * 40 + self.arcs[1]
        } else {
            self.arcs[0] * 40
        };

        subidentifier_len(first)
            + self
                .arcs
                .iter()
                .skip(2)
                .map(|&arc| subidentifier_len(arc))
                .sum::<usize>()
    }

    /// Decode from BER content octets.
    ///
    /// Enforces [`MAX_OID_LEN`] per RFC 2578 Section 3.5. Non-minimal
    /// subidentifiers (leading 0x80 bytes) are accepted, matching the
    /// permissive stance of widely deployed managers.
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        let (first_subid, consumed) = decode_subidentifier(data)?;

        if first_subid < 40 {
            arcs.push(0);
            arcs.push(first_subid);
        } else if first_subid < 80 {
            arcs.push(1);
            arcs.push(first_subid - 40);
        } else {
            arcs.push(2);
            arcs.push(first_subid - 80);
        }

        let mut i = consumed;
        while i < data.len() {
            let (arc, bytes_consumed) = decode_subidentifier(&data[i..])?;
            arcs.push(arc);
            i += bytes_consumed;

            if arcs.len() > MAX_OID_LEN {
                tracing::debug!(
                    target: "async_snmp_agent::ber",
                    { snmp.offset = i, snmp.decode_error = %DecodeErrorKind::OidTooLong { count: arcs.len(), max: MAX_OID_LEN } },
                    "decode error"
                );
                return Err(Error::MalformedMessage {
                    source: UNKNOWN_PEER,
                }
                .boxed());
            }
        }

        Ok(Self { arcs })
    }
}

/// Encode one subidentifier in base-128 with continuation bits.
///
/// Value 0 emits exactly one `0x00` byte, never zero bytes.
#[inline]
fn subidentifier_len(value: u32) -> usize {
    if value == 0 {
        return 1;
    }

    let mut len = 0;
    let mut temp = value;
    while temp > 0 {
        len += 1;
        temp >>= 7;
    }
    len
}

fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    if value == 0 {
        bytes.push(0);
        return;
    }

    let mut temp = value;
    let mut count = 0;
    while temp > 0 {
        count += 1;
        temp >>= 7;
    }

    // MSB-first, continuation bit on all but the last group
    for i in (0..count).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode one subidentifier, returning (value, bytes_consumed).
///
/// Fails on truncation (no byte with a clear high bit before the end of
/// `data`) and on 32-bit overflow, checked before each shift.
fn decode_subidentifier(data: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;
    let mut i = 0;

    loop {
        if i >= data.len() {
            tracing::debug!(
                target: "async_snmp_agent::ber",
                { snmp.offset = i, snmp.decode_error = %DecodeErrorKind::TruncatedData },
                "decode error"
            );
            return Err(Error::MalformedMessage {
                source: UNKNOWN_PEER,
            }
            .boxed());
        }

        let byte = data[i];
        i += 1;

        if value > (u32::MAX >> 7) {
            tracing::debug!(
                target: "async_snmp_agent::ber",
                { snmp.offset = i, snmp.decode_error = %DecodeErrorKind::IntegerOverflow },
                "decode error"
            );
            return Err(Error::MalformedMessage {
                source: UNKNOWN_PEER,
            }
            .boxed());
        }

        value = (value << 7) | ((byte & 0x7F) as u32);

        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, i))
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<crate::error::Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

/// Macro to create an OID from literal arcs.
///
/// # Examples
///
/// ```
/// use async_snmp_agent::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}
