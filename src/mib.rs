//! MIB tree: OID-prefix registry of management object handlers.
//!
//! Handlers are registered under an OID prefix and serve every instance
//! below it. GET and SET resolve by deepest matching prefix; GETNEXT
//! walks all registered nodes for the smallest instance strictly
//! greater than the request OID.

use std::sync::Arc;

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::value::Value;

/// Handler for one registered MIB subtree.
///
/// Index slices are relative to the registration prefix: a scalar
/// instance `prefix.0` arrives as `&[0]`, a table cell `prefix.1.3.2`
/// as `&[1, 3, 2]`.
pub trait MibHandler: Send + Sync {
    /// Read the instance at `index`.
    ///
    /// Return `Err(ErrorStatus::NoSuchName)` when the instance does not
    /// exist under this node; the agent maps that to the
    /// version-appropriate miss. Other error codes fail the whole
    /// request PDU.
    fn get(&self, index: &[u32]) -> std::result::Result<Value, ErrorStatus>;

    /// The first instance (`index` is `None`) or the next instance
    /// strictly after `index`, in lexicographic index order.
    ///
    /// Returns the instance's index suffix and value, or `None` when
    /// this node is exhausted and the walk moves to the next registered
    /// node.
    fn next(&self, index: Option<&[u32]>) -> Option<(Oid, Value)>;

    /// Validate and write the instance at `index`, returning the stored
    /// value (echoed into the response).
    ///
    /// The default rejects all writes.
    fn set(&self, index: &[u32], value: &Value) -> std::result::Result<Value, ErrorStatus> {
        let _ = (index, value);
        Err(ErrorStatus::NotWritable)
    }
}

/// Read-only scalar: serves exactly `prefix.0`.
pub struct Scalar {
    value: Value,
}

impl Scalar {
    /// Create a scalar node holding a fixed value.
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl MibHandler for Scalar {
    fn get(&self, index: &[u32]) -> std::result::Result<Value, ErrorStatus> {
        if index == [0] {
            Ok(self.value.clone())
        } else {
            Err(ErrorStatus::NoSuchName)
        }
    }

    fn next(&self, index: Option<&[u32]>) -> Option<(Oid, Value)> {
        match index {
            None => Some((Oid::from_slice(&[0]), self.value.clone())),
            Some(_) => None,
        }
    }
}

/// Stable handle for a registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

struct MibNode {
    id: RegistrationId,
    prefix: Oid,
    handler: Arc<dyn MibHandler>,
}

/// Registry of MIB subtree handlers.
#[derive(Default)]
pub struct MibTree {
    // Sorted by prefix so the GETNEXT walk visits nodes in OID order
    nodes: Vec<MibNode>,
    next_id: u64,
}

impl MibTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under an OID prefix.
    ///
    /// Fails with [`Error::DuplicateRegistration`] if the exact prefix
    /// is already registered. Nested prefixes are allowed; resolution
    /// picks the deepest match.
    pub fn register(&mut self, prefix: Oid, handler: Arc<dyn MibHandler>) -> Result<RegistrationId> {
        if prefix.is_empty() {
            return Err(Error::config("registration prefix must not be empty"));
        }
        prefix.validate_length()?;

        if self.nodes.iter().any(|n| n.prefix == prefix) {
            return Err(Error::DuplicateRegistration { prefix }.boxed());
        }

        let id = RegistrationId(self.next_id);
        self.next_id += 1;

        let pos = self
            .nodes
            .partition_point(|n| n.prefix < prefix);
        self.nodes.insert(
            pos,
            MibNode {
                id,
                prefix,
                handler,
            },
        );

        Ok(id)
    }

    /// Remove a registration. Returns false if the handle is unknown.
    pub fn unregister(&mut self, id: RegistrationId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        self.nodes.len() != before
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no registrations.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolve an instance OID to its handler and index suffix.
    ///
    /// Picks the deepest registered prefix covering `oid`.
    pub fn resolve<'a>(&self, oid: &'a Oid) -> Option<(&Arc<dyn MibHandler>, &'a [u32])> {
        self.nodes
            .iter()
            .filter_map(|n| oid.suffix(&n.prefix).map(|index| (n, index)))
            .max_by_key(|(n, _)| n.prefix.len())
            .map(|(n, index)| (&n.handler, index))
    }

    /// Read the value at `oid`.
    ///
    /// `Ok(None)` means no registered node covers the OID (noSuchObject
    /// territory); a covered-but-missing instance surfaces as the
    /// handler's `Err(NoSuchName)`.
    pub fn get(&self, oid: &Oid) -> std::result::Result<Option<Value>, ErrorStatus> {
        match self.resolve(oid) {
            Some((handler, index)) => handler.get(index).map(Some),
            None => Ok(None),
        }
    }

    /// Write the value at `oid`, returning the stored value.
    ///
    /// `Ok(None)` means no registered node covers the OID.
    pub fn set(
        &self,
        oid: &Oid,
        value: &Value,
    ) -> std::result::Result<Option<Value>, ErrorStatus> {
        match self.resolve(oid) {
            Some((handler, index)) => handler.set(index, value).map(Some),
            None => Ok(None),
        }
    }

    /// The smallest registered instance strictly greater than `oid`.
    ///
    /// Deterministic: an unchanged tree always yields the same answer
    /// for the same request. Returns `None` at the end of the tree.
    pub fn next_after(&self, oid: &Oid) -> Option<(Oid, Value)> {
        let mut best: Option<(Oid, Value)> = None;

        for node in &self.nodes {
            let candidate = if let Some(index) = oid.suffix(&node.prefix) {
                // Request inside (or at) this node; empty suffix means
                // the node OID itself, whose successor is the first
                // instance
                let index = if index.is_empty() { None } else { Some(index) };
                node.handler.next(index)
            } else if *oid < node.prefix {
                node.handler.next(None)
            } else {
                continue;
            };

            if let Some((suffix, value)) = candidate {
                let full = node.prefix.concat(suffix.arcs());
                if full > *oid {
                    match &best {
                        Some((best_oid, _)) if *best_oid <= full => {}
                        _ => best = Some((full, value)),
                    }
                }
            }
        }

        best
    }
}
