//! Community-based access control.
//!
//! Each accepted community carries an ordered list of prefix rules.
//! Lookup scans rules in declaration order and the first matching
//! prefix wins; a trailing catch-all (no prefix) decides everything the
//! explicit rules miss, denying by default.

use bytes::Bytes;
use subtle::ConstantTimeEq;

use crate::oid::Oid;

/// Access level granted by a permission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No access at all
    None,
    /// GET/GETNEXT/GETBULK only
    ReadOnly,
    /// Reads and SET
    ReadWrite,
}

impl Access {
    fn allows(self, write: bool) -> bool {
        match self {
            Access::None => false,
            Access::ReadOnly => !write,
            Access::ReadWrite => true,
        }
    }
}

/// One permission rule: an OID prefix and the access it grants.
#[derive(Debug, Clone)]
pub struct PermRule {
    /// Prefix this rule covers; `None` is the catch-all.
    pub prefix: Option<Oid>,
    /// Access granted under the prefix.
    pub access: Access,
}

impl PermRule {
    /// Rule covering one OID subtree.
    pub fn subtree(prefix: Oid, access: Access) -> Self {
        Self {
            prefix: Some(prefix),
            access,
        }
    }

    /// Catch-all rule matching every OID.
    pub fn catch_all(access: Access) -> Self {
        Self {
            prefix: None,
            access,
        }
    }

    fn matches(&self, oid: &Oid) -> bool {
        match &self.prefix {
            Some(prefix) => oid.starts_with(prefix),
            None => true,
        }
    }
}

/// An accepted community and its ordered rules.
#[derive(Debug, Clone)]
pub struct Community {
    name: Bytes,
    rules: Vec<PermRule>,
}

impl Community {
    /// Create a community with the given rules.
    ///
    /// Appends a deny catch-all if the rule list has none, so an OID
    /// matching no explicit rule is always refused.
    pub fn new(name: impl Into<Bytes>, mut rules: Vec<PermRule>) -> Self {
        if !rules.iter().any(|r| r.prefix.is_none()) {
            rules.push(PermRule::catch_all(Access::None));
        }
        Self {
            name: name.into(),
            rules,
        }
    }

    /// Community with read access to the whole tree.
    pub fn read_only(name: impl Into<Bytes>) -> Self {
        Self::new(name, vec![PermRule::catch_all(Access::ReadOnly)])
    }

    /// Community with read-write access to the whole tree.
    pub fn read_write(name: impl Into<Bytes>) -> Self {
        Self::new(name, vec![PermRule::catch_all(Access::ReadWrite)])
    }

    /// The community name.
    pub fn name(&self) -> &Bytes {
        &self.name
    }

    /// Whether this community may perform the operation on `oid`.
    pub fn allows(&self, oid: &Oid, write: bool) -> bool {
        // First matching rule wins
        self.rules
            .iter()
            .find(|r| r.matches(oid))
            .is_some_and(|r| r.access.allows(write))
    }
}

/// The agent's community table.
#[derive(Debug, Clone, Default)]
pub struct AccessTable {
    communities: Vec<Community>,
}

impl AccessTable {
    /// Create an empty table, which rejects every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a community.
    pub fn add(&mut self, community: Community) {
        self.communities.push(community);
    }

    /// Whether any community is configured.
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Authenticate a community string.
    ///
    /// Compares against every configured community in constant time,
    /// without early exit, so response timing does not leak which
    /// prefix of a guessed name matched.
    pub fn authenticate(&self, name: &[u8]) -> Option<&Community> {
        let mut found: Option<&Community> = None;
        for community in &self.communities {
            if community.name.len() == name.len()
                && bool::from(community.name.as_ref().ct_eq(name))
                && found.is_none()
            {
                found = Some(community);
            }
        }
        found
    }

    /// Check whether `name` may perform the operation on `oid`.
    pub fn check(&self, name: &[u8], oid: &Oid, write: bool) -> bool {
        self.authenticate(name)
            .is_some_and(|c| c.allows(oid, write))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    fn table() -> AccessTable {
        let mut table = AccessTable::new();
        table.add(Community::new(
            &b"public"[..],
            vec![PermRule::subtree(
                oid!(1, 3, 6, 1, 4, 1, 46410),
                Access::ReadOnly,
            )],
        ));
        table.add(Community::new(
            &b"private"[..],
            vec![
                PermRule::subtree(oid!(1, 3, 6, 1, 4, 1, 46410, 2), Access::ReadOnly),
                PermRule::subtree(oid!(1, 3, 6, 1, 4, 1, 46410), Access::ReadWrite),
            ],
        ));
        table
    }

    #[test]
    fn authenticate_exact_name_only() {
        let table = table();
        assert!(table.authenticate(b"public").is_some());
        assert!(table.authenticate(b"publi").is_none());
        assert!(table.authenticate(b"public ").is_none());
        assert!(table.authenticate(b"Public").is_none());
        assert!(table.authenticate(b"").is_none());
    }

    #[test]
    fn empty_table_rejects_all() {
        let table = AccessTable::new();
        assert!(table.is_empty());
        assert!(table.authenticate(b"public").is_none());
        assert!(!table.check(b"public", &oid!(1, 3, 6, 1), false));
    }

    #[test]
    fn read_only_prefix_rejects_write() {
        let table = table();
        let leaf = oid!(1, 3, 6, 1, 4, 1, 46410, 0);

        assert!(table.check(b"public", &leaf, false));
        assert!(!table.check(b"public", &leaf, true));
    }

    #[test]
    fn first_matching_rule_wins() {
        let table = table();
        // private's first rule makes the .2 subtree read-only even
        // though the broader second rule would grant writes
        let in_sub = oid!(1, 3, 6, 1, 4, 1, 46410, 2, 1);
        let outside_sub = oid!(1, 3, 6, 1, 4, 1, 46410, 3);

        assert!(table.check(b"private", &in_sub, false));
        assert!(!table.check(b"private", &in_sub, true));
        assert!(table.check(b"private", &outside_sub, true));
    }

    #[test]
    fn unmatched_oid_falls_to_deny_catch_all() {
        let table = table();
        let elsewhere = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);

        assert!(!table.check(b"public", &elsewhere, false));
        assert!(!table.check(b"private", &elsewhere, false));
    }

    #[test]
    fn explicit_catch_all_respected() {
        let mut table = AccessTable::new();
        table.add(Community::new(
            &b"monitor"[..],
            vec![
                PermRule::subtree(oid!(1, 3, 6, 1, 6), Access::None),
                PermRule::catch_all(Access::ReadOnly),
            ],
        ));

        assert!(!table.check(b"monitor", &oid!(1, 3, 6, 1, 6, 3, 1), false));
        assert!(table.check(b"monitor", &oid!(1, 3, 6, 1, 2, 1), false));
    }

    #[test]
    fn convenience_constructors() {
        let mut table = AccessTable::new();
        table.add(Community::read_only(&b"ro"[..]));
        table.add(Community::read_write(&b"rw"[..]));

        let oid = oid!(1, 3, 6, 1);
        assert!(table.check(b"ro", &oid, false));
        assert!(!table.check(b"ro", &oid, true));
        assert!(table.check(b"rw", &oid, true));
    }
}
