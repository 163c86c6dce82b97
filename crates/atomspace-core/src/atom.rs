//! # Atom Identity Layer
//!
//! The two atom variants and their equality/hash contract.
//!
//! An [`Atom`] is the structural part of a stored atom: its type plus either
//! a name (node) or an ordered outgoing sequence of handles (link). Two atoms
//! are equal iff they have the same type and the same name / outgoing
//! sequence. Handles and attached values play no role in identity.
//!
//! The `Hash` implementation feeds the type tag first, then the name or each
//! member handle in order, so equal atoms always hash equally.

use crate::registry::{LINK, NODE, TypeRegistry};
use crate::{AtomSpaceError, Handle, Type};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Structural kind of an atom. The set of kinds is closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomKind {
    /// Terminal atom identified by its name.
    Node { name: String },
    /// Composite atom identified by its ordered members.
    Link { outgoing: Vec<Handle> },
}

/// Structural identity of an atom: `(type, name)` or `(type, outgoing)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Atom {
    atom_type: Type,
    kind: AtomKind,
}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.atom_type.hash(state);
        match &self.kind {
            AtomKind::Node { name } => name.hash(state),
            AtomKind::Link { outgoing } => {
                for member in outgoing {
                    member.hash(state);
                }
            }
        }
    }
}

impl Atom {
    /// Build a node, checking that `atom_type` descends from `Node`.
    pub fn node(
        registry: &TypeRegistry,
        atom_type: Type,
        name: impl Into<String>,
    ) -> Result<Self, AtomSpaceError> {
        registry.require(atom_type, NODE, "node")?;
        Ok(Self {
            atom_type,
            kind: AtomKind::Node { name: name.into() },
        })
    }

    /// Build a link, checking that `atom_type` descends from `Link`.
    pub fn link(
        registry: &TypeRegistry,
        atom_type: Type,
        outgoing: Vec<Handle>,
    ) -> Result<Self, AtomSpaceError> {
        registry.require(atom_type, LINK, "link")?;
        Ok(Self {
            atom_type,
            kind: AtomKind::Link { outgoing },
        })
    }

    #[must_use]
    pub fn atom_type(&self) -> Type {
        self.atom_type
    }

    #[must_use]
    pub fn kind(&self) -> &AtomKind {
        &self.kind
    }

    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self.kind, AtomKind::Node { .. })
    }

    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self.kind, AtomKind::Link { .. })
    }

    /// Node name, `None` for links.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            AtomKind::Node { name } => Some(name),
            AtomKind::Link { .. } => None,
        }
    }

    /// Link members in order; empty for nodes.
    #[must_use]
    pub fn outgoing(&self) -> &[Handle] {
        match &self.kind {
            AtomKind::Node { .. } => &[],
            AtomKind::Link { outgoing } => outgoing,
        }
    }

    /// Number of members (0 for nodes).
    #[must_use]
    pub fn arity(&self) -> usize {
        self.outgoing().len()
    }

    /// Rename a detached node.
    ///
    /// Atoms inside a table are never reachable mutably, so this can only
    /// touch atoms that are not yet stored. Links cannot be renamed.
    pub fn set_name(&mut self, new_name: impl Into<String>) -> Result<(), AtomSpaceError> {
        match &mut self.kind {
            AtomKind::Node { name } => {
                *name = new_name.into();
                Ok(())
            }
            AtomKind::Link { .. } => Err(AtomSpaceError::InvalidType {
                name: "Link".to_string(),
                role: "named atom",
            }),
        }
    }

    /// Deterministic 64-bit digest consistent with `Eq`.
    #[must_use]
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CONCEPT_NODE, INHERITANCE_LINK, LIST_LINK, PREDICATE_NODE};

    #[test]
    fn node_requires_node_type() {
        let registry = TypeRegistry::new();
        assert!(Atom::node(&registry, CONCEPT_NODE, "cat").is_ok());
        let err = Atom::node(&registry, LIST_LINK, "cat");
        assert!(matches!(err, Err(AtomSpaceError::InvalidType { role: "node", .. })));
    }

    #[test]
    fn link_requires_link_type() {
        let registry = TypeRegistry::new();
        assert!(Atom::link(&registry, LIST_LINK, vec![Handle(1)]).is_ok());
        let err = Atom::link(&registry, CONCEPT_NODE, vec![]);
        assert!(matches!(err, Err(AtomSpaceError::InvalidType { role: "link", .. })));
        let err = Atom::link(&registry, Type(999), vec![]);
        assert_eq!(err, Err(AtomSpaceError::UnknownType(Type(999))));
    }

    #[test]
    fn equality_is_structural() {
        let registry = TypeRegistry::new();
        let a = Atom::node(&registry, CONCEPT_NODE, "cat").expect("a");
        let b = Atom::node(&registry, CONCEPT_NODE, "cat").expect("b");
        let c = Atom::node(&registry, PREDICATE_NODE, "cat").expect("c");
        assert_eq!(a, b);
        assert_eq!(a.structural_hash(), b.structural_hash());
        assert_ne!(a, c);
    }

    #[test]
    fn link_order_is_identity() {
        let registry = TypeRegistry::new();
        let ab = Atom::link(&registry, INHERITANCE_LINK, vec![Handle(1), Handle(2)]).expect("ab");
        let ba = Atom::link(&registry, INHERITANCE_LINK, vec![Handle(2), Handle(1)]).expect("ba");
        let ab2 = Atom::link(&registry, INHERITANCE_LINK, vec![Handle(1), Handle(2)]).expect("ab2");
        assert_ne!(ab, ba);
        assert_eq!(ab, ab2);
        assert_eq!(ab.structural_hash(), ab2.structural_hash());
        assert_eq!(ab.arity(), 2);
        assert_eq!(ab.outgoing(), &[Handle(1), Handle(2)]);
    }

    #[test]
    fn detached_node_can_be_renamed() {
        let registry = TypeRegistry::new();
        let mut atom = Atom::node(&registry, CONCEPT_NODE, "cat").expect("node");
        atom.set_name("dog").expect("rename");
        assert_eq!(atom.name(), Some("dog"));

        let mut link = Atom::link(&registry, LIST_LINK, vec![]).expect("link");
        assert!(link.set_name("x").is_err());
    }
}
