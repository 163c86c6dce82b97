//! # Type Registry
//!
//! The atom type hierarchy: an append-only directed acyclic "is-a" relation
//! over `Type` tags, with multiple inheritance.
//!
//! A registry is built by value (`TypeRegistry::new` then `register_type`),
//! then frozen behind an `Arc` and shared read-only by every table that uses
//! it. Readers never take a lock. The process-wide standard hierarchy is
//! available through [`TypeRegistry::standard`].
//!
//! Parents must be registered before their children, so the hierarchy cannot
//! contain a cycle. Each entry stores its full ancestor set, which makes
//! `is_a` a single set lookup.

use crate::{AtomSpaceError, Type};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, LazyLock};

// =============================================================================
// BUILT-IN TYPES
// =============================================================================

pub const ATOM: Type = Type(0);
pub const NODE: Type = Type(1);
pub const LINK: Type = Type(2);

pub const CONCEPT_NODE: Type = Type(3);
pub const PREDICATE_NODE: Type = Type(4);
pub const WORD_NODE: Type = Type(5);
pub const NUMBER_NODE: Type = Type(6);
/// Reserved type for pattern variables.
pub const VARIABLE_NODE: Type = Type(7);

pub const ORDERED_LINK: Type = Type(8);
/// Kept for hierarchy compatibility only. Member order is still part of a
/// link's identity and of matching, so `AndLink(a, b)` and `AndLink(b, a)`
/// are distinct atoms.
pub const UNORDERED_LINK: Type = Type(9);
pub const INHERITANCE_LINK: Type = Type(10);
pub const EVALUATION_LINK: Type = Type(11);
pub const IMPLICATION_LINK: Type = Type(12);
pub const LIST_LINK: Type = Type(13);
pub const MEMBER_LINK: Type = Type(14);
pub const PARSE_LINK: Type = Type(15);
pub const WORD_SENSE_LINK: Type = Type(16);
pub const AND_LINK: Type = Type(17);
pub const OR_LINK: Type = Type(18);
pub const SIMILARITY_LINK: Type = Type(19);
/// Root of pure annotation links; pattern normalization drops these clauses.
pub const ANNOTATION_LINK: Type = Type(20);

/// Built-in hierarchy, in tag order. Index `i` is `Type(i)`.
const BUILTIN_TYPES: &[(&str, &[Type])] = &[
    ("Atom", &[]),
    ("Node", &[ATOM]),
    ("Link", &[ATOM]),
    ("ConceptNode", &[NODE]),
    ("PredicateNode", &[NODE]),
    ("WordNode", &[NODE]),
    ("NumberNode", &[NODE]),
    ("VariableNode", &[NODE]),
    ("OrderedLink", &[LINK]),
    ("UnorderedLink", &[LINK]),
    ("InheritanceLink", &[ORDERED_LINK]),
    ("EvaluationLink", &[ORDERED_LINK]),
    ("ImplicationLink", &[ORDERED_LINK]),
    ("ListLink", &[ORDERED_LINK]),
    ("MemberLink", &[ORDERED_LINK]),
    ("ParseLink", &[ORDERED_LINK]),
    ("WordSenseLink", &[ORDERED_LINK]),
    ("AndLink", &[UNORDERED_LINK]),
    ("OrLink", &[UNORDERED_LINK]),
    ("SimilarityLink", &[UNORDERED_LINK]),
    ("AnnotationLink", &[LINK]),
];

static STANDARD: LazyLock<Arc<TypeRegistry>> = LazyLock::new(|| Arc::new(TypeRegistry::new()));

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone)]
struct TypeInfo {
    name: String,
    parents: BTreeSet<Type>,
    /// Every type this one is-a, itself included.
    ancestors: BTreeSet<Type>,
}

/// Append-only atom type hierarchy.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: Vec<TypeInfo>,
    by_name: BTreeMap<String, Type>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a registry holding the built-in hierarchy.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::with_capacity(BUILTIN_TYPES.len()),
            by_name: BTreeMap::new(),
        };
        for (name, parents) in BUILTIN_TYPES {
            registry.push(name, parents.iter().copied().collect());
        }
        registry
    }

    /// The shared process-wide registry with only the built-in types.
    #[must_use]
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD)
    }

    /// Register a new type under the given parents.
    ///
    /// Registering an existing name with the same parents returns the
    /// existing tag. A different parent set is a `TypeConflict`.
    pub fn register_type(&mut self, name: &str, parents: &[Type]) -> Result<Type, AtomSpaceError> {
        let parents: BTreeSet<Type> = parents.iter().copied().collect();
        if let Some(&existing) = self.by_name.get(name) {
            let same = self
                .info(existing)
                .is_some_and(|info| info.parents == parents);
            return if same {
                Ok(existing)
            } else {
                Err(AtomSpaceError::TypeConflict(name.to_string()))
            };
        }

        if name.is_empty() {
            return Err(AtomSpaceError::Config("type name must not be empty".into()));
        }
        if let Some(&unknown) = parents.iter().find(|p| !self.contains(**p)) {
            return Err(AtomSpaceError::UnknownType(unknown));
        }
        if self.types.len() > usize::from(u16::MAX) {
            return Err(AtomSpaceError::Config("type table is full".into()));
        }

        let tag = self.push(name, parents);
        tracing::debug!(name, tag = tag.0, "registered atom type");
        Ok(tag)
    }

    /// Append without validation. Parents must already be registered.
    fn push(&mut self, name: &str, parents: BTreeSet<Type>) -> Type {
        let tag = Type(self.types.len() as u16);
        let mut ancestors = BTreeSet::new();
        ancestors.insert(tag);
        for parent in &parents {
            if let Some(info) = self.info(*parent) {
                ancestors.extend(info.ancestors.iter().copied());
            }
        }
        self.types.push(TypeInfo {
            name: name.to_string(),
            parents,
            ancestors,
        });
        self.by_name.insert(name.to_string(), tag);
        tag
    }

    fn info(&self, t: Type) -> Option<&TypeInfo> {
        self.types.get(usize::from(t.0))
    }

    /// Check whether the tag is registered.
    #[must_use]
    pub fn contains(&self, t: Type) -> bool {
        usize::from(t.0) < self.types.len()
    }

    /// Reflexive, transitive is-a test. Unknown types are never is-a anything.
    #[must_use]
    pub fn is_a(&self, t: Type, ancestor: Type) -> bool {
        self.info(t)
            .is_some_and(|info| info.ancestors.contains(&ancestor))
    }

    /// Check whether the type may label a node.
    #[must_use]
    pub fn is_node(&self, t: Type) -> bool {
        self.is_a(t, NODE)
    }

    /// Check whether the type may label a link.
    #[must_use]
    pub fn is_link(&self, t: Type) -> bool {
        self.is_a(t, LINK)
    }

    /// Verify that `t` is registered and descends from `root`.
    ///
    /// `role` names the required role in the error message.
    pub fn require(&self, t: Type, root: Type, role: &'static str) -> Result<(), AtomSpaceError> {
        let Some(info) = self.info(t) else {
            return Err(AtomSpaceError::UnknownType(t));
        };
        if info.ancestors.contains(&root) {
            Ok(())
        } else {
            Err(AtomSpaceError::InvalidType {
                name: info.name.clone(),
                role,
            })
        }
    }

    /// Name of a registered type.
    #[must_use]
    pub fn type_name(&self, t: Type) -> Option<&str> {
        self.info(t).map(|info| info.name.as_str())
    }

    /// Look a type up by name.
    #[must_use]
    pub fn type_by_name(&self, name: &str) -> Option<Type> {
        self.by_name.get(name).copied()
    }

    /// Direct parents of a registered type.
    #[must_use]
    pub fn parents(&self, t: Type) -> Vec<Type> {
        self.info(t)
            .map(|info| info.parents.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every registered type that is-a `t`, `t` included, in tag order.
    #[must_use]
    pub fn subtypes(&self, t: Type) -> Vec<Type> {
        self.types
            .iter()
            .enumerate()
            .filter(|(_, info)| info.ancestors.contains(&t))
            .map(|(i, _)| Type(i as u16))
            .collect()
    }

    /// All registered types in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (Type, &str)> + '_ {
        self.types
            .iter()
            .enumerate()
            .map(|(i, info)| (Type(i as u16), info.name.as_str()))
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Always false: the built-in hierarchy is present from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
