//! # Core Type Definitions
//!
//! This module contains the small value types shared by every layer of the
//! AtomSpace:
//! - Identifiers (`Handle`, `Type`)
//! - Atom annotations (`AtomFlags`)
//! - Error types (`AtomSpaceError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so that sets and maps built from them
//! iterate in a reproducible order.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque, stable identifier for exactly one atom inside one store.
///
/// Handles are allocated monotonically and never reused, so a handle held by
/// a collaborator can never silently start pointing at a different atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Handle(pub u64);

impl Handle {
    /// Get the raw handle value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer tag naming an atom type in a `TypeRegistry`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Type(pub u16);

impl Type {
    /// Get the raw tag value.
    #[must_use]
    pub const fn value(self) -> u16 {
        self.0
    }
}

// =============================================================================
// FLAGS
// =============================================================================

/// Boolean annotations carried by a stored atom.
///
/// Flags never take part in atom identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct AtomFlags(u8);

impl AtomFlags {
    /// No flag set.
    pub const NONE: Self = Self(0);
    /// The atom records a hypothesis rather than an asserted fact.
    pub const HYPOTHETICAL: Self = Self(0b0000_0001);
    /// General-purpose mark used by collaborators during graph walks.
    pub const MARKED: Self = Self(0b0000_0010);

    /// Check whether every bit of `flag` is set.
    #[must_use]
    pub const fn contains(self, flag: Self) -> bool {
        self.0 & flag.0 == flag.0
    }

    /// Return a copy with `flag` set or cleared.
    #[must_use]
    pub const fn with(self, flag: Self, on: bool) -> Self {
        if on {
            Self(self.0 | flag.0)
        } else {
            Self(self.0 & !flag.0)
        }
    }

    /// Raw bit pattern.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the AtomSpace.
///
/// Every structural error is reported before any mutation takes place, so a
/// failed call always leaves the table exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtomSpaceError {
    /// The type tag is not registered.
    #[error("Unknown type: {0:?}")]
    UnknownType(Type),

    /// The type exists but cannot play the requested role (node vs link).
    #[error("Invalid type '{name}' for a {role}")]
    InvalidType { name: String, role: &'static str },

    /// A type name was re-registered with a different parent set.
    #[error("Type '{0}' is already registered with different parents")]
    TypeConflict(String),

    /// A link named an outgoing member that is not in this table.
    #[error("Dangling reference: {0:?} is not in this table")]
    DanglingReference(Handle),

    /// Non-recursive removal of an atom that is still referenced.
    #[error("Atom {handle:?} has {count} dependent link(s)")]
    HasDependents { handle: Handle, count: usize },

    /// Attempt to rename or re-type an atom already stored in a table.
    #[error("Cannot change the identity of stored atom {0:?}")]
    ImmutableIdentity(Handle),

    /// The handle does not name an atom in this table.
    #[error("Atom not found: {0:?}")]
    AtomNotFound(Handle),

    /// Strength or confidence outside `[0, 1]` (or NaN).
    #[error("Invalid truth value: strength={strength}, confidence={confidence}")]
    InvalidTruthValue { strength: f32, confidence: f32 },

    /// The pattern cannot be searched.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// The pattern nests deeper than the comparison depth bound.
    #[error("Pattern deeper than max_depth {max_depth}")]
    PatternTooDeep { max_depth: usize },

    /// A configuration value could not be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_set_and_clear() {
        let flags = AtomFlags::NONE.with(AtomFlags::HYPOTHETICAL, true);
        assert!(flags.contains(AtomFlags::HYPOTHETICAL));
        assert!(!flags.contains(AtomFlags::MARKED));

        let flags = flags.with(AtomFlags::MARKED, true);
        assert_eq!(flags.bits(), 0b11);

        let flags = flags.with(AtomFlags::HYPOTHETICAL, false);
        assert!(!flags.contains(AtomFlags::HYPOTHETICAL));
        assert!(flags.contains(AtomFlags::MARKED));
    }

    #[test]
    fn handles_order_by_value() {
        let mut handles = vec![Handle(3), Handle(1), Handle(2)];
        handles.sort();
        assert_eq!(handles, vec![Handle(1), Handle(2), Handle(3)]);
        assert_eq!(Handle(7).to_string(), "7");
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = AtomSpaceError::HasDependents {
            handle: Handle(4),
            count: 2,
        };
        assert_eq!(err.to_string(), "Atom Handle(4) has 2 dependent link(s)");
    }
}
