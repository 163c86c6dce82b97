//! # atomspace-core
//!
//! Hypergraph knowledge store with structural pattern matching.
//!
//! Knowledge is held as *atoms*: named **nodes** and **links** over ordered
//! sequences of other atoms. Every atom carries a type from a shared,
//! append-only type hierarchy, a truth value and an attention value.
//!
//! ## Layers
//!
//! - `registry`: the type hierarchy (`is_a` is a single set lookup)
//! - `atom`: structural identity; two atoms are equal iff type and
//!   name/outgoing are equal
//! - `values`: truth/attention values and the merge policy applied when a
//!   duplicate is re-inserted
//! - `table`: the hash-consed store with incoming-set index
//! - `pattern` / `matcher`: clause patterns with variables and the
//!   backtracking search that binds them
//! - `space`: the thread-safe facade used by callers
//!
//! ## Architectural Constraints
//!
//! - Handles are opaque, allocated monotonically and never reused
//! - Links refer to members by handle only; nothing is reference-counted
//! - Every search is bounded (depth, steps, cancellation)
//! - NO async, NO network, NO persistence

// =============================================================================
// MODULES
// =============================================================================

pub mod atom;
pub mod config;
pub mod follow;
pub mod matcher;
pub mod pattern;
pub mod primitives;
pub mod registry;
pub mod space;
pub mod table;
pub mod types;
pub mod values;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{AtomFlags, AtomSpaceError, Handle, Type};

// =============================================================================
// RE-EXPORTS: Store
// =============================================================================

pub use atom::{Atom, AtomKind};
pub use config::SpaceConfig;
pub use registry::TypeRegistry;
pub use space::AtomSpace;
pub use table::{AtomRecord, AtomTable};
pub use values::{AttentionValue, FnMerge, MergePolicy, MergeStrategy, TruthValue};

// =============================================================================
// RE-EXPORTS: Matching
// =============================================================================

pub use follow::{backtrack_binary_link, follow_binary_link, foreach_incoming, reached_by, reaches};
pub use matcher::{
    Binding, CancelFlag, Comparison, ConceptMatch, ExactMatch, InheritanceConcepts, MatchBudget,
    MatchMode, MatchOutcome, PatternMatcher,
};
pub use pattern::{NormalizedPattern, Pattern, Term};
