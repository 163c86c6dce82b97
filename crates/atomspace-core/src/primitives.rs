//! # Primitives
//!
//! Hardcoded runtime constants for the AtomSpace core.
//!
//! These bound every search so that a query over an unbounded, cyclic graph
//! always terminates.

/// Default recursion bound for structural comparison in the matcher.
///
/// A pattern term nested deeper than this yields an inconclusive branch.
pub const DEFAULT_MATCH_DEPTH: usize = 64;

/// Hard ceiling accepted for a configured match depth.
pub const MAX_MATCH_DEPTH: usize = 4096;

/// Default number of inheritance hops explored by the inheritance concept
/// hook when it is enabled.
pub const DEFAULT_CONCEPT_HOPS: usize = 8;

/// Default step budget for a single search (`None` in configuration means
/// unbounded).
pub const DEFAULT_MATCH_STEPS: usize = 1_000_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_depth_within_ceiling() {
        assert!(DEFAULT_MATCH_DEPTH <= MAX_MATCH_DEPTH);
        assert!(DEFAULT_MATCH_DEPTH > 0);
    }
}
