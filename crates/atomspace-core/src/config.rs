//! # Space Configuration
//!
//! Runtime knobs for an [`AtomSpace`](crate::AtomSpace): the value merge
//! strategy and the default search budget. Loading from files and the
//! environment lives in the binary; this type only carries and validates.

use crate::AtomSpaceError;
use crate::matcher::MatchBudget;
use crate::primitives::{DEFAULT_CONCEPT_HOPS, DEFAULT_MATCH_DEPTH, DEFAULT_MATCH_STEPS, MAX_MATCH_DEPTH};
use crate::values::MergeStrategy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    /// How supplied values combine with the existing ones on re-insertion.
    pub merge: MergeStrategy,
    /// Recursion bound for structural comparison.
    pub match_depth: usize,
    /// Candidate expansions allowed per search; `None` is unbounded.
    pub match_steps: Option<usize>,
    /// Inheritance hops honoured by the concept hook; `0` disables it.
    pub concept_hops: usize,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            merge: MergeStrategy::default(),
            match_depth: DEFAULT_MATCH_DEPTH,
            match_steps: Some(DEFAULT_MATCH_STEPS),
            concept_hops: 0,
        }
    }
}

impl SpaceConfig {
    /// Enable the inheritance concept hook with the default hop count.
    #[must_use]
    pub fn with_inheritance(mut self) -> Self {
        self.concept_hops = DEFAULT_CONCEPT_HOPS;
        self
    }

    pub fn validate(&self) -> Result<(), AtomSpaceError> {
        if self.match_depth == 0 || self.match_depth > MAX_MATCH_DEPTH {
            return Err(AtomSpaceError::Config(format!(
                "match_depth must be in 1..={MAX_MATCH_DEPTH}, got {}",
                self.match_depth
            )));
        }
        if self.match_steps == Some(0) {
            return Err(AtomSpaceError::Config(
                "match_steps must be positive (omit it for unbounded)".into(),
            ));
        }
        Ok(())
    }

    /// Budget used by searches that do not supply their own.
    #[must_use]
    pub fn budget(&self) -> MatchBudget {
        MatchBudget {
            max_depth: self.match_depth,
            max_steps: self.match_steps,
            cancel: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SpaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.merge, MergeStrategy::MaxConfidence);
        assert_eq!(config.budget().max_depth, DEFAULT_MATCH_DEPTH);
    }

    #[test]
    fn rejects_out_of_range_depth() {
        let mut config = SpaceConfig::default();
        config.match_depth = 0;
        assert!(matches!(config.validate(), Err(AtomSpaceError::Config(_))));
        config.match_depth = MAX_MATCH_DEPTH + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_steps() {
        let config = SpaceConfig {
            match_steps: Some(0),
            ..SpaceConfig::default()
        };
        assert!(config.validate().is_err());
        let unbounded = SpaceConfig {
            match_steps: None,
            ..SpaceConfig::default()
        };
        assert!(unbounded.validate().is_ok());
    }

    #[test]
    fn inheritance_toggle() {
        assert_eq!(SpaceConfig::default().with_inheritance().concept_hops, DEFAULT_CONCEPT_HOPS);
    }
}
