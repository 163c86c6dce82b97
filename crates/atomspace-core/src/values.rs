//! # Value Objects
//!
//! Opaque payloads attached to stored atoms:
//! - `TruthValue`: graded belief (strength, confidence), both in `[0, 1]`
//! - `AttentionValue`: short- and long-term importance
//!
//! Neither takes part in atom identity. When a structurally equal atom is
//! inserted a second time, the table combines the stored and the supplied
//! values through a [`MergePolicy`].

use crate::AtomSpaceError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TRUTH VALUE
// =============================================================================

/// Graded belief attached to an atom.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TruthValue {
    strength: f32,
    confidence: f32,
}

impl TruthValue {
    /// Create a truth value, rejecting NaN and values outside `[0, 1]`.
    pub fn new(strength: f32, confidence: f32) -> Result<Self, AtomSpaceError> {
        let valid = |x: f32| (0.0..=1.0).contains(&x);
        if valid(strength) && valid(confidence) {
            Ok(Self {
                strength,
                confidence,
            })
        } else {
            Err(AtomSpaceError::InvalidTruthValue {
                strength,
                confidence,
            })
        }
    }

    /// Create a truth value, clamping both components into `[0, 1]`.
    /// NaN becomes 0.
    #[must_use]
    pub fn clamped(strength: f32, confidence: f32) -> Self {
        let clamp = |x: f32| if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
        Self {
            strength: clamp(strength),
            confidence: clamp(confidence),
        }
    }

    /// Full strength, full confidence.
    #[must_use]
    pub const fn certain() -> Self {
        Self {
            strength: 1.0,
            confidence: 1.0,
        }
    }

    #[must_use]
    pub const fn strength(&self) -> f32 {
        self.strength
    }

    #[must_use]
    pub const fn confidence(&self) -> f32 {
        self.confidence
    }
}

impl PartialEq for TruthValue {
    fn eq(&self, other: &Self) -> bool {
        self.strength.to_bits() == other.strength.to_bits()
            && self.confidence.to_bits() == other.confidence.to_bits()
    }
}

impl Eq for TruthValue {}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.strength, self.confidence)
    }
}

// =============================================================================
// ATTENTION VALUE
// =============================================================================

/// Short-term (STI) and long-term (LTI) importance.
///
/// Stored and rendered only; allocation and decay live outside the store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct AttentionValue {
    pub sti: i16,
    pub lti: i16,
}

impl AttentionValue {
    #[must_use]
    pub const fn new(sti: i16, lti: i16) -> Self {
        Self { sti, lti }
    }
}

// =============================================================================
// MERGE POLICY
// =============================================================================

/// Combination applied when a duplicate atom is re-inserted with values.
///
/// Only values the caller actually supplied are merged; omitted values leave
/// the stored ones untouched.
pub trait MergePolicy: Send + Sync + fmt::Debug {
    /// Combine the stored truth value with a newly supplied one.
    fn merge_truth(&self, old: TruthValue, new: TruthValue) -> TruthValue;

    /// Combine the stored attention value with a newly supplied one.
    fn merge_attention(&self, old: AttentionValue, new: AttentionValue) -> AttentionValue;
}

/// Built-in merge policies, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// The newly supplied values win.
    Replace,
    /// The truth value with the higher confidence wins (ties keep the stored
    /// one); attention is replaced.
    #[default]
    MaxConfidence,
    /// The stored values are never changed by re-insertion.
    KeepExisting,
}

impl MergePolicy for MergeStrategy {
    fn merge_truth(&self, old: TruthValue, new: TruthValue) -> TruthValue {
        match self {
            Self::Replace => new,
            Self::MaxConfidence => {
                if new.confidence > old.confidence {
                    new
                } else {
                    old
                }
            }
            Self::KeepExisting => old,
        }
    }

    fn merge_attention(&self, old: AttentionValue, new: AttentionValue) -> AttentionValue {
        match self {
            Self::Replace | Self::MaxConfidence => new,
            Self::KeepExisting => old,
        }
    }
}

/// Merge policy built from two closures.
pub struct FnMerge<T, A> {
    truth: T,
    attention: A,
}

impl<T, A> FnMerge<T, A>
where
    T: Fn(TruthValue, TruthValue) -> TruthValue + Send + Sync,
    A: Fn(AttentionValue, AttentionValue) -> AttentionValue + Send + Sync,
{
    pub fn new(truth: T, attention: A) -> Self {
        Self { truth, attention }
    }
}

impl<T, A> fmt::Debug for FnMerge<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnMerge")
    }
}

impl<T, A> MergePolicy for FnMerge<T, A>
where
    T: Fn(TruthValue, TruthValue) -> TruthValue + Send + Sync,
    A: Fn(AttentionValue, AttentionValue) -> AttentionValue + Send + Sync,
{
    fn merge_truth(&self, old: TruthValue, new: TruthValue) -> TruthValue {
        (self.truth)(old, new)
    }

    fn merge_attention(&self, old: AttentionValue, new: AttentionValue) -> AttentionValue {
        (self.attention)(old, new)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tv(s: f32, c: f32) -> TruthValue {
        TruthValue::new(s, c).expect("valid tv")
    }

    #[test]
    fn truth_value_rejects_out_of_range() {
        assert!(TruthValue::new(1.5, 0.5).is_err());
        assert!(TruthValue::new(0.5, -0.1).is_err());
        assert!(TruthValue::new(f32::NAN, 0.5).is_err());
        assert!(TruthValue::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn truth_value_clamps() {
        let clamped = TruthValue::clamped(1.5, f32::NAN);
        assert_eq!(clamped, tv(1.0, 0.0));
    }

    #[test]
    fn truth_value_rendering() {
        assert_eq!(tv(0.8, 0.25).to_string(), "0.800000,0.250000");
        assert_eq!(TruthValue::default().to_string(), "0.000000,0.000000");
    }

    #[test]
    fn truth_value_equality() {
        assert_eq!(tv(0.5, 0.5), tv(0.5, 0.5));
        assert_ne!(tv(0.5, 0.5), tv(0.5, 0.6));
    }

    #[test]
    fn max_confidence_keeps_more_confident() {
        let policy = MergeStrategy::MaxConfidence;
        let old = tv(0.9, 0.8);
        let new = tv(0.1, 0.3);
        assert_eq!(policy.merge_truth(old, new), old);
        assert_eq!(policy.merge_truth(new, old), old);
        // Tie keeps the stored value.
        assert_eq!(policy.merge_truth(tv(0.2, 0.5), tv(0.7, 0.5)), tv(0.2, 0.5));
    }

    #[test]
    fn replace_and_keep_existing() {
        let old = AttentionValue::new(10, 2);
        let new = AttentionValue::new(-5, 7);
        assert_eq!(MergeStrategy::Replace.merge_attention(old, new), new);
        assert_eq!(MergeStrategy::KeepExisting.merge_attention(old, new), old);
        assert_eq!(
            MergeStrategy::Replace.merge_truth(tv(0.1, 0.9), tv(0.2, 0.1)),
            tv(0.2, 0.1)
        );
    }

    #[test]
    fn closure_policy() {
        let policy = FnMerge::new(
            |old: TruthValue, _new: TruthValue| old,
            |old: AttentionValue, new: AttentionValue| AttentionValue::new(old.sti.max(new.sti), new.lti),
        );
        let merged = policy.merge_attention(AttentionValue::new(4, 1), AttentionValue::new(2, 9));
        assert_eq!(merged, AttentionValue::new(4, 9));
    }
}
