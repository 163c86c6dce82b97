//! # AtomSpace
//!
//! Thread-safe facade over one [`AtomTable`].
//!
//! The table sits behind a single `parking_lot::RwLock`:
//! - every read, including a whole pattern search, holds one read guard and
//!   therefore sees one consistent snapshot;
//! - every write, including a recursive removal cascade, holds one write
//!   guard, so no other thread can observe a half-applied mutation.
//!
//! Writers are serialized. Readers proceed in parallel with each other.
//! Methods here return owned data so no guard outlives the call; use
//! [`AtomSpace::read`] or [`AtomSpace::write`] to batch several operations
//! under one guard.

use crate::config::SpaceConfig;
use crate::matcher::{
    ConceptMatch, ExactMatch, InheritanceConcepts, MatchBudget, MatchMode, MatchOutcome,
    PatternMatcher,
};
use crate::pattern::Pattern;
use crate::registry::{INHERITANCE_LINK, TypeRegistry};
use crate::table::{AtomRecord, AtomTable};
use crate::values::{AttentionValue, MergePolicy, TruthValue};
use crate::{AtomFlags, AtomSpaceError, Handle, Type};
use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::Arc;

#[derive(Debug)]
pub struct AtomSpace {
    table: RwLock<AtomTable>,
    config: SpaceConfig,
    concept: Box<dyn ConceptMatch>,
}

impl Default for AtomSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomSpace {
    /// Empty space over the standard types with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(TypeRegistry::standard(), SpaceConfig::default())
    }

    pub fn with_config(config: SpaceConfig) -> Result<Self, AtomSpaceError> {
        Self::with_registry(TypeRegistry::standard(), config)
    }

    /// Empty space over a custom (already complete) type registry.
    pub fn with_registry(
        registry: Arc<TypeRegistry>,
        config: SpaceConfig,
    ) -> Result<Self, AtomSpaceError> {
        config.validate()?;
        Ok(Self::build(registry, config))
    }

    fn build(registry: Arc<TypeRegistry>, config: SpaceConfig) -> Self {
        let concept: Box<dyn ConceptMatch> = if config.concept_hops == 0 {
            Box::new(ExactMatch)
        } else {
            Box::new(InheritanceConcepts {
                link_type: INHERITANCE_LINK,
                max_hops: config.concept_hops,
            })
        };
        tracing::debug!(
            types = registry.len(),
            merge = ?config.merge,
            concept_hops = config.concept_hops,
            "atomspace created"
        );
        Self {
            table: RwLock::new(AtomTable::with_parts(registry, Arc::new(config.merge))),
            config,
            concept,
        }
    }

    #[must_use]
    pub fn config(&self) -> &SpaceConfig {
        &self.config
    }

    /// Install a custom merge policy in place of the configured strategy.
    pub fn set_merge_policy(&self, merge: Arc<dyn MergePolicy>) {
        self.table.write().set_merge_policy(merge);
    }

    // -------------------------------------------------------------------------
    // Guards
    // -------------------------------------------------------------------------

    /// Hold a read snapshot across several lookups.
    pub fn read(&self) -> RwLockReadGuard<'_, AtomTable> {
        self.table.read()
    }

    /// Apply several mutations atomically under one write guard.
    pub fn write<R>(&self, f: impl FnOnce(&mut AtomTable) -> R) -> R {
        let mut table = self.table.write();
        f(&mut table)
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    pub fn add_node(
        &self,
        atom_type: Type,
        name: &str,
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) -> Result<Handle, AtomSpaceError> {
        self.table.write().add_node(atom_type, name, truth, attention)
    }

    pub fn add_link(
        &self,
        atom_type: Type,
        outgoing: &[Handle],
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) -> Result<Handle, AtomSpaceError> {
        self.table.write().add_link(atom_type, outgoing, truth, attention)
    }

    pub fn remove(&self, handle: Handle, recursive: bool) -> Result<bool, AtomSpaceError> {
        self.table.write().remove(handle, recursive)
    }

    pub fn set_truth_value(&self, handle: Handle, truth: TruthValue) -> Result<(), AtomSpaceError> {
        self.table.write().set_truth_value(handle, truth)
    }

    pub fn set_attention_value(
        &self,
        handle: Handle,
        attention: AttentionValue,
    ) -> Result<(), AtomSpaceError> {
        self.table.write().set_attention_value(handle, attention)
    }

    pub fn set_flag(&self, handle: Handle, flag: AtomFlags, on: bool) -> Result<(), AtomSpaceError> {
        self.table.write().set_flag(handle, flag, on)
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<AtomRecord> {
        self.table.read().get(handle).cloned()
    }

    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.table.read().contains(handle)
    }

    #[must_use]
    pub fn incoming(&self, handle: Handle) -> Vec<Handle> {
        self.table.read().incoming(handle)
    }

    #[must_use]
    pub fn incoming_by_type(&self, handle: Handle, link_type: Type, subclasses: bool) -> Vec<Handle> {
        self.table.read().incoming_by_type(handle, link_type, subclasses)
    }

    #[must_use]
    pub fn outgoing(&self, handle: Handle) -> Option<Vec<Handle>> {
        self.table.read().outgoing(handle).map(<[Handle]>::to_vec)
    }

    #[must_use]
    pub fn get_node(&self, atom_type: Type, name: &str) -> Option<Handle> {
        self.table.read().get_node(atom_type, name)
    }

    #[must_use]
    pub fn get_link(&self, atom_type: Type, outgoing: &[Handle]) -> Option<Handle> {
        self.table.read().get_link(atom_type, outgoing)
    }

    #[must_use]
    pub fn get_by_type(&self, atom_type: Type, subclasses: bool) -> Vec<Handle> {
        self.table.read().get_by_type(atom_type, subclasses)
    }

    #[must_use]
    pub fn get_by_name(&self, name: &str, atom_type: Type, subclasses: bool) -> Vec<Handle> {
        self.table.read().get_by_name(name, atom_type, subclasses)
    }

    #[must_use]
    pub fn count_by_type(&self, atom_type: Type, subclasses: bool) -> usize {
        self.table.read().count_by_type(atom_type, subclasses)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    #[must_use]
    pub fn describe(&self, handle: Handle) -> Option<String> {
        self.table.read().describe(handle)
    }

    #[must_use]
    pub fn describe_short(&self, handle: Handle) -> Option<String> {
        self.table.read().describe_short(handle)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Run a search with the configured budget.
    pub fn query(&self, pattern: &Pattern, mode: MatchMode) -> Result<MatchOutcome, AtomSpaceError> {
        self.query_with(pattern, mode, self.config.budget())
    }

    /// Run a search with an explicit budget (for example one carrying a
    /// cancellation flag shared with another thread).
    pub fn query_with(
        &self,
        pattern: &Pattern,
        mode: MatchMode,
        budget: MatchBudget,
    ) -> Result<MatchOutcome, AtomSpaceError> {
        let table = self.table.read();
        PatternMatcher::new(&table)
            .with_concept_match(self.concept.as_ref())
            .with_budget(budget)
            .run(pattern, mode)
    }

    /// Lift stored clause atoms into a pattern and search, both under the same
    /// snapshot.
    pub fn query_stored(&self, clauses: &[Handle], mode: MatchMode) -> Result<MatchOutcome, AtomSpaceError> {
        let table = self.table.read();
        PatternMatcher::new(&table)
            .with_concept_match(self.concept.as_ref())
            .with_budget(self.config.budget())
            .run_stored(clauses, mode)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Term;
    use crate::registry::{CONCEPT_NODE, LIST_LINK, VARIABLE_NODE};

    #[test]
    fn space_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AtomSpace>();
    }

    #[test]
    fn owned_reads_mirror_table() {
        let space = AtomSpace::new();
        let cat = space.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let animal = space.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        let link = space
            .add_link(INHERITANCE_LINK, &[cat, animal], None, None)
            .expect("link");

        assert_eq!(space.len(), 3);
        assert_eq!(space.incoming(cat), vec![link]);
        assert_eq!(space.outgoing(link), Some(vec![cat, animal]));
        assert_eq!(space.get_link(INHERITANCE_LINK, &[cat, animal]), Some(link));
        assert_eq!(space.get(cat).map(|r| r.handle), Some(cat));
        assert!(matches!(
            space.remove(cat, false),
            Err(AtomSpaceError::HasDependents { .. })
        ));
        assert_eq!(space.remove(cat, true), Ok(true));
        assert_eq!(space.len(), 1);
    }

    #[test]
    fn batched_write_is_atomic_unit() {
        let space = AtomSpace::new();
        let link = space
            .write(|table| {
                let a = table.add_node(CONCEPT_NODE, "a", None, None)?;
                let b = table.add_node(CONCEPT_NODE, "b", None, None)?;
                table.add_link(INHERITANCE_LINK, &[a, b], None, None)
            })
            .expect("batch");
        assert_eq!(space.read().outgoing(link).map(<[Handle]>::len), Some(2));
    }

    #[test]
    fn configured_concept_hook_is_used() {
        let space = AtomSpace::with_config(SpaceConfig::default().with_inheritance()).expect("space");
        let felix = space.add_node(CONCEPT_NODE, "felix", None, None).expect("felix");
        let cat = space.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let animal = space.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        space.add_link(INHERITANCE_LINK, &[felix, cat], None, None).expect("isa");
        space.add_link(INHERITANCE_LINK, &[cat, animal], None, None).expect("isa");

        // felix->cat matches because cat may stand in for animal.
        let pattern = Pattern::new(vec![Term::link(
            INHERITANCE_LINK,
            vec![Term::var("$x"), Term::ground(animal)],
        )]);
        let outcome = space.query(&pattern, MatchMode::All).expect("query");
        let bound: Vec<Handle> = outcome.bindings.iter().filter_map(|b| b.get("$x").copied()).collect();
        assert_eq!(bound, vec![felix, cat]);

        let pattern = Pattern::new(vec![Term::link(
            INHERITANCE_LINK,
            vec![Term::ground(cat), Term::ground(animal)],
        )]);
        assert!(space.query(&pattern, MatchMode::First).expect("query").is_match());
    }

    #[test]
    fn query_stored_lifts_variables() {
        let space = AtomSpace::new();
        let cat = space.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let animal = space.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        space.add_link(INHERITANCE_LINK, &[cat, animal], None, None).expect("link");
        let var = space.add_node(VARIABLE_NODE, "$what", None, None).expect("var");
        let clause = space
            .add_link(INHERITANCE_LINK, &[var, animal], None, None)
            .expect("clause");

        let outcome = space.query_stored(&[clause], MatchMode::All).expect("query");
        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.bindings[0].get("$what"), Some(&cat));
    }

    fn list_chain(space: &AtomSpace, bottom: Handle, length: usize) -> Handle {
        (0..length).fold(bottom, |top, _| {
            space.add_link(LIST_LINK, &[top], None, None).expect("chain")
        })
    }

    #[test]
    fn deep_stored_pattern_is_inconclusive() {
        let space = AtomSpace::new();
        let cat = space.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        list_chain(&space, cat, 3);
        let var = space.add_node(VARIABLE_NODE, "$x", None, None).expect("var");

        let shallow = list_chain(&space, var, 3);
        let outcome = space.query_stored(&[shallow], MatchMode::All).expect("query");
        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.bindings[0].get("$x"), Some(&cat));

        let deep = list_chain(&space, var, 5_000);
        let outcome = space.query_stored(&[deep], MatchMode::All).expect("query");
        assert!(!outcome.is_match());
        assert!(!outcome.truncated);
        assert_eq!(outcome.inconclusive, 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = SpaceConfig {
            match_depth: 0,
            ..SpaceConfig::default()
        };
        assert!(matches!(
            AtomSpace::with_config(config),
            Err(AtomSpaceError::Config(_))
        ));
    }
}
