//! # Pattern Matcher
//!
//! Searches an [`AtomTable`] for variable bindings that make every clause of
//! a [`Pattern`] structurally present.
//!
//! ## Search
//!
//! 1. The pattern is normalized (types checked, annotations and duplicate
//!    clauses dropped).
//! 2. At every step the remaining clause with the smallest candidate set is
//!    expanded next. Candidates come from the incoming set of the most
//!    selective resolved member (a ground atom or an already-bound variable);
//!    only a clause with no resolvable member at all falls back to scanning
//!    its link type.
//! 3. Each candidate is compared with [`PatternMatcher::pair_compare`].
//!    Bindings are copied on every branch, so backtracking needs no undo.
//! 4. Complete bindings are emitted, de-duplicated, in discovery order.
//!
//! The search is bounded by [`MatchBudget`]: comparison depth, number of
//! candidate expansions, and an optional cancellation flag. Hitting the step
//! budget or cancellation sets `truncated` on the outcome; every binding in
//! the outcome is still complete and consistent.

use crate::follow::{reached_by, reaches};
use crate::pattern::{NormalizedPattern, Pattern, Term};
use crate::primitives::{DEFAULT_CONCEPT_HOPS, DEFAULT_MATCH_DEPTH, MAX_MATCH_DEPTH};
use crate::registry::INHERITANCE_LINK;
use crate::table::AtomTable;
use crate::{AtomKind, AtomSpaceError, Handle, Type};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Variable name → bound atom.
pub type Binding = BTreeMap<String, Handle>;

// =============================================================================
// MODES & BUDGETS
// =============================================================================

/// Whether to stop at the first complete binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    First,
    All,
}

/// Shared cancellation signal, checked between candidate expansions.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Resource limits for one search.
#[derive(Debug, Clone)]
pub struct MatchBudget {
    /// Maximum nesting depth for `pair_compare`.
    pub max_depth: usize,
    /// Maximum number of candidate expansions, `None` for unbounded.
    pub max_steps: Option<usize>,
    pub cancel: Option<CancelFlag>,
}

impl Default for MatchBudget {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MATCH_DEPTH,
            max_steps: None,
            cancel: None,
        }
    }
}

impl MatchBudget {
    #[must_use]
    pub fn with_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    #[must_use]
    pub fn with_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Effective depth bound, never above [`MAX_MATCH_DEPTH`].
    #[must_use]
    pub fn depth_limit(&self) -> usize {
        self.max_depth.min(MAX_MATCH_DEPTH)
    }
}

/// Result of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Complete bindings, de-duplicated, in discovery order.
    pub bindings: Vec<Binding>,
    /// The step budget or a cancellation cut the search short.
    pub truncated: bool,
    /// Candidate expansions performed.
    pub steps: usize,
    /// Branches abandoned because they exceeded the depth bound.
    pub inconclusive: usize,
}

impl MatchOutcome {
    #[must_use]
    pub fn is_match(&self) -> bool {
        !self.bindings.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Binding> {
        self.bindings.first()
    }

    /// Outcome for a pattern nested deeper than the depth bound: no
    /// comparison could have succeeded, so nothing is searched.
    fn too_deep() -> Self {
        Self {
            inconclusive: 1,
            ..Self::default()
        }
    }
}

/// Outcome of one structural comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comparison {
    Match(Binding),
    Mismatch,
    /// The depth bound was exceeded; treated as a non-match.
    Inconclusive,
}

// =============================================================================
// CONCEPT HOOK
// =============================================================================

/// Domain hook letting two distinct terminal atoms match.
pub trait ConceptMatch: Send + Sync + fmt::Debug {
    /// Whether `candidate` may stand in for the pattern atom `pattern`.
    fn concept_match(&self, table: &AtomTable, pattern: Handle, candidate: Handle) -> bool;

    /// Every atom other than `pattern` itself for which `concept_match`
    /// holds. Used to seed candidates without scanning the table.
    fn instances(&self, table: &AtomTable, pattern: Handle) -> Vec<Handle>;
}

/// Terminals match only by identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl ConceptMatch for ExactMatch {
    fn concept_match(&self, _table: &AtomTable, _pattern: Handle, _candidate: Handle) -> bool {
        false
    }

    fn instances(&self, _table: &AtomTable, _pattern: Handle) -> Vec<Handle> {
        Vec::new()
    }
}

/// A candidate matches a pattern atom it inherits from, through a chain of
/// at most `max_hops` binary links of `link_type`.
#[derive(Debug, Clone, Copy)]
pub struct InheritanceConcepts {
    pub link_type: Type,
    pub max_hops: usize,
}

impl Default for InheritanceConcepts {
    fn default() -> Self {
        Self {
            link_type: INHERITANCE_LINK,
            max_hops: DEFAULT_CONCEPT_HOPS,
        }
    }
}

impl ConceptMatch for InheritanceConcepts {
    fn concept_match(&self, table: &AtomTable, pattern: Handle, candidate: Handle) -> bool {
        candidate != pattern
            && table.atom(candidate).is_some_and(|atom| atom.is_node())
            && reaches(table, candidate, pattern, self.link_type, self.max_hops)
    }

    fn instances(&self, table: &AtomTable, pattern: Handle) -> Vec<Handle> {
        reached_by(table, pattern, self.link_type, self.max_hops)
            .into_iter()
            .filter(|h| table.atom(*h).is_some_and(|atom| atom.is_node()))
            .collect()
    }
}

static EXACT: ExactMatch = ExactMatch;

// =============================================================================
// MATCHER
// =============================================================================

/// Structural pattern matcher over one table snapshot.
#[derive(Debug, Clone)]
pub struct PatternMatcher<'a> {
    table: &'a AtomTable,
    concept: &'a dyn ConceptMatch,
    budget: MatchBudget,
}

impl<'a> PatternMatcher<'a> {
    #[must_use]
    pub fn new(table: &'a AtomTable) -> Self {
        Self {
            table,
            concept: &EXACT,
            budget: MatchBudget::default(),
        }
    }

    #[must_use]
    pub fn with_concept_match(mut self, concept: &'a dyn ConceptMatch) -> Self {
        self.concept = concept;
        self
    }

    #[must_use]
    pub fn with_budget(mut self, budget: MatchBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Run a search. Pattern errors are reported before any candidate is
    /// examined; an empty outcome is a normal result.
    ///
    /// A pattern nested deeper than the depth bound is not searched; it
    /// yields an empty outcome with one inconclusive branch.
    pub fn run(&self, pattern: &Pattern, mode: MatchMode) -> Result<MatchOutcome, AtomSpaceError> {
        let max_depth = self.budget.depth_limit();
        let normalized = match pattern.normalize(self.table.registry(), max_depth) {
            Ok(normalized) => normalized,
            Err(AtomSpaceError::PatternTooDeep { .. }) => {
                tracing::debug!(max_depth, "pattern exceeds the depth bound");
                return Ok(MatchOutcome::too_deep());
            }
            Err(e) => return Err(e),
        };
        tracing::debug!(
            clauses = normalized.clauses.len(),
            variables = normalized.variables.len(),
            dropped = normalized.dropped,
            ?mode,
            "starting pattern search"
        );

        let mut search = Search {
            matcher: self,
            pattern: &normalized,
            mode,
            steps: 0,
            truncated: false,
            inconclusive: 0,
            seen: BTreeSet::new(),
            found: Vec::new(),
        };
        let remaining: Vec<usize> = (0..normalized.clauses.len()).collect();
        search.solve(&remaining, &Binding::new());

        tracing::debug!(
            found = search.found.len(),
            steps = search.steps,
            truncated = search.truncated,
            inconclusive = search.inconclusive,
            "pattern search finished"
        );

        Ok(MatchOutcome {
            bindings: search.found,
            truncated: search.truncated,
            steps: search.steps,
            inconclusive: search.inconclusive,
        })
    }

    /// Lift stored clause atoms (see [`Pattern::from_store`]) and search.
    ///
    /// Lifting stops at the depth bound, so a pathologically deep stored
    /// pattern gives an inconclusive outcome.
    pub fn run_stored(&self, clauses: &[Handle], mode: MatchMode) -> Result<MatchOutcome, AtomSpaceError> {
        match Pattern::from_store(self.table, clauses, self.budget.depth_limit()) {
            Ok(pattern) => self.run(&pattern, mode),
            Err(AtomSpaceError::PatternTooDeep { max_depth }) => {
                tracing::debug!(max_depth, "stored pattern exceeds the depth bound");
                Ok(MatchOutcome::too_deep())
            }
            Err(e) => Err(e),
        }
    }

    /// Compare a pattern term against a stored atom under `binding`.
    ///
    /// Terminals match by identity or through the concept hook; an unbound
    /// variable binds, a bound one must equal the candidate. Links match iff
    /// same type, same arity, and pairwise-matching members in order.
    #[must_use]
    pub fn pair_compare(&self, term: &Term, candidate: Handle, binding: &Binding) -> Comparison {
        self.compare(term, candidate, binding, 0, &BTreeMap::new(), &BTreeSet::new())
    }

    fn compare(
        &self,
        term: &Term,
        candidate: Handle,
        binding: &Binding,
        depth: usize,
        restrictions: &BTreeMap<String, Type>,
        excluded: &BTreeSet<Handle>,
    ) -> Comparison {
        if depth > self.budget.depth_limit() {
            return Comparison::Inconclusive;
        }
        let Some(atom) = self.table.atom(candidate) else {
            return Comparison::Mismatch;
        };

        match term {
            Term::Var { name, restriction } => {
                if let Some(&bound) = binding.get(name) {
                    return if bound == candidate {
                        Comparison::Match(binding.clone())
                    } else {
                        Comparison::Mismatch
                    };
                }
                if excluded.contains(&candidate) {
                    return Comparison::Mismatch;
                }
                let required = restriction.or_else(|| restrictions.get(name).copied());
                if let Some(t) = required {
                    if !self.table.registry().is_a(atom.atom_type(), t) {
                        return Comparison::Mismatch;
                    }
                }
                let mut extended = binding.clone();
                extended.insert(name.clone(), candidate);
                Comparison::Match(extended)
            }
            Term::Ground(handle) => self.terminal(*handle, candidate, binding),
            Term::Node { atom_type, name } => match self.table.get_node(*atom_type, name) {
                Some(handle) => self.terminal(handle, candidate, binding),
                None => Comparison::Mismatch,
            },
            Term::Link {
                atom_type,
                outgoing,
            } => {
                let AtomKind::Link { outgoing: members } = atom.kind() else {
                    return Comparison::Mismatch;
                };
                if atom.atom_type() != *atom_type || members.len() != outgoing.len() {
                    return Comparison::Mismatch;
                }
                let mut current = binding.clone();
                for (sub, &member) in outgoing.iter().zip(members) {
                    match self.compare(sub, member, &current, depth.saturating_add(1), restrictions, excluded) {
                        Comparison::Match(next) => current = next,
                        other => return other,
                    }
                }
                Comparison::Match(current)
            }
        }
    }

    fn terminal(&self, pattern: Handle, candidate: Handle, binding: &Binding) -> Comparison {
        if pattern == candidate || self.concept.concept_match(self.table, pattern, candidate) {
            Comparison::Match(binding.clone())
        } else {
            Comparison::Mismatch
        }
    }

    /// Candidate set for a term, or `None` if nothing in it is resolved yet.
    fn anchor(&self, term: &Term, binding: &Binding) -> Option<BTreeSet<Handle>> {
        match term {
            Term::Var { name, .. } => binding.get(name).map(|h| BTreeSet::from([*h])),
            Term::Ground(handle) => Some(self.terminal_candidates(*handle)),
            Term::Node { atom_type, name } => Some(
                self.table
                    .get_node(*atom_type, name)
                    .map(|h| self.terminal_candidates(h))
                    .unwrap_or_default(),
            ),
            Term::Link {
                atom_type,
                outgoing,
            } => {
                let (position, members) = outgoing
                    .iter()
                    .enumerate()
                    .filter_map(|(i, sub)| self.anchor(sub, binding).map(|set| (i, set)))
                    .min_by_key(|(_, set)| set.len())?;
                let arity = outgoing.len();
                let mut candidates = BTreeSet::new();
                for member in members {
                    for link in self.table.incoming_by_type(member, *atom_type, false) {
                        let fits = self.table.outgoing(link).is_some_and(|out| {
                            out.len() == arity && out.get(position) == Some(&member)
                        });
                        if fits {
                            candidates.insert(link);
                        }
                    }
                }
                Some(candidates)
            }
        }
    }

    fn terminal_candidates(&self, handle: Handle) -> BTreeSet<Handle> {
        if !self.table.contains(handle) {
            return BTreeSet::new();
        }
        let mut set = BTreeSet::from([handle]);
        set.extend(self.concept.instances(self.table, handle));
        set
    }

    /// Clause-level candidates, never `None`.
    fn clause_candidates(&self, clause: &Term, binding: &Binding, excluded: &BTreeSet<Handle>) -> Vec<Handle> {
        let set = match self.anchor(clause, binding) {
            Some(set) => set,
            None => match clause {
                Term::Link { atom_type, .. } => {
                    self.table.get_by_type(*atom_type, false).into_iter().collect()
                }
                _ => BTreeSet::new(),
            },
        };
        set.into_iter().filter(|h| !excluded.contains(h)).collect()
    }
}

// =============================================================================
// SEARCH STATE
// =============================================================================

struct Search<'s, 'a> {
    matcher: &'s PatternMatcher<'a>,
    pattern: &'s NormalizedPattern,
    mode: MatchMode,
    steps: usize,
    truncated: bool,
    inconclusive: usize,
    seen: BTreeSet<Binding>,
    found: Vec<Binding>,
}

impl Search<'_, '_> {
    /// Returns `true` when the whole search must stop.
    fn solve(&mut self, remaining: &[usize], binding: &Binding) -> bool {
        if remaining.is_empty() {
            if self.seen.insert(binding.clone()) {
                self.found.push(binding.clone());
            }
            return self.mode == MatchMode::First;
        }

        let mut best: Option<(usize, Vec<Handle>)> = None;
        for (position, &clause) in remaining.iter().enumerate() {
            let candidates = self.matcher.clause_candidates(
                &self.pattern.clauses[clause],
                binding,
                &self.pattern.excluded,
            );
            let empty = candidates.is_empty();
            if best.as_ref().is_none_or(|(_, b)| candidates.len() < b.len()) {
                best = Some((position, candidates));
            }
            if empty {
                break;
            }
        }
        let Some((position, candidates)) = best else {
            return false;
        };

        let pattern = self.pattern;
        let clause = &pattern.clauses[remaining[position]];
        let rest: Vec<usize> = remaining
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, c)| *c)
            .collect();

        for candidate in candidates {
            if self.out_of_budget() {
                self.truncated = true;
                return true;
            }
            self.steps = self.steps.saturating_add(1);

            let comparison = self.matcher.compare(
                clause,
                candidate,
                binding,
                0,
                &pattern.restrictions,
                &pattern.excluded,
            );
            match comparison {
                Comparison::Match(extended) => {
                    if self.solve(&rest, &extended) {
                        return true;
                    }
                }
                Comparison::Inconclusive => {
                    self.inconclusive = self.inconclusive.saturating_add(1);
                }
                Comparison::Mismatch => {}
            }
        }
        false
    }

    fn out_of_budget(&self) -> bool {
        let budget = &self.matcher.budget;
        budget.max_steps.is_some_and(|max| self.steps >= max)
            || budget.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CONCEPT_NODE, EVALUATION_LINK, LIST_LINK, PREDICATE_NODE, VARIABLE_NODE};

    fn cat_animal() -> (AtomTable, Handle, Handle, Handle) {
        let mut table = AtomTable::new();
        let cat = table.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let animal = table.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        let link = table
            .add_link(INHERITANCE_LINK, &[cat, animal], None, None)
            .expect("link");
        (table, cat, animal, link)
    }

    fn isa(var: &str, concept: &str) -> Term {
        Term::link(
            INHERITANCE_LINK,
            vec![Term::var(var), Term::node(CONCEPT_NODE, concept)],
        )
    }

    #[test]
    fn finds_single_binding() {
        let (table, cat, _, _) = cat_animal();
        let outcome = PatternMatcher::new(&table)
            .run(&Pattern::new(vec![isa("$x", "animal")]), MatchMode::All)
            .expect("run");
        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.first().and_then(|b| b.get("$x")), Some(&cat));
        assert!(!outcome.truncated);
    }

    #[test]
    fn missing_ground_atom_is_no_match() {
        let (table, _, _, _) = cat_animal();
        let outcome = PatternMatcher::new(&table)
            .run(&Pattern::new(vec![isa("$x", "plant")]), MatchMode::All)
            .expect("run");
        assert!(!outcome.is_match());
    }

    #[test]
    fn bound_variable_is_reused() {
        let mut table = AtomTable::new();
        let likes = table.add_node(PREDICATE_NODE, "likes", None, None).expect("p");
        let a = table.add_node(CONCEPT_NODE, "a", None, None).expect("a");
        let b = table.add_node(CONCEPT_NODE, "b", None, None).expect("b");
        for (x, y) in [(a, b), (b, b), (b, a)] {
            let args = table.add_link(LIST_LINK, &[x, y], None, None).expect("args");
            table
                .add_link(EVALUATION_LINK, &[likes, args], None, None)
                .expect("eval");
        }

        // likes($x, $x): only b likes itself.
        let pattern = Pattern::new(vec![Term::link(
            EVALUATION_LINK,
            vec![
                Term::ground(likes),
                Term::link(LIST_LINK, vec![Term::var("$x"), Term::var("$x")]),
            ],
        )]);
        let outcome = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert_eq!(outcome.bindings, vec![Binding::from([("$x".to_string(), b)])]);
    }

    #[test]
    fn conjunction_joins_on_shared_variable() {
        let mut table = AtomTable::new();
        let cat = table.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let dog = table.add_node(CONCEPT_NODE, "dog", None, None).expect("dog");
        let mammal = table.add_node(CONCEPT_NODE, "mammal", None, None).expect("mammal");
        let pet = table.add_node(CONCEPT_NODE, "pet", None, None).expect("pet");
        for (x, y) in [(cat, mammal), (dog, mammal), (cat, pet)] {
            table.add_link(INHERITANCE_LINK, &[x, y], None, None).expect("link");
        }

        let pattern = Pattern::new(vec![isa("$x", "mammal"), isa("$x", "pet")]);
        let outcome = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert_eq!(outcome.bindings, vec![Binding::from([("$x".to_string(), cat)])]);
    }

    #[test]
    fn first_mode_stops_early() {
        let mut table = AtomTable::new();
        let animal = table.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        for name in ["cat", "dog", "cow"] {
            let n = table.add_node(CONCEPT_NODE, name, None, None).expect("node");
            table.add_link(INHERITANCE_LINK, &[n, animal], None, None).expect("link");
        }
        let matcher = PatternMatcher::new(&table);
        let pattern = Pattern::new(vec![isa("$x", "animal")]);

        let first = matcher.run(&pattern, MatchMode::First).expect("first");
        let all = matcher.run(&pattern, MatchMode::All).expect("all");
        assert_eq!(first.bindings.len(), 1);
        assert_eq!(all.bindings.len(), 3);
        assert_eq!(first.bindings[0], all.bindings[0]);
    }

    #[test]
    fn typed_variable_filters_candidates() {
        let (mut table, _, animal, _) = cat_animal();
        let word = table
            .add_node(crate::registry::WORD_NODE, "kitty", None, None)
            .expect("word");
        table.add_link(INHERITANCE_LINK, &[word, animal], None, None).expect("link");

        let pattern = Pattern::new(vec![Term::link(
            INHERITANCE_LINK,
            vec![
                Term::typed_var("$x", crate::registry::WORD_NODE),
                Term::ground(animal),
            ],
        )]);
        let outcome = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert_eq!(outcome.bindings, vec![Binding::from([("$x".to_string(), word)])]);
    }

    #[test]
    fn step_budget_truncates() {
        let mut table = AtomTable::new();
        let animal = table.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        for i in 0..10 {
            let n = table.add_node(CONCEPT_NODE, &format!("n{i}"), None, None).expect("node");
            table.add_link(INHERITANCE_LINK, &[n, animal], None, None).expect("link");
        }
        let pattern = Pattern::new(vec![isa("$x", "animal")]);

        let limited = PatternMatcher::new(&table)
            .with_budget(MatchBudget::default().with_steps(4))
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert!(limited.truncated);
        assert_eq!(limited.bindings.len(), 4);

        let full = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert!(!full.truncated);
        assert_eq!(full.bindings.len(), 10);
        assert_eq!(&full.bindings[..4], &limited.bindings[..]);
    }

    #[test]
    fn cancellation_returns_partial_results() {
        let (table, _, _, _) = cat_animal();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let outcome = PatternMatcher::new(&table)
            .with_budget(MatchBudget::default().with_cancel(cancel))
            .run(&Pattern::new(vec![isa("$x", "animal")]), MatchMode::All)
            .expect("run");
        assert!(outcome.truncated);
        assert!(outcome.bindings.is_empty());
    }

    #[test]
    fn depth_bound_is_inconclusive() {
        let (mut table, cat, animal, link) = cat_animal();
        let outer = table.add_link(LIST_LINK, &[link], None, None).expect("outer");
        let pattern = Pattern::new(vec![Term::link(
            LIST_LINK,
            vec![Term::link(
                INHERITANCE_LINK,
                vec![Term::var("$x"), Term::ground(animal)],
            )],
        )]);

        let shallow = PatternMatcher::new(&table)
            .with_budget(MatchBudget::default().with_depth(1))
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert!(!shallow.is_match());
        assert_eq!(shallow.inconclusive, 1);

        let deep = PatternMatcher::new(&table)
            .with_budget(MatchBudget::default().with_depth(2))
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert_eq!(deep.bindings, vec![Binding::from([("$x".to_string(), cat)])]);
        assert!(table.contains(outer));
    }

    #[test]
    fn pattern_lifted_from_store_does_not_match_itself() {
        let (mut table, cat, animal, _) = cat_animal();
        let var = table.add_node(VARIABLE_NODE, "$x", None, None).expect("var");
        let clause = table
            .add_link(INHERITANCE_LINK, &[var, animal], None, None)
            .expect("clause");

        let pattern = Pattern::from_store(&table, &[clause], DEFAULT_MATCH_DEPTH).expect("lift");
        let outcome = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("run");
        assert_eq!(outcome.bindings, vec![Binding::from([("$x".to_string(), cat)])]);
    }

    #[test]
    fn inheritance_concept_hook() {
        let mut table = AtomTable::new();
        let felix = table.add_node(CONCEPT_NODE, "felix", None, None).expect("felix");
        let cat = table.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let fish = table.add_node(CONCEPT_NODE, "fish", None, None).expect("fish");
        let eats = table.add_node(PREDICATE_NODE, "eats", None, None).expect("eats");
        table.add_link(INHERITANCE_LINK, &[felix, cat], None, None).expect("isa");
        let args = table.add_link(LIST_LINK, &[felix, fish], None, None).expect("args");
        table.add_link(EVALUATION_LINK, &[eats, args], None, None).expect("eval");

        // eats(cat, $food): felix is a cat.
        let pattern = Pattern::new(vec![Term::link(
            EVALUATION_LINK,
            vec![
                Term::ground(eats),
                Term::link(LIST_LINK, vec![Term::ground(cat), Term::var("$food")]),
            ],
        )]);

        let exact = PatternMatcher::new(&table)
            .run(&pattern, MatchMode::All)
            .expect("exact");
        assert!(!exact.is_match());

        let hook = InheritanceConcepts::default();
        let concept = PatternMatcher::new(&table)
            .with_concept_match(&hook)
            .run(&pattern, MatchMode::All)
            .expect("concept");
        assert_eq!(concept.bindings, vec![Binding::from([("$food".to_string(), fish)])]);
    }

    #[test]
    fn pair_compare_directly() {
        let (table, cat, animal, link) = cat_animal();
        let matcher = PatternMatcher::new(&table);
        let term = Term::link(INHERITANCE_LINK, vec![Term::var("$x"), Term::ground(animal)]);

        let bound = Binding::from([("$x".to_string(), animal)]);
        assert_eq!(matcher.pair_compare(&term, link, &bound), Comparison::Mismatch);
        assert_eq!(
            matcher.pair_compare(&term, link, &Binding::new()),
            Comparison::Match(Binding::from([("$x".to_string(), cat)]))
        );
        assert_eq!(matcher.pair_compare(&term, cat, &Binding::new()), Comparison::Mismatch);
    }
}
