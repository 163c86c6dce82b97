//! # Patterns
//!
//! A pattern is a list of clause terms: small trees built from ordinary atoms
//! plus variables. A successful match binds every variable so that each
//! clause, under substitution, is an atom present in the table.
//!
//! Patterns are either built by hand with the [`Term`] constructors or lifted
//! from atoms already stored in a table ([`Pattern::from_store`]), in which
//! case every `VariableNode` becomes a variable.
//!
//! Before a search, [`Pattern::normalize`] validates every type, drops pure
//! annotation clauses and removes duplicate clauses. Normalization never
//! looks at the table contents.

use crate::atom::AtomKind;
use crate::registry::{ANNOTATION_LINK, LINK, NODE, TypeRegistry, VARIABLE_NODE};
use crate::table::AtomTable;
use crate::{AtomSpaceError, Handle, Type};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// TERMS
// =============================================================================

/// One node of a pattern tree.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Term {
    /// Placeholder bound during matching, optionally restricted to atoms
    /// whose type is-a `restriction`.
    Var {
        name: String,
        restriction: Option<Type>,
    },
    /// A node given by value; matches the stored node `(atom_type, name)`.
    Node { atom_type: Type, name: String },
    /// A link whose members are themselves terms.
    Link { atom_type: Type, outgoing: Vec<Term> },
    /// A stored atom given by handle.
    Ground(Handle),
}

impl Term {
    pub fn var(name: impl Into<String>) -> Self {
        Self::Var {
            name: name.into(),
            restriction: None,
        }
    }

    pub fn typed_var(name: impl Into<String>, restriction: Type) -> Self {
        Self::Var {
            name: name.into(),
            restriction: Some(restriction),
        }
    }

    pub fn node(atom_type: Type, name: impl Into<String>) -> Self {
        Self::Node {
            atom_type,
            name: name.into(),
        }
    }

    pub fn link(atom_type: Type, outgoing: Vec<Term>) -> Self {
        Self::Link {
            atom_type,
            outgoing,
        }
    }

    pub fn ground(handle: Handle) -> Self {
        Self::Ground(handle)
    }

    /// Check whether any variable occurs in this term.
    #[must_use]
    pub fn has_variables(&self) -> bool {
        match self {
            Self::Var { .. } => true,
            Self::Node { .. } | Self::Ground(_) => false,
            Self::Link { outgoing, .. } => outgoing.iter().any(Self::has_variables),
        }
    }

    /// Names of the variables occurring in this term.
    #[must_use]
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Var { name, .. } => {
                names.insert(name.clone());
            }
            Self::Node { .. } | Self::Ground(_) => {}
            Self::Link { outgoing, .. } => {
                for member in outgoing {
                    member.collect_variables(names);
                }
            }
        }
    }
}

// =============================================================================
// PATTERN
// =============================================================================

/// A conjunction of clauses to be found in a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    clauses: Vec<Term>,
    /// Stored atoms that belong to the pattern itself and must never be
    /// offered as candidates.
    excluded: BTreeSet<Handle>,
}

impl Pattern {
    #[must_use]
    pub fn new(clauses: Vec<Term>) -> Self {
        Self {
            clauses,
            excluded: BTreeSet::new(),
        }
    }

    /// Append a clause.
    #[must_use]
    pub fn with_clause(mut self, clause: Term) -> Self {
        self.clauses.push(clause);
        self
    }

    #[must_use]
    pub fn clauses(&self) -> &[Term] {
        &self.clauses
    }

    /// Lift stored atoms into a pattern. `VariableNode`s become variables
    /// named after the node; variable-free sub-graphs become ground terms.
    /// The lifted clause links and variable nodes are excluded from the
    /// candidates so the pattern never matches itself.
    ///
    /// A variable nested deeper than `max_depth` fails with
    /// [`AtomSpaceError::PatternTooDeep`]; deep variable-free sub-graphs are
    /// fine since they lift to a single ground term.
    pub fn from_store(table: &AtomTable, clauses: &[Handle], max_depth: usize) -> Result<Self, AtomSpaceError> {
        let mut pattern = Self::default();
        for &clause in clauses {
            let (term, _) = lift(table, clause, &mut pattern.excluded, 0, max_depth)?;
            pattern.clauses.push(term);
        }
        Ok(pattern)
    }

    /// Validate and canonicalize the pattern.
    ///
    /// Terms nested deeper than `max_depth` fail with
    /// [`AtomSpaceError::PatternTooDeep`], since no comparison could reach
    /// them without exceeding the bound.
    pub fn normalize(&self, registry: &TypeRegistry, max_depth: usize) -> Result<NormalizedPattern, AtomSpaceError> {
        let mut restrictions: BTreeMap<String, Option<Type>> = BTreeMap::new();
        for clause in &self.clauses {
            validate(registry, clause, &mut restrictions, 0, max_depth)?;
            if matches!(clause, Term::Var { .. }) {
                return Err(AtomSpaceError::InvalidPattern(
                    "a clause cannot be a bare variable".into(),
                ));
            }
        }

        let mut seen = BTreeSet::new();
        let mut clauses = Vec::new();
        let mut dropped = 0usize;
        for clause in &self.clauses {
            let annotation = matches!(
                clause,
                Term::Link { atom_type, .. } if registry.is_a(*atom_type, ANNOTATION_LINK)
            );
            if annotation || !seen.insert(clause.clone()) {
                dropped = dropped.saturating_add(1);
                continue;
            }
            clauses.push(clause.clone());
        }

        if clauses.is_empty() {
            return Err(AtomSpaceError::InvalidPattern(
                "pattern has no searchable clauses".into(),
            ));
        }

        let variables = clauses.iter().flat_map(Term::variables).collect();
        let restrictions = restrictions
            .into_iter()
            .filter_map(|(name, restriction)| restriction.map(|t| (name, t)))
            .collect();

        Ok(NormalizedPattern {
            clauses,
            variables,
            restrictions,
            excluded: self.excluded.clone(),
            dropped,
        })
    }
}

/// A validated pattern ready for search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPattern {
    pub clauses: Vec<Term>,
    pub variables: BTreeSet<String>,
    pub restrictions: BTreeMap<String, Type>,
    pub excluded: BTreeSet<Handle>,
    /// Clauses removed as annotations or duplicates.
    pub dropped: usize,
}

fn validate(
    registry: &TypeRegistry,
    term: &Term,
    restrictions: &mut BTreeMap<String, Option<Type>>,
    depth: usize,
    max_depth: usize,
) -> Result<(), AtomSpaceError> {
    if depth > max_depth {
        return Err(AtomSpaceError::PatternTooDeep { max_depth });
    }
    match term {
        Term::Var { name, restriction } => {
            if let Some(t) = restriction {
                if !registry.contains(*t) {
                    return Err(AtomSpaceError::UnknownType(*t));
                }
            }
            let slot = restrictions.entry(name.clone()).or_insert(None);
            match (*slot, *restriction) {
                (Some(a), Some(b)) if a != b => {
                    return Err(AtomSpaceError::InvalidPattern(format!(
                        "variable '{name}' has conflicting type restrictions"
                    )));
                }
                (None, Some(b)) => *slot = Some(b),
                _ => {}
            }
            Ok(())
        }
        Term::Node { atom_type, .. } => registry.require(*atom_type, NODE, "node"),
        Term::Link {
            atom_type,
            outgoing,
        } => {
            registry.require(*atom_type, LINK, "link")?;
            for member in outgoing {
                validate(registry, member, restrictions, depth.saturating_add(1), max_depth)?;
            }
            Ok(())
        }
        Term::Ground(_) => Ok(()),
    }
}

/// Returns the lifted term and whether it contains a variable.
fn lift(
    table: &AtomTable,
    handle: Handle,
    excluded: &mut BTreeSet<Handle>,
    depth: usize,
    max_depth: usize,
) -> Result<(Term, bool), AtomSpaceError> {
    if depth > max_depth {
        return if reaches_variable(table, handle) {
            Err(AtomSpaceError::PatternTooDeep { max_depth })
        } else {
            Ok((Term::Ground(handle), false))
        };
    }
    let atom = table
        .atom(handle)
        .ok_or(AtomSpaceError::AtomNotFound(handle))?;
    match atom.kind() {
        AtomKind::Node { name } if atom.atom_type() == VARIABLE_NODE => {
            excluded.insert(handle);
            Ok((Term::var(name.clone()), true))
        }
        AtomKind::Node { .. } => Ok((Term::Ground(handle), false)),
        AtomKind::Link { outgoing } => {
            let mut members = Vec::with_capacity(outgoing.len());
            let mut has_variables = false;
            for &member in outgoing {
                let (term, vars) = lift(table, member, excluded, depth.saturating_add(1), max_depth)?;
                has_variables |= vars;
                members.push(term);
            }
            if has_variables {
                excluded.insert(handle);
                Ok((Term::link(atom.atom_type(), members), true))
            } else {
                Ok((Term::Ground(handle), false))
            }
        }
    }
}

/// Iterative scan for a `VariableNode` below `root`.
fn reaches_variable(table: &AtomTable, root: Handle) -> bool {
    let mut stack = vec![root];
    let mut visited = BTreeSet::new();
    while let Some(handle) = stack.pop() {
        if !visited.insert(handle) {
            continue;
        }
        match table.atom(handle).map(|atom| (atom.atom_type(), atom.kind())) {
            Some((t, AtomKind::Node { .. })) if t == VARIABLE_NODE => return true,
            Some((_, AtomKind::Link { outgoing })) => stack.extend(outgoing.iter().copied()),
            _ => {}
        }
    }
    false
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DEFAULT_MATCH_DEPTH;
    use crate::registry::{CONCEPT_NODE, INHERITANCE_LINK, LIST_LINK};

    fn registry() -> TypeRegistry {
        TypeRegistry::new()
    }

    #[test]
    fn variables_are_collected() {
        let term = Term::link(
            LIST_LINK,
            vec![
                Term::var("$x"),
                Term::link(INHERITANCE_LINK, vec![Term::var("$y"), Term::var("$x")]),
            ],
        );
        let names: Vec<_> = term.variables().into_iter().collect();
        assert_eq!(names, vec!["$x".to_string(), "$y".to_string()]);
        assert!(term.has_variables());
        assert!(!Term::node(CONCEPT_NODE, "cat").has_variables());
    }

    #[test]
    fn normalize_drops_annotations_and_duplicates() {
        let mut registry = registry();
        let comment = registry
            .register_type("CommentLink", &[ANNOTATION_LINK])
            .expect("register");
        let clause = Term::link(
            INHERITANCE_LINK,
            vec![Term::var("$x"), Term::node(CONCEPT_NODE, "animal")],
        );
        let pattern = Pattern::new(vec![
            clause.clone(),
            Term::link(comment, vec![Term::var("$x")]),
            clause.clone(),
        ]);

        let normalized = pattern.normalize(&registry, DEFAULT_MATCH_DEPTH).expect("normalize");
        assert_eq!(normalized.clauses, vec![clause]);
        assert_eq!(normalized.dropped, 2);
        assert!(normalized.variables.contains("$x"));
    }

    #[test]
    fn normalize_rejects_unknown_and_misplaced_types() {
        let registry = registry();
        let unknown = Pattern::new(vec![Term::link(Type(4000), vec![Term::var("$x")])]);
        assert_eq!(
            unknown.normalize(&registry, DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::UnknownType(Type(4000)))
        );

        let misplaced = Pattern::new(vec![Term::link(
            LIST_LINK,
            vec![Term::node(INHERITANCE_LINK, "oops")],
        )]);
        assert!(matches!(
            misplaced.normalize(&registry, DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::InvalidType { .. })
        ));
    }

    #[test]
    fn normalize_rejects_degenerate_patterns() {
        let registry = registry();
        assert!(matches!(
            Pattern::new(vec![Term::var("$x")]).normalize(&registry, DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::InvalidPattern(_))
        ));
        assert!(matches!(
            Pattern::new(vec![]).normalize(&registry, DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn conflicting_restrictions_rejected() {
        let registry = registry();
        let pattern = Pattern::new(vec![Term::link(
            LIST_LINK,
            vec![
                Term::typed_var("$x", CONCEPT_NODE),
                Term::typed_var("$x", VARIABLE_NODE),
            ],
        )]);
        assert!(matches!(
            pattern.normalize(&registry, DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::InvalidPattern(_))
        ));
    }

    #[test]
    fn lift_from_store() {
        let mut table = AtomTable::new();
        let animal = table.add_node(CONCEPT_NODE, "animal", None, None).expect("animal");
        let var = table.add_node(VARIABLE_NODE, "$x", None, None).expect("var");
        let clause = table
            .add_link(INHERITANCE_LINK, &[var, animal], None, None)
            .expect("clause");

        let pattern = Pattern::from_store(&table, &[clause], DEFAULT_MATCH_DEPTH).expect("lift");
        assert_eq!(
            pattern.clauses(),
            &[Term::link(
                INHERITANCE_LINK,
                vec![Term::var("$x"), Term::Ground(animal)]
            )]
        );
        let normalized = pattern.normalize(table.registry(), DEFAULT_MATCH_DEPTH).expect("normalize");
        assert!(normalized.excluded.contains(&clause));
        assert!(normalized.excluded.contains(&var));
        assert!(!normalized.excluded.contains(&animal));
    }

    fn chain(table: &mut AtomTable, bottom: Handle, length: usize) -> Handle {
        let mut top = bottom;
        for _ in 0..length {
            top = table.add_link(LIST_LINK, &[top], None, None).expect("chain");
        }
        top
    }

    #[test]
    fn lifting_stops_at_depth_bound() {
        let mut table = AtomTable::new();
        let var = table.add_node(VARIABLE_NODE, "$x", None, None).expect("var");
        let top = chain(&mut table, var, 5_000);

        assert!(matches!(
            Pattern::from_store(&table, &[top], DEFAULT_MATCH_DEPTH),
            Err(AtomSpaceError::PatternTooDeep { max_depth: DEFAULT_MATCH_DEPTH })
        ));
    }

    #[test]
    fn deep_ground_subgraph_lifts_to_one_term() {
        let mut table = AtomTable::new();
        let cat = table.add_node(CONCEPT_NODE, "cat", None, None).expect("cat");
        let deep = chain(&mut table, cat, 5_000);
        let var = table.add_node(VARIABLE_NODE, "$x", None, None).expect("var");
        let clause = table
            .add_link(INHERITANCE_LINK, &[var, deep], None, None)
            .expect("clause");

        let pattern = Pattern::from_store(&table, &[clause], DEFAULT_MATCH_DEPTH).expect("lift");
        assert_eq!(
            pattern.clauses(),
            &[Term::link(
                INHERITANCE_LINK,
                vec![Term::var("$x"), Term::Ground(deep)]
            )]
        );
    }

    #[test]
    fn normalize_rejects_terms_below_depth_bound() {
        let term = Term::link(
            LIST_LINK,
            vec![Term::link(LIST_LINK, vec![Term::var("$x")])],
        );
        let pattern = Pattern::new(vec![term]);
        assert!(pattern.normalize(&registry(), 2).is_ok());
        assert!(matches!(
            pattern.normalize(&registry(), 1),
            Err(AtomSpaceError::PatternTooDeep { max_depth: 1 })
        ));
    }
}
