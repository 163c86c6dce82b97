//! # Indexed Table
//!
//! The authoritative atom store. `AtomTable` owns every atom, assigns
//! handles, maintains the incoming-set index and enforces uniqueness by
//! hash-consing.
//!
//! `AtomTable` itself is single-threaded (`&mut self` for writes); the
//! thread-safe entry point is [`crate::AtomSpace`], which wraps one table in a
//! read/write lock. Every mutating method validates its arguments completely
//! before touching any index, so an error never leaves partial state.
//!
//! ## Indices
//!
//! - `atoms`: handle → entry (record + incoming set)
//! - `buckets`: type → (structural hash → handles, members)
//! - `names`: node name → handles
//!
//! Ordered maps are used wherever iteration order escapes to callers; the
//! hash buckets are only ever probed, never iterated.

use crate::atom::{Atom, AtomKind};
use crate::registry::{LINK, NODE, TypeRegistry};
use crate::values::{AttentionValue, MergePolicy, MergeStrategy, TruthValue};
use crate::{AtomFlags, AtomSpaceError, Handle, Type};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

// =============================================================================
// RECORDS
// =============================================================================

/// A stored atom together with its attached values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomRecord {
    pub handle: Handle,
    pub atom: Atom,
    pub truth: TruthValue,
    pub attention: AttentionValue,
    pub flags: AtomFlags,
}

#[derive(Debug, Clone)]
struct Entry {
    record: AtomRecord,
    /// Links whose outgoing sequence contains this atom.
    incoming: BTreeSet<Handle>,
}

#[derive(Debug, Clone, Default)]
struct TypeBucket {
    by_hash: HashMap<u64, Vec<Handle>>,
    members: BTreeSet<Handle>,
}

// =============================================================================
// ATOM TABLE
// =============================================================================

/// Hash-consed hypergraph store.
#[derive(Debug, Clone)]
pub struct AtomTable {
    registry: Arc<TypeRegistry>,
    merge: Arc<dyn MergePolicy>,
    atoms: BTreeMap<Handle, Entry>,
    buckets: BTreeMap<Type, TypeBucket>,
    names: BTreeMap<String, BTreeSet<Handle>>,
    next_handle: u64,
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomTable {
    /// Create an empty table over the standard type registry with the
    /// default merge policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(TypeRegistry::standard(), Arc::new(MergeStrategy::default()))
    }

    /// Create an empty table over a custom registry and merge policy.
    #[must_use]
    pub fn with_parts(registry: Arc<TypeRegistry>, merge: Arc<dyn MergePolicy>) -> Self {
        Self {
            registry,
            merge,
            atoms: BTreeMap::new(),
            buckets: BTreeMap::new(),
            names: BTreeMap::new(),
            next_handle: 1,
        }
    }

    /// The type hierarchy this table validates against.
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Replace the merge policy used for duplicate inserts.
    pub fn set_merge_policy(&mut self, merge: Arc<dyn MergePolicy>) {
        self.merge = merge;
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Insert a node, or merge values into the equal node already stored.
    pub fn add_node(
        &mut self,
        atom_type: Type,
        name: &str,
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) -> Result<Handle, AtomSpaceError> {
        let atom = Atom::node(&self.registry, atom_type, name)?;
        self.add_atom(atom, truth, attention)
    }

    /// Insert a link, or merge values into the equal link already stored.
    ///
    /// Every member must already be in this table.
    pub fn add_link(
        &mut self,
        atom_type: Type,
        outgoing: &[Handle],
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) -> Result<Handle, AtomSpaceError> {
        let atom = Atom::link(&self.registry, atom_type, outgoing.to_vec())?;
        self.add_atom(atom, truth, attention)
    }

    /// Insert a pre-built atom. The atom's type is re-validated against this
    /// table's registry.
    pub fn add_atom(
        &mut self,
        atom: Atom,
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) -> Result<Handle, AtomSpaceError> {
        match atom.kind() {
            AtomKind::Node { .. } => self.registry.require(atom.atom_type(), NODE, "node")?,
            AtomKind::Link { outgoing } => {
                self.registry.require(atom.atom_type(), LINK, "link")?;
                if let Some(&missing) = outgoing.iter().find(|h| !self.atoms.contains_key(h)) {
                    return Err(AtomSpaceError::DanglingReference(missing));
                }
            }
        }

        if let Some(existing) = self.find(&atom) {
            self.merge_values(existing, truth, attention);
            return Ok(existing);
        }

        let handle = Handle(self.next_handle);
        self.next_handle = self
            .next_handle
            .checked_add(1)
            .ok_or_else(|| AtomSpaceError::Config("handle space exhausted".into()))?;

        // Back-references first; the entry itself is published last.
        for member in atom.outgoing().iter().collect::<BTreeSet<_>>() {
            if let Some(entry) = self.atoms.get_mut(member) {
                entry.incoming.insert(handle);
            }
        }

        let bucket = self.buckets.entry(atom.atom_type()).or_default();
        bucket
            .by_hash
            .entry(atom.structural_hash())
            .or_default()
            .push(handle);
        bucket.members.insert(handle);

        if let Some(name) = atom.name() {
            self.names.entry(name.to_string()).or_default().insert(handle);
        }

        tracing::trace!(handle = handle.0, atom_type = atom.atom_type().0, "inserted atom");

        self.atoms.insert(
            handle,
            Entry {
                record: AtomRecord {
                    handle,
                    atom,
                    truth: truth.unwrap_or_default(),
                    attention: attention.unwrap_or_default(),
                    flags: AtomFlags::NONE,
                },
                incoming: BTreeSet::new(),
            },
        );

        Ok(handle)
    }

    fn merge_values(
        &mut self,
        handle: Handle,
        truth: Option<TruthValue>,
        attention: Option<AttentionValue>,
    ) {
        if truth.is_none() && attention.is_none() {
            return;
        }
        let policy = &self.merge;
        if let Some(entry) = self.atoms.get_mut(&handle) {
            if let Some(tv) = truth {
                entry.record.truth = policy.merge_truth(entry.record.truth, tv);
            }
            if let Some(av) = attention {
                entry.record.attention = policy.merge_attention(entry.record.attention, av);
            }
            tracing::debug!(handle = handle.0, "merged values into existing atom");
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Remove an atom.
    ///
    /// Returns `Ok(false)` if the handle is not in the table. A referenced
    /// atom is refused with `HasDependents` unless `recursive` is set, in
    /// which case every link in its incoming set is removed first
    /// (depth-first, transitively).
    pub fn remove(&mut self, handle: Handle, recursive: bool) -> Result<bool, AtomSpaceError> {
        let Some(entry) = self.atoms.get(&handle) else {
            return Ok(false);
        };
        if !recursive && !entry.incoming.is_empty() {
            return Err(AtomSpaceError::HasDependents {
                handle,
                count: entry.incoming.len(),
            });
        }

        let order = self.removal_order(handle);
        for &doomed in &order {
            self.detach(doomed);
        }
        tracing::debug!(handle = handle.0, removed = order.len(), "removed atom");
        Ok(true)
    }

    /// Post-order over incoming sets: every dependent precedes what it
    /// references. Links only reference older atoms, so the walk is acyclic.
    fn removal_order(&self, root: Handle) -> Vec<Handle> {
        let mut order = Vec::new();
        let mut seen = BTreeSet::new();
        let mut stack = vec![(root, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !seen.insert(current) {
                continue;
            }
            stack.push((current, true));
            if let Some(entry) = self.atoms.get(&current) {
                for &dependent in entry.incoming.iter().rev() {
                    if !seen.contains(&dependent) {
                        stack.push((dependent, false));
                    }
                }
            }
        }

        order
    }

    /// Drop one atom whose incoming set is already empty.
    fn detach(&mut self, handle: Handle) {
        let Some(entry) = self.atoms.remove(&handle) else {
            return;
        };
        let atom = entry.record.atom;

        for member in atom.outgoing().iter().collect::<BTreeSet<_>>() {
            if let Some(member_entry) = self.atoms.get_mut(member) {
                member_entry.incoming.remove(&handle);
            }
        }

        if let Some(bucket) = self.buckets.get_mut(&atom.atom_type()) {
            let hash = atom.structural_hash();
            if let Some(handles) = bucket.by_hash.get_mut(&hash) {
                handles.retain(|h| *h != handle);
                if handles.is_empty() {
                    bucket.by_hash.remove(&hash);
                }
            }
            bucket.members.remove(&handle);
        }

        if let Some(name) = atom.name() {
            if let Some(handles) = self.names.get_mut(name) {
                handles.remove(&handle);
                if handles.is_empty() {
                    self.names.remove(name);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    /// Handle of the stored atom structurally equal to `atom`, if any.
    #[must_use]
    pub fn find(&self, atom: &Atom) -> Option<Handle> {
        let bucket = self.buckets.get(&atom.atom_type())?;
        bucket
            .by_hash
            .get(&atom.structural_hash())?
            .iter()
            .copied()
            .find(|h| {
                self.atoms
                    .get(h)
                    .is_some_and(|entry| entry.record.atom == *atom)
            })
    }

    /// Look up the node `(atom_type, name)`.
    #[must_use]
    pub fn get_node(&self, atom_type: Type, name: &str) -> Option<Handle> {
        let atom = Atom::node(&self.registry, atom_type, name).ok()?;
        self.find(&atom)
    }

    /// Look up the link `(atom_type, outgoing)`.
    #[must_use]
    pub fn get_link(&self, atom_type: Type, outgoing: &[Handle]) -> Option<Handle> {
        let atom = Atom::link(&self.registry, atom_type, outgoing.to_vec()).ok()?;
        self.find(&atom)
    }

    /// The stored record for a handle.
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&AtomRecord> {
        self.atoms.get(&handle).map(|entry| &entry.record)
    }

    /// Shortcut for the structural part of a stored atom.
    #[must_use]
    pub fn atom(&self, handle: Handle) -> Option<&Atom> {
        self.get(handle).map(|record| &record.atom)
    }

    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.atoms.contains_key(&handle)
    }

    /// Incoming set of a stored atom, `None` if the handle is unknown.
    #[must_use]
    pub fn incoming_set(&self, handle: Handle) -> Option<&BTreeSet<Handle>> {
        self.atoms.get(&handle).map(|entry| &entry.incoming)
    }

    /// Incoming set as a sorted vector (empty for unknown handles).
    #[must_use]
    pub fn incoming(&self, handle: Handle) -> Vec<Handle> {
        self.incoming_set(handle)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Incoming links of a given type (optionally including subtypes).
    #[must_use]
    pub fn incoming_by_type(&self, handle: Handle, link_type: Type, subclasses: bool) -> Vec<Handle> {
        self.incoming_set(handle)
            .into_iter()
            .flatten()
            .copied()
            .filter(|link| {
                self.atom(*link).is_some_and(|atom| {
                    if subclasses {
                        self.registry.is_a(atom.atom_type(), link_type)
                    } else {
                        atom.atom_type() == link_type
                    }
                })
            })
            .collect()
    }

    /// Outgoing sequence of a stored atom (empty for nodes).
    #[must_use]
    pub fn outgoing(&self, handle: Handle) -> Option<&[Handle]> {
        self.atom(handle).map(Atom::outgoing)
    }

    /// Every atom of `atom_type`, optionally including subtypes, in handle order.
    #[must_use]
    pub fn get_by_type(&self, atom_type: Type, subclasses: bool) -> Vec<Handle> {
        if !subclasses {
            return self
                .buckets
                .get(&atom_type)
                .map(|bucket| bucket.members.iter().copied().collect())
                .unwrap_or_default();
        }
        let mut handles = BTreeSet::new();
        for t in self.registry.subtypes(atom_type) {
            if let Some(bucket) = self.buckets.get(&t) {
                handles.extend(bucket.members.iter().copied());
            }
        }
        handles.into_iter().collect()
    }

    /// Number of atoms of `atom_type`, optionally including subtypes.
    #[must_use]
    pub fn count_by_type(&self, atom_type: Type, subclasses: bool) -> usize {
        if subclasses {
            self.registry
                .subtypes(atom_type)
                .iter()
                .filter_map(|t| self.buckets.get(t))
                .map(|bucket| bucket.members.len())
                .sum()
        } else {
            self.buckets
                .get(&atom_type)
                .map_or(0, |bucket| bucket.members.len())
        }
    }

    /// Nodes called `name` whose type is `atom_type` (or a subtype).
    #[must_use]
    pub fn get_by_name(&self, name: &str, atom_type: Type, subclasses: bool) -> Vec<Handle> {
        self.names
            .get(name)
            .into_iter()
            .flatten()
            .copied()
            .filter(|h| {
                self.atom(*h).is_some_and(|atom| {
                    if subclasses {
                        self.registry.is_a(atom.atom_type(), atom_type)
                    } else {
                        atom.atom_type() == atom_type
                    }
                })
            })
            .collect()
    }

    /// All handles in allocation order.
    pub fn handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.atoms.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    // -------------------------------------------------------------------------
    // Value mutation
    // -------------------------------------------------------------------------

    fn entry_mut(&mut self, handle: Handle) -> Result<&mut Entry, AtomSpaceError> {
        self.atoms
            .get_mut(&handle)
            .ok_or(AtomSpaceError::AtomNotFound(handle))
    }

    pub fn set_truth_value(&mut self, handle: Handle, truth: TruthValue) -> Result<(), AtomSpaceError> {
        self.entry_mut(handle)?.record.truth = truth;
        Ok(())
    }

    pub fn set_attention_value(
        &mut self,
        handle: Handle,
        attention: AttentionValue,
    ) -> Result<(), AtomSpaceError> {
        self.entry_mut(handle)?.record.attention = attention;
        Ok(())
    }

    pub fn set_flag(&mut self, handle: Handle, flag: AtomFlags, on: bool) -> Result<(), AtomSpaceError> {
        let record = &mut self.entry_mut(handle)?.record;
        record.flags = record.flags.with(flag, on);
        Ok(())
    }

    /// Stored atoms cannot be renamed: the uniqueness index is keyed on the name.
    pub fn rename(&mut self, handle: Handle, _name: &str) -> Result<(), AtomSpaceError> {
        if self.contains(handle) {
            Err(AtomSpaceError::ImmutableIdentity(handle))
        } else {
            Err(AtomSpaceError::AtomNotFound(handle))
        }
    }

    /// Stored atoms cannot be re-typed.
    pub fn retype(&mut self, handle: Handle, _atom_type: Type) -> Result<(), AtomSpaceError> {
        if self.contains(handle) {
            Err(AtomSpaceError::ImmutableIdentity(handle))
        } else {
            Err(AtomSpaceError::AtomNotFound(handle))
        }
    }

    // -------------------------------------------------------------------------
    // Rendering & integrity
    // -------------------------------------------------------------------------

    /// `node[ConceptNode:cat] av:(0,0) tv:(0.000000,0.000000)`
    #[must_use]
    pub fn describe(&self, handle: Handle) -> Option<String> {
        let record = self.get(handle)?;
        Some(format!(
            "{} av:({},{}) tv:({})",
            self.label(record),
            record.attention.sti,
            record.attention.lti,
            record.truth
        ))
    }

    /// `node[ConceptNode:cat]`, with a `:h` suffix inside the brackets for
    /// hypothetical atoms.
    #[must_use]
    pub fn describe_short(&self, handle: Handle) -> Option<String> {
        let record = self.get(handle)?;
        let mut label = self.label(record);
        if record.flags.contains(AtomFlags::HYPOTHETICAL) {
            label.insert_str(label.len().saturating_sub(1), ":h");
        }
        Some(label)
    }

    fn label(&self, record: &AtomRecord) -> String {
        let type_name = self
            .registry
            .type_name(record.atom.atom_type())
            .unwrap_or("?");
        match record.atom.kind() {
            AtomKind::Node { name } if name.is_empty() => {
                format!("node[{}:#{}]", type_name, record.handle)
            }
            AtomKind::Node { name } => format!("node[{}:{}]", type_name, name),
            AtomKind::Link { outgoing } => {
                let members: Vec<String> = outgoing.iter().map(Handle::to_string).collect();
                format!("link[{}:<{}>]", type_name, members.join(","))
            }
        }
    }

    /// Check the incoming-set invariant in both directions.
    ///
    /// Returns the first violation found.
    pub fn verify_integrity(&self) -> Result<(), String> {
        for (&handle, entry) in &self.atoms {
            for member in entry.record.atom.outgoing() {
                let listed = self
                    .atoms
                    .get(member)
                    .is_some_and(|m| m.incoming.contains(&handle));
                if !listed {
                    return Err(format!("{handle:?} missing from incoming set of {member:?}"));
                }
            }
            for link in &entry.incoming {
                let references = self
                    .atom(*link)
                    .is_some_and(|atom| atom.outgoing().contains(&handle));
                if !references {
                    return Err(format!("{link:?} listed as incoming of {handle:?} but does not reference it"));
                }
            }
            if self.find(&entry.record.atom) != Some(handle) {
                return Err(format!("{handle:?} not reachable through the uniqueness index"));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
