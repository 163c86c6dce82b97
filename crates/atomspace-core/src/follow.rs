//! # Link Chasing
//!
//! Generic traversal helpers over binary links, used by collaborators that
//! walk the graph along one relation (and by the inheritance concept hook of
//! the matcher).
//!
//! A binary link `L(a, b)` is *followed* from `a` to `b` and *backtracked*
//! from `b` to `a`. Only links of exactly the requested type with arity two
//! are considered.

use crate::table::AtomTable;
use crate::{Handle, Type};
use std::collections::{BTreeSet, VecDeque};

/// Every `b` such that `link_type(handle, b)` is stored.
#[must_use]
pub fn follow_binary_link(table: &AtomTable, handle: Handle, link_type: Type) -> Vec<Handle> {
    chase(table, handle, link_type, 0, 1)
}

/// Every `a` such that `link_type(a, handle)` is stored.
#[must_use]
pub fn backtrack_binary_link(table: &AtomTable, handle: Handle, link_type: Type) -> Vec<Handle> {
    chase(table, handle, link_type, 1, 0)
}

fn chase(table: &AtomTable, handle: Handle, link_type: Type, from: usize, to: usize) -> Vec<Handle> {
    table
        .incoming_by_type(handle, link_type, false)
        .into_iter()
        .filter_map(|link| {
            let outgoing = table.outgoing(link)?;
            (outgoing.len() == 2 && outgoing[from] == handle).then(|| outgoing[to])
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Visit the incoming links of `handle`, optionally restricted to one link
/// type (subtypes included). The callback returns `true` to stop early.
///
/// Returns `true` if the walk was stopped by the callback.
pub fn foreach_incoming<F>(table: &AtomTable, handle: Handle, link_type: Option<Type>, mut f: F) -> bool
where
    F: FnMut(Handle) -> bool,
{
    let links = match link_type {
        Some(t) => table.incoming_by_type(handle, t, true),
        None => table.incoming(handle),
    };
    links.into_iter().any(|link| f(link))
}

/// Check whether `to` is reachable from `from` by following at most
/// `max_hops` binary links of `link_type`.
#[must_use]
pub fn reaches(table: &AtomTable, from: Handle, to: Handle, link_type: Type, max_hops: usize) -> bool {
    if from == to {
        return true;
    }
    let mut seen = BTreeSet::from([from]);
    let mut queue = VecDeque::from([(from, 0usize)]);

    while let Some((current, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for next in follow_binary_link(table, current, link_type) {
            if next == to {
                return true;
            }
            if seen.insert(next) {
                queue.push_back((next, hops.saturating_add(1)));
            }
        }
    }
    false
}

/// Every atom that reaches `target` within `max_hops` backtracked links of
/// `link_type`, `target` excluded, in handle order.
#[must_use]
pub fn reached_by(table: &AtomTable, target: Handle, link_type: Type, max_hops: usize) -> Vec<Handle> {
    let mut seen = BTreeSet::from([target]);
    let mut queue = VecDeque::from([(target, 0usize)]);

    while let Some((current, hops)) = queue.pop_front() {
        if hops >= max_hops {
            continue;
        }
        for prev in backtrack_binary_link(table, current, link_type) {
            if seen.insert(prev) {
                queue.push_back((prev, hops.saturating_add(1)));
            }
        }
    }

    seen.remove(&target);
    seen.into_iter().collect()
}

// =============================================================================
// TESTS
// =============================================================================
