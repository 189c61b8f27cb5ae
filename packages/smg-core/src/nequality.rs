//! Address inequality prover
//!
//! Decides whether two values denote distinct addresses in every
//! concrete state the graph represents. Sound but incomplete: `false`
//! means "cannot prove", which is always an acceptable conservative
//! answer and never an error.
//!
//! Possibly-empty ("0+") doubly-linked segments are looked through
//! first: a pointer entering such a segment may, in some concrete
//! state, address whatever the segment's far end links to, so the
//! comparison happens between the values left after that traversal.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::domain::{SmgObjectId, SmgObjectKind, SmgValueId, TargetSpecifier};
use crate::graph::Smg;

/// Prove that `v1` and `v2` can never be equal addresses.
/// Returns `false` whenever no proof exists.
pub fn prove_inequality(smg: &Smg, v1: SmgValueId, v2: SmgValueId) -> bool {
    let (final1, seen1) = look_through(smg, v1);
    let (final2, seen2) = look_through(smg, v2);
    trace!(%v1, %v2, %final1, %final2, "proving inequality");

    // the two may collapse onto the same value
    if final1 == final2 {
        return false;
    }
    // a segment visited from both sides is a shared region
    if !seen1.is_disjoint(&seen2) {
        return false;
    }

    let (Some(pt1), Some(pt2)) = (smg.points_to_edge(final1), smg.points_to_edge(final2)) else {
        // non-address data; nothing can be said
        return false;
    };

    // the zero value addresses the size-0 null object, so this must be
    // decided before the bounds guard below
    if final1.is_zero() != final2.is_zero() {
        return true;
    }

    // out-of-bounds targets are unsafe to reason about; the guard runs
    // before any conclusion of distinctness
    for pt in [&pt1, &pt2] {
        let Some(target) = smg.object(pt.target) else {
            return false;
        };
        if pt.offset < 0 || pt.offset as u64 >= target.size_in_bits {
            return false;
        }
    }

    if pt1.target == pt2.target {
        if pt1.specifier == pt2.specifier {
            return false;
        }
        // FIRST and LAST of a long enough doubly-linked segment may still
        // denote the same node once the segment shrinks to one element
        if let Some(obj) = smg.object(pt1.target) {
            if matches!(obj.kind, SmgObjectKind::Dll { min_length, .. } if min_length >= 2)
                && is_first_last_pair(pt1.specifier, pt2.specifier)
            {
                return false;
            }
        }
        return true;
    }

    smg.is_valid(pt1.target) && smg.is_valid(pt2.target)
}

fn is_first_last_pair(a: TargetSpecifier, b: TargetSpecifier) -> bool {
    matches!(
        (a, b),
        (TargetSpecifier::First, TargetSpecifier::Last)
            | (TargetSpecifier::Last, TargetSpecifier::First)
    )
}

/// Follow the value's points-to edge through possibly-empty doubly-linked
/// segments, advancing along the forward link when entering via FIRST and
/// the backward link when entering via LAST. Returns the final value and
/// the set of segments traversed.
fn look_through(smg: &Smg, value: SmgValueId) -> (SmgValueId, FxHashSet<SmgObjectId>) {
    let mut seen: FxHashSet<SmgObjectId> = FxHashSet::default();
    let mut current = value;
    loop {
        let Some(pt) = smg.points_to_edge(current) else {
            break;
        };
        let Some(obj) = smg.object(pt.target) else {
            break;
        };
        let SmgObjectKind::Dll {
            min_length: 0,
            next_offset,
            prev_offset,
        } = obj.kind
        else {
            break;
        };
        let link_offset = match pt.specifier {
            TargetSpecifier::First => next_offset,
            TargetSpecifier::Last => prev_offset,
            _ => break,
        };
        let Some(next_value) = link_value(smg, obj.id, link_offset) else {
            break;
        };
        if !seen.insert(obj.id) {
            // already traversed; the list is cyclic through this segment
            break;
        }
        current = next_value;
    }
    (current, seen)
}

/// Value held in the linkage field of a segment, if any.
fn link_value(smg: &Smg, segment: SmgObjectId, link_offset: i64) -> Option<SmgValueId> {
    smg.has_value_edges(segment)
        .into_iter()
        .find(|e| e.offset == link_offset)
        .map(|e| e.value)
}
