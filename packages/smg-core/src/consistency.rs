//! Whole-graph invariant auditor
//!
//! Stateless predicate evaluation over one graph snapshot; no
//! transitions. Meant for debug and test invocation after risky
//! mutations, not the production hot path. On the first violated
//! invariant it returns an error carrying a JSON dump of the offending
//! snapshot.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::domain::{SmgObjectId, SmgObjectKind, SmgValueId};
use crate::errors::{Result, SmgError};
use crate::graph::Smg;

/// Audit every structural invariant of the graph.
pub fn verify(smg: &Smg) -> Result<()> {
    debug!("running consistency audit");
    check_null_object(smg)?;
    check_invalid_objects_are_bare(smg)?;
    check_segment_shapes(smg)?;
    check_edge_references(smg)?;
    check_reverse_indices(smg)?;
    Ok(())
}

fn fail(smg: &Smg, reason: String) -> SmgError {
    let dump = serde_json::to_string_pretty(smg)
        .unwrap_or_else(|e| format!("<snapshot not serializable: {}>", e));
    SmgError::Inconsistent { reason, dump }
}

/// The null object must stay invalid, zero-sized and at nesting 0.
fn check_null_object(smg: &Smg) -> Result<()> {
    let Some(null) = smg.object(SmgObjectId::NULL) else {
        return Err(fail(smg, "the null object is missing".into()));
    };
    if null.valid {
        return Err(fail(smg, "the null object is valid".into()));
    }
    if null.size_in_bits != 0 {
        return Err(fail(
            smg,
            format!("the null object has size {} bits", null.size_in_bits),
        ));
    }
    if null.nesting_level != 0 {
        return Err(fail(
            smg,
            format!("the null object has nesting {}", null.nesting_level),
        ));
    }
    Ok(())
}

/// Invalid objects must not carry has-value edges.
fn check_invalid_objects_are_bare(smg: &Smg) -> Result<()> {
    for id in smg.object_ids() {
        let valid = smg.is_valid(id);
        if !valid && !smg.has_value_edges(id).is_empty() {
            return Err(fail(
                smg,
                format!("invalid object {} still carries has-value edges", id),
            ));
        }
    }
    Ok(())
}

/// Abstracted segments must have linkage fields consistent with their role.
fn check_segment_shapes(smg: &Smg) -> Result<()> {
    for id in smg.object_ids() {
        let Some(obj) = smg.object(id) else {
            continue;
        };
        match obj.kind {
            SmgObjectKind::Region => {}
            SmgObjectKind::Sll { next_offset, .. } => {
                if next_offset < 0 || next_offset as u64 >= obj.size_in_bits {
                    return Err(fail(
                        smg,
                        format!("segment {} has next link at {} outside its size", id, next_offset),
                    ));
                }
            }
            SmgObjectKind::Dll {
                next_offset,
                prev_offset,
                ..
            } => {
                for (name, link) in [("next", next_offset), ("prev", prev_offset)] {
                    if link < 0 || link as u64 >= obj.size_in_bits {
                        return Err(fail(
                            smg,
                            format!("segment {} has {} link at {} outside its size", id, name, link),
                        ));
                    }
                }
                if next_offset == prev_offset {
                    return Err(fail(
                        smg,
                        format!("segment {} has coinciding next/prev links", id),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Every edge must reference known endpoints, with an admissible
/// specifier and a nesting level inside the segment bound.
fn check_edge_references(smg: &Smg) -> Result<()> {
    for id in smg.object_ids() {
        for edge in smg.has_value_edges(id) {
            if !smg.contains_value(edge.value) {
                return Err(fail(
                    smg,
                    format!("has-value edge on {} names unknown {}", id, edge.value),
                ));
            }
        }
    }
    for vid in smg.value_ids() {
        let Some(pt) = smg.points_to_edge(vid) else {
            continue;
        };
        let Some(target) = smg.object(pt.target) else {
            return Err(fail(
                smg,
                format!("points-to edge of {} names unknown {}", vid, pt.target),
            ));
        };
        if !pt.specifier.allowed_for(&target.kind) {
            return Err(fail(
                smg,
                format!(
                    "points-to edge of {} carries {} toward {:?}",
                    vid, pt.specifier, target.kind
                ),
            ));
        }
        let nesting = smg.value(vid).map(|v| v.nesting_level).unwrap_or(0);
        if target.is_abstract() && nesting > target.max_pointer_nesting() {
            return Err(fail(
                smg,
                format!(
                    "{} points into {} at nesting {} above bound {}",
                    vid,
                    pt.target,
                    nesting,
                    target.max_pointer_nesting()
                ),
            ));
        }
    }
    Ok(())
}

/// Both occurrence indices must equal what a from-scratch scan of the
/// edges computes. A mismatch is index corruption and always fatal.
fn check_reverse_indices(smg: &Smg) -> Result<()> {
    let mut values_in: FxHashMap<SmgObjectId, FxHashMap<SmgValueId, usize>> = FxHashMap::default();
    let mut pointers: FxHashMap<SmgObjectId, FxHashMap<SmgValueId, usize>> = FxHashMap::default();

    for id in smg.object_ids() {
        for edge in smg.has_value_edges(id) {
            *values_in.entry(id).or_default().entry(edge.value).or_insert(0) += 1;
            if let Some(pt) = smg.points_to_edge(edge.value) {
                *pointers
                    .entry(pt.target)
                    .or_default()
                    .entry(edge.value)
                    .or_insert(0) += 1;
            }
        }
    }

    for id in smg.object_ids() {
        let stored: FxHashMap<SmgValueId, usize> = smg.stored_values_in(id).into_iter().collect();
        if stored != values_in.remove(&id).unwrap_or_default() {
            return Err(fail(
                smg,
                format!("value occurrence index of {} disagrees with the edge scan", id),
            ));
        }
        let aimed: FxHashMap<SmgValueId, usize> = smg.pointers_toward(id).into_iter().collect();
        if aimed != pointers.remove(&id).unwrap_or_default() {
            return Err(fail(
                smg,
                format!("pointer occurrence index of {} disagrees with the edge scan", id),
            ));
        }
    }
    Ok(())
}
