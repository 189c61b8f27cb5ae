//! Two-heap join (not implemented)
//!
//! Merging two graphs at an abstract-state join point requires the
//! field-wise join of the shape-analysis literature: join the sub-graphs
//! under each matched pair of objects, join the values they hold, join
//! the target objects of matched pointers, then re-insert and re-join
//! each side's abstracted segments. Only the per-field primitive lives
//! here; the driver refuses until the full algorithm exists, rather than
//! merging heaps incorrectly.

use crate::domain::{HasValueEdge, SmgObjectId};
use crate::errors::{Result, SmgError};
use crate::graph::Smg;

/// Relation between the two joined heaps, as far as the join got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStatus {
    Equal,
    LeftEntail,
    RightEntail,
    Incomparable,
}

/// Driver for the two-heap join.
pub struct SmgJoin<'a> {
    left: &'a Smg,
    right: &'a Smg,
    status: JoinStatus,
}

impl<'a> SmgJoin<'a> {
    pub fn new(left: &'a Smg, right: &'a Smg) -> Self {
        Self {
            left,
            right,
            status: JoinStatus::Equal,
        }
    }

    #[inline]
    pub fn status(&self) -> JoinStatus {
        self.status
    }

    /// Merge the two heaps into one graph covering both.
    pub fn join(self) -> Result<Smg> {
        if self.left == self.right {
            return Ok(self.left.clone());
        }
        Err(SmgError::UnsupportedJoin(
            "field-wise heap join is not implemented".into(),
        ))
    }
}

/// Per-field join primitive: the has-value edges of an object that
/// carry something other than the zero value, sorted by offset. Fields
/// holding zero on one side only are reconciled by the (future) join of
/// the remaining edges.
pub fn non_null_field_edges(smg: &Smg, object: SmgObjectId) -> Vec<HasValueEdge> {
    smg.has_value_edges(object)
        .into_iter()
        .filter(|e| !e.is_zero())
        .collect()
}
