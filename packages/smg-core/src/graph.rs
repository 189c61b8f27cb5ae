//! Symbolic Memory Graph
//!
//! Persistent graph over memory objects and abstract values with two edge
//! kinds: has-value (a bit range of an object holds a value) and
//! points-to (a value, read as an address, denotes a location). The
//! graph represents, at one program point, every concrete memory state
//! the analysis still considers possible.
//!
//! ## Memory model
//!
//! ```text
//! Smg ::= Objects × Values × HasValueEdges × PointsToEdges
//!
//! Objects       = ObjectId → SmgObject
//! Values        = ValueId  → SmgValue
//! HasValueEdges = ObjectId → {HasValueEdge}
//! PointsToEdges = ValueId  → PointsToEdge      (at most one per value)
//! ```
//!
//! Two derived occurrence indices — values held per object, and pointers
//! aimed per target object — exist only for fast lookup and must always
//! equal what a from-scratch scan of the edges would compute. They are
//! updated exclusively through the private `inc_*`/`dec_*` helpers, in
//! the same call as the edge mutation they mirror.
//!
//! ## Copy-on-write
//!
//! Every public mutator returns a new graph; the maps are persistent
//! tries, so the copy shares all unchanged structure and snapshots can
//! be handed to concurrent readers without locking.

use rpds::{HashTrieMap, HashTrieSet};
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::config::SmgOptions;
use crate::domain::{
    HasValueEdge, PointsToEdge, SmgObject, SmgObjectId, SmgValue, SmgValueId, TargetSpecifier,
};
use crate::errors::{Result, SmgError};

/// How pointer retargeting shifts nesting levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingShift {
    Keep,
    Increment,
    Decrement,
}

/// Outcome of a field read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// The field is summarized by a single value.
    Value(SmgValueId),
    /// The field is covered by several sub-edges (precise reads only).
    /// Sorted by offset; adjacent zero parts are coalesced.
    Parts(Vec<HasValueEdge>),
}

/// Persistent symbolic memory graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Smg {
    pub(crate) objects: HashTrieMap<SmgObjectId, SmgObject>,
    pub(crate) values: HashTrieMap<SmgValueId, SmgValue>,
    pub(crate) hv_edges: HashTrieMap<SmgObjectId, HashTrieSet<HasValueEdge>>,
    pub(crate) pt_edges: HashTrieMap<SmgValueId, PointsToEdge>,
    /// Derived: object → value → number of fields of that object holding it.
    pub(crate) values_in_object: HashTrieMap<SmgObjectId, HashTrieMap<SmgValueId, usize>>,
    /// Derived: target object → pointer value → stored occurrences of it.
    pub(crate) pointers_toward: HashTrieMap<SmgObjectId, HashTrieMap<SmgValueId, usize>>,
    pub(crate) next_value_id: u64,
    pub(crate) options: SmgOptions,
}

impl Default for Smg {
    fn default() -> Self {
        Self::new(SmgOptions::default())
    }
}

impl Smg {
    /// Empty graph containing only the null object and the zero value.
    /// The zero value addresses the null object.
    pub fn new(options: SmgOptions) -> Self {
        let null = SmgObject::null_object();
        let zero = SmgValue::zero();
        Self {
            objects: HashTrieMap::new().insert(null.id, null),
            values: HashTrieMap::new().insert(zero.id, zero),
            hv_edges: HashTrieMap::new(),
            pt_edges: HashTrieMap::new().insert(zero.id, PointsToEdge::null_address()),
            values_in_object: HashTrieMap::new(),
            pointers_toward: HashTrieMap::new(),
            next_value_id: 1,
            options,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════════

    #[inline]
    pub fn options(&self) -> &SmgOptions {
        &self.options
    }

    #[inline]
    pub fn object(&self, id: SmgObjectId) -> Option<&SmgObject> {
        self.objects.get(&id)
    }

    #[inline]
    pub fn value(&self, id: SmgValueId) -> Option<&SmgValue> {
        self.values.get(&id)
    }

    #[inline]
    pub fn contains_object(&self, id: SmgObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    #[inline]
    pub fn contains_value(&self, id: SmgValueId) -> bool {
        self.values.contains_key(&id)
    }

    /// Whether the object exists and is valid.
    #[inline]
    pub fn is_valid(&self, id: SmgObjectId) -> bool {
        self.objects.get(&id).map_or(false, |o| o.valid)
    }

    /// A value is a pointer iff it carries a points-to edge.
    #[inline]
    pub fn is_pointer(&self, id: SmgValueId) -> bool {
        self.pt_edges.contains_key(&id)
    }

    #[inline]
    pub fn points_to_edge(&self, id: SmgValueId) -> Option<PointsToEdge> {
        self.pt_edges.get(&id).copied()
    }

    #[inline]
    pub fn object_count(&self) -> usize {
        self.objects.size()
    }

    #[inline]
    pub fn value_count(&self) -> usize {
        self.values.size()
    }

    /// All object ids, sorted.
    pub fn object_ids(&self) -> Vec<SmgObjectId> {
        let mut ids: Vec<_> = self.objects.keys().copied().collect();
        ids.sort();
        ids
    }

    /// All value ids, sorted.
    pub fn value_ids(&self) -> Vec<SmgValueId> {
        let mut ids: Vec<_> = self.values.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Has-value edges of one object, sorted by offset.
    pub fn has_value_edges(&self, object: SmgObjectId) -> Vec<HasValueEdge> {
        let mut edges: Vec<HasValueEdge> = self
            .hv_edges
            .get(&object)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        edges.sort_by_key(|e| (e.offset, e.size_in_bits, e.value));
        edges
    }

    /// Values stored in fields of `object` with their occurrence counts, sorted.
    pub fn stored_values_in(&self, object: SmgObjectId) -> Vec<(SmgValueId, usize)> {
        let mut row: Vec<_> = self
            .values_in_object
            .get(&object)
            .map(|m| m.iter().map(|(v, c)| (*v, *c)).collect())
            .unwrap_or_default();
        row.sort();
        row
    }

    /// Pointer values aimed at `target` with their stored occurrence counts, sorted.
    pub fn pointers_toward(&self, target: SmgObjectId) -> Vec<(SmgValueId, usize)> {
        let mut row: Vec<_> = self
            .pointers_toward
            .get(&target)
            .map(|m| m.iter().map(|(v, c)| (*v, *c)).collect())
            .unwrap_or_default();
        row.sort();
        row
    }

    /// Whether anything stored in some field still points at `target`.
    pub fn has_pointers_toward(&self, target: SmgObjectId) -> bool {
        self.pointers_toward
            .get(&target)
            .map_or(false, |row| row.size() > 0)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Additions (idempotent)
    // ═══════════════════════════════════════════════════════════════════════

    /// Add an object. Re-adding the identical descriptor is a no-op;
    /// rebinding an id to a different descriptor is a caller bug.
    pub fn copy_and_add_object(&self, object: SmgObject) -> Result<Smg> {
        if let Some(existing) = self.objects.get(&object.id) {
            if *existing == object {
                return Ok(self.clone());
            }
            return Err(SmgError::invalid_operation(format!(
                "{} is already bound to a different descriptor",
                object.id
            )));
        }
        let mut next = self.clone();
        next.objects = next.objects.insert(object.id, object);
        Ok(next)
    }

    /// Add a value. Re-adding the identical descriptor is a no-op.
    pub fn copy_and_add_value(&self, value: SmgValue) -> Result<Smg> {
        if let Some(existing) = self.values.get(&value.id) {
            if *existing == value {
                return Ok(self.clone());
            }
            return Err(SmgError::invalid_operation(format!(
                "{} is already bound to a different descriptor",
                value.id
            )));
        }
        let mut next = self.clone();
        next.values = next.values.insert(value.id, value);
        next.next_value_id = next.next_value_id.max(value.id.0 + 1);
        Ok(next)
    }

    /// Allocate and add a fresh, unconstrained value at nesting 0.
    pub fn copy_and_add_fresh_value(&self) -> (Smg, SmgValue) {
        let value = SmgValue::new(SmgValueId(self.next_value_id), 0);
        let mut next = self.clone();
        next.values = next.values.insert(value.id, value);
        next.next_value_id += 1;
        (next, value)
    }

    /// Add a has-value edge; updates the occurrence indices in the same
    /// transaction. Adding a present edge is a no-op.
    pub fn copy_and_add_hv_edge(&self, object: SmgObjectId, edge: HasValueEdge) -> Result<Smg> {
        let mut next = self.clone();
        next.attach_hv_edge(object, edge)?;
        Ok(next)
    }

    /// Remove a has-value edge; absent edges are a no-op.
    pub fn copy_and_remove_hv_edge(&self, object: SmgObjectId, edge: HasValueEdge) -> Result<Smg> {
        let mut next = self.clone();
        next.detach_hv_edge(object, edge);
        Ok(next)
    }

    /// Add a points-to edge for `value`. Adding the identical edge is a
    /// no-op; a value carries at most one points-to edge.
    pub fn copy_and_add_pt_edge(&self, value: SmgValueId, edge: PointsToEdge) -> Result<Smg> {
        let mut next = self.clone();
        next.attach_pt_edge(value, edge)?;
        Ok(next)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Field write
    // ═══════════════════════════════════════════════════════════════════════

    /// Bit-precise field write with overlap resolution.
    ///
    /// Writing the zero value into a range already fully covered by zero
    /// edges returns the graph unchanged. Otherwise every overlapping
    /// non-zero edge is removed, every overlapping zero edge is cut down
    /// to its remainders outside the written range, and the new edge is
    /// inserted. Edges disjoint from the range are never touched.
    pub fn write_value(
        &self,
        object: SmgObjectId,
        offset: i64,
        size_in_bits: u64,
        value: SmgValueId,
    ) -> Result<Smg> {
        let obj = self.field_access_target(object, offset, size_in_bits, "write")?;
        if !obj.valid {
            return Err(SmgError::invalid_operation(format!(
                "write into invalid object {}",
                object
            )));
        }
        if !self.contains_value(value) {
            return Err(SmgError::unknown_value(format!("{}", value)));
        }

        let edges = self.has_value_edges(object);
        if value.is_zero() && covered_by_zero(&edges, offset, size_in_bits) {
            return Ok(self.clone());
        }

        trace!(%object, offset, size_in_bits, %value, "write_value");
        let mut next = self.clone();
        for edge in edges.iter().filter(|e| e.overlaps(offset, size_in_bits)) {
            next.detach_hv_edge(object, *edge);
            if edge.is_zero() {
                // keep the parts of the zero edge outside the written range
                if edge.offset < offset {
                    let left = HasValueEdge::new(
                        SmgValueId::ZERO,
                        edge.offset,
                        (offset - edge.offset) as u64,
                    );
                    next.attach_hv_edge(object, left)?;
                }
                let field_end = offset + size_in_bits as i64;
                if edge.end_offset() > field_end {
                    let right = HasValueEdge::new(
                        SmgValueId::ZERO,
                        field_end,
                        (edge.end_offset() - field_end) as u64,
                    );
                    next.attach_hv_edge(object, right)?;
                }
            }
        }
        next.attach_hv_edge(object, HasValueEdge::new(value, offset, size_in_bits))?;
        Ok(next)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Field read
    // ═══════════════════════════════════════════════════════════════════════

    /// Read re-interpretation of a field.
    ///
    /// Tiers: exact edge match; full zero coverage; the multi-part result
    /// when precise reads are enabled and something overlaps; otherwise a
    /// fresh unconstrained value is materialized and stored at the field.
    /// The last tier is the only place new values without prior structure
    /// come from, hence the returned graph.
    pub fn read_value(
        &self,
        object: SmgObjectId,
        offset: i64,
        size_in_bits: u64,
    ) -> Result<(Smg, ReadResult)> {
        let obj = self.field_access_target(object, offset, size_in_bits, "read")?;
        if !obj.valid {
            return Err(SmgError::invalid_operation(format!(
                "read from invalid object {}",
                object
            )));
        }

        let edges = self.has_value_edges(object);

        if let Some(exact) = edges.iter().find(|e| e.matches_range(offset, size_in_bits)) {
            return Ok((self.clone(), ReadResult::Value(exact.value)));
        }

        if covered_by_zero(&edges, offset, size_in_bits) {
            return Ok((self.clone(), ReadResult::Value(SmgValueId::ZERO)));
        }

        if self.options.precise_reads {
            let overlapping: Vec<HasValueEdge> = edges
                .iter()
                .filter(|e| e.overlaps(offset, size_in_bits))
                .copied()
                .collect();
            if !overlapping.is_empty() {
                return Ok((self.clone(), ReadResult::Parts(coalesce_zero_parts(overlapping))));
            }
        }

        let (mut next, fresh) = self.copy_and_add_fresh_value();
        next.attach_hv_edge(object, HasValueEdge::new(fresh.id, offset, size_in_bits))?;
        debug!(%object, offset, size_in_bits, value = %fresh.id, "materialized fresh value on read");
        Ok((next, ReadResult::Value(fresh.id)))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Pointer retargeting (abstraction / materialization support)
    // ═══════════════════════════════════════════════════════════════════════

    /// Redirect every pointer aimed at `old` to `new`, keeping nesting
    /// levels. Self-pointers of `old` are skipped.
    pub fn copy_and_replace_all_pointers_toward(
        &self,
        old: SmgObjectId,
        new: SmgObjectId,
    ) -> Result<Smg> {
        self.replace_pointers(old, new, NestingShift::Keep, false)
    }

    /// Redirect pointers from `old` to `new`, incrementing nesting levels
    /// (used when collapsing a node into a segment). When
    /// `switch_first_to_all` is set, FIRST pointers degrade to ALL;
    /// otherwise they are preserved.
    pub fn copy_and_replace_all_pointers_toward_incrementing(
        &self,
        old: SmgObjectId,
        new: SmgObjectId,
        switch_first_to_all: bool,
    ) -> Result<Smg> {
        self.replace_pointers(old, new, NestingShift::Increment, switch_first_to_all)
    }

    /// Redirect pointers from `old` to `new`, decrementing nesting levels
    /// (used when materializing a node out of a segment).
    pub fn copy_and_replace_all_pointers_toward_decrementing(
        &self,
        old: SmgObjectId,
        new: SmgObjectId,
    ) -> Result<Smg> {
        self.replace_pointers(old, new, NestingShift::Decrement, false)
    }

    fn replace_pointers(
        &self,
        old: SmgObjectId,
        new: SmgObjectId,
        shift: NestingShift,
        switch_first_to_all: bool,
    ) -> Result<Smg> {
        if !self.contains_object(old) {
            return Err(SmgError::unknown_object(format!("{}", old)));
        }
        let new_obj = *self
            .objects
            .get(&new)
            .ok_or_else(|| SmgError::unknown_object(format!("{}", new)))?;

        // pointers held inside `old` itself stay with the caller
        let self_pointers: FxHashSet<SmgValueId> = self
            .values_in_object
            .get(&old)
            .map(|row| row.keys().copied().collect())
            .unwrap_or_default();

        let mut moved: Vec<(SmgValueId, PointsToEdge)> = self
            .pt_edges
            .iter()
            .filter(|&(v, pt)| pt.target == old && !self_pointers.contains(v))
            .map(|(v, pt)| (*v, *pt))
            .collect();
        moved.sort_by_key(|(v, _)| *v);

        debug!(%old, %new, count = moved.len(), ?shift, "retargeting pointers");
        let mut next = self.clone();
        for (vid, pt) in moved {
            let specifier = rederive_specifier(pt.specifier, &new_obj, switch_first_to_all);
            let value = *next
                .values
                .get(&vid)
                .ok_or_else(|| SmgError::unknown_value(format!("{}", vid)))?;
            let nesting = shifted_nesting(value.nesting_level, shift, &new_obj);
            next.values = next.values.insert(vid, value.with_nesting_level(nesting));
            next.pt_edges = next
                .pt_edges
                .insert(vid, pt.with_target(new).with_specifier(specifier));
            next.move_pointer_occurrences(old, new, vid);
        }
        Ok(next)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Invalidation and removal
    // ═══════════════════════════════════════════════════════════════════════

    /// Detach every has-value edge of `object` and supersede its
    /// descriptor with an invalid one; the object stays in the graph.
    pub fn copy_and_invalidate_object(&self, object: SmgObjectId) -> Result<Smg> {
        if object.is_null() {
            return Err(SmgError::invalid_operation(
                "the null object cannot be invalidated",
            ));
        }
        let obj = *self
            .objects
            .get(&object)
            .ok_or_else(|| SmgError::unknown_object(format!("{}", object)))?;

        debug!(%object, "invalidating object");
        let mut next = self.clone();
        for edge in self.has_value_edges(object) {
            next.detach_hv_edge(object, edge);
        }
        next.objects = next.objects.insert(object, obj.with_valid(false));
        Ok(next)
    }

    /// Drop `object` from the graph entirely, along with its edges and
    /// any points-to edges aimed at it.
    pub fn copy_and_remove_object(&self, object: SmgObjectId) -> Result<Smg> {
        if object.is_null() {
            return Err(SmgError::invalid_operation(
                "the null object cannot be removed",
            ));
        }
        if !self.contains_object(object) {
            return Err(SmgError::unknown_object(format!("{}", object)));
        }
        let mut next = self.clone();
        next.purge_object(object);
        Ok(next)
    }

    /// Drop a value that is no longer stored anywhere.
    pub fn copy_and_remove_value(&self, value: SmgValueId) -> Result<Smg> {
        if value.is_zero() {
            return Err(SmgError::invalid_operation(
                "the zero value cannot be removed",
            ));
        }
        if !self.contains_value(value) {
            return Err(SmgError::unknown_value(format!("{}", value)));
        }
        if self.stored_occurrences(value) > 0 {
            return Err(SmgError::invalid_operation(format!(
                "{} is still stored in some object field",
                value
            )));
        }
        let mut next = self.clone();
        next.detach_pt_edge(value);
        next.values = next.values.remove(&value);
        Ok(next)
    }

    /// Transitive deletion of `target` and everything reachable only
    /// through pointers aimed at it.
    ///
    /// For each removed object the pointers addressing it are collected
    /// from the points-to edges, the objects holding those pointers are
    /// discovered through the occurrence index, and a discovered object
    /// is removed in turn only once no stored pointer is aimed at it
    /// anymore; the reverse pointer index is the source of truth for that
    /// check, so an object still referenced from outside the deleted
    /// region survives.
    pub fn copy_and_remove_object_and_sub_smg(&self, target: SmgObjectId) -> Result<Smg> {
        if target.is_null() {
            return Err(SmgError::invalid_operation(
                "the null object cannot be removed",
            ));
        }
        if !self.contains_object(target) {
            return Err(SmgError::unknown_object(format!("{}", target)));
        }

        let mut next = self.clone();
        let mut queue: VecDeque<SmgObjectId> = VecDeque::new();
        queue.push_back(target);

        while let Some(object) = queue.pop_front() {
            if object.is_null() || !next.contains_object(object) {
                continue;
            }

            // values addressing the object about to disappear
            let mut address_values: Vec<SmgValueId> = next
                .pt_edges
                .iter()
                .filter(|(_, pt)| pt.target == object)
                .map(|(v, _)| *v)
                .collect();
            address_values.sort();

            // objects whose fields hold one of those addresses
            let mut holders: Vec<SmgObjectId> = Vec::new();
            for vid in &address_values {
                for (holder, row) in next.values_in_object.iter() {
                    if *holder != object && row.contains_key(vid) && !holders.contains(holder) {
                        holders.push(*holder);
                    }
                }
            }
            holders.sort();

            let held: Vec<SmgValueId> = next
                .stored_values_in(object)
                .into_iter()
                .map(|(v, _)| v)
                .collect();

            next.purge_object(object);

            // both the addresses of the purged object and the values its
            // fields held may now be stored nowhere; drop those
            for vid in address_values.into_iter().chain(held) {
                if !vid.is_zero()
                    && next.contains_value(vid)
                    && next.stored_occurrences(vid) == 0
                {
                    next.detach_pt_edge(vid);
                    next.values = next.values.remove(&vid);
                }
            }

            for holder in holders {
                if !next.has_pointers_toward(holder) {
                    queue.push_back(holder);
                }
            }
        }
        Ok(next)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Private edge plumbing — the only code touching the occurrence indices
    // ═══════════════════════════════════════════════════════════════════════

    fn field_access_target(
        &self,
        object: SmgObjectId,
        offset: i64,
        size_in_bits: u64,
        what: &str,
    ) -> Result<SmgObject> {
        let obj = *self
            .objects
            .get(&object)
            .ok_or_else(|| SmgError::unknown_object(format!("{}", object)))?;
        if size_in_bits == 0 {
            return Err(SmgError::invalid_operation(format!(
                "zero-sized {} on {}",
                what, object
            )));
        }
        if !obj.contains_range(offset, size_in_bits) {
            return Err(SmgError::out_of_bounds(format!(
                "{} of [{}, {}+{}) bits on {} of size {} bits",
                what, offset, offset, size_in_bits, object, obj.size_in_bits
            )));
        }
        Ok(obj)
    }

    fn attach_hv_edge(&mut self, object: SmgObjectId, edge: HasValueEdge) -> Result<()> {
        let obj = self
            .objects
            .get(&object)
            .ok_or_else(|| SmgError::unknown_object(format!("{}", object)))?;
        if !obj.valid {
            return Err(SmgError::invalid_operation(format!(
                "has-value edge on invalid object {}",
                object
            )));
        }
        if !obj.contains_range(edge.offset, edge.size_in_bits) {
            return Err(SmgError::out_of_bounds(format!(
                "has-value edge [{}, {}) on {} of size {} bits",
                edge.offset,
                edge.end_offset(),
                object,
                obj.size_in_bits
            )));
        }
        if !self.contains_value(edge.value) {
            return Err(SmgError::unknown_value(format!("{}", edge.value)));
        }

        let set = self.hv_edges.get(&object).cloned().unwrap_or_default();
        if set.contains(&edge) {
            return Ok(());
        }
        self.hv_edges = self.hv_edges.insert(object, set.insert(edge));
        self.inc_value_occurrence(object, edge.value);
        if let Some(pt) = self.pt_edges.get(&edge.value).copied() {
            self.inc_pointer_occurrence(pt.target, edge.value);
        }
        Ok(())
    }

    fn detach_hv_edge(&mut self, object: SmgObjectId, edge: HasValueEdge) {
        let Some(set) = self.hv_edges.get(&object) else {
            return;
        };
        if !set.contains(&edge) {
            return;
        }
        let shrunk = set.remove(&edge);
        self.hv_edges = if shrunk.size() == 0 {
            self.hv_edges.remove(&object)
        } else {
            self.hv_edges.insert(object, shrunk)
        };
        self.dec_value_occurrence(object, edge.value);
        if let Some(pt) = self.pt_edges.get(&edge.value).copied() {
            self.dec_pointer_occurrence(pt.target, edge.value);
        }
    }

    fn attach_pt_edge(&mut self, value: SmgValueId, edge: PointsToEdge) -> Result<()> {
        let val = *self
            .values
            .get(&value)
            .ok_or_else(|| SmgError::unknown_value(format!("{}", value)))?;
        let target = *self
            .objects
            .get(&edge.target)
            .ok_or_else(|| SmgError::unknown_object(format!("{}", edge.target)))?;
        if !edge.specifier.allowed_for(&target.kind) {
            return Err(SmgError::specifier_mismatch(format!(
                "{} toward {} ({:?})",
                edge.specifier, edge.target, target.kind
            )));
        }
        if target.is_abstract() && val.nesting_level > target.max_pointer_nesting() {
            return Err(SmgError::invalid_operation(format!(
                "nesting level {} of {} exceeds bound {} of segment {}",
                val.nesting_level,
                value,
                target.max_pointer_nesting(),
                edge.target
            )));
        }
        if let Some(existing) = self.pt_edges.get(&value) {
            if *existing == edge {
                return Ok(());
            }
            return Err(SmgError::invalid_operation(format!(
                "{} already carries a points-to edge",
                value
            )));
        }

        self.pt_edges = self.pt_edges.insert(value, edge);
        // the value may already sit in object fields; seed the reverse
        // pointer index with those occurrences
        let occurrences = self.stored_occurrences(value);
        if occurrences > 0 {
            let row = self
                .pointers_toward
                .get(&edge.target)
                .cloned()
                .unwrap_or_default();
            self.pointers_toward = self
                .pointers_toward
                .insert(edge.target, row.insert(value, occurrences));
        }
        Ok(())
    }

    fn detach_pt_edge(&mut self, value: SmgValueId) {
        let Some(pt) = self.pt_edges.get(&value).copied() else {
            return;
        };
        self.pt_edges = self.pt_edges.remove(&value);
        if let Some(row) = self.pointers_toward.get(&pt.target) {
            let shrunk = row.remove(&value);
            self.pointers_toward = if shrunk.size() == 0 {
                self.pointers_toward.remove(&pt.target)
            } else {
                self.pointers_toward.insert(pt.target, shrunk)
            };
        }
    }

    /// Total stored occurrences of `value` across all object fields.
    fn stored_occurrences(&self, value: SmgValueId) -> usize {
        self.values_in_object
            .iter()
            .filter_map(|(_, row)| row.get(&value).copied())
            .sum()
    }

    fn inc_value_occurrence(&mut self, object: SmgObjectId, value: SmgValueId) {
        let row = self
            .values_in_object
            .get(&object)
            .cloned()
            .unwrap_or_default();
        let count = row.get(&value).copied().unwrap_or(0) + 1;
        self.values_in_object = self.values_in_object.insert(object, row.insert(value, count));
    }

    fn dec_value_occurrence(&mut self, object: SmgObjectId, value: SmgValueId) {
        let Some(row) = self.values_in_object.get(&object) else {
            return;
        };
        let count = row.get(&value).copied().unwrap_or(0);
        let shrunk = if count <= 1 {
            row.remove(&value)
        } else {
            row.insert(value, count - 1)
        };
        self.values_in_object = if shrunk.size() == 0 {
            self.values_in_object.remove(&object)
        } else {
            self.values_in_object.insert(object, shrunk)
        };
    }

    fn inc_pointer_occurrence(&mut self, target: SmgObjectId, value: SmgValueId) {
        let row = self
            .pointers_toward
            .get(&target)
            .cloned()
            .unwrap_or_default();
        let count = row.get(&value).copied().unwrap_or(0) + 1;
        self.pointers_toward = self.pointers_toward.insert(target, row.insert(value, count));
    }

    fn dec_pointer_occurrence(&mut self, target: SmgObjectId, value: SmgValueId) {
        let Some(row) = self.pointers_toward.get(&target) else {
            return;
        };
        let count = row.get(&value).copied().unwrap_or(0);
        let shrunk = if count <= 1 {
            row.remove(&value)
        } else {
            row.insert(value, count - 1)
        };
        self.pointers_toward = if shrunk.size() == 0 {
            self.pointers_toward.remove(&target)
        } else {
            self.pointers_toward.insert(target, shrunk)
        };
    }

    /// Move the stored-occurrence count of `value` from the row of `old`
    /// to the row of `new` when its points-to edge is retargeted.
    fn move_pointer_occurrences(&mut self, old: SmgObjectId, new: SmgObjectId, value: SmgValueId) {
        let Some(row) = self.pointers_toward.get(&old) else {
            return;
        };
        let Some(count) = row.get(&value).copied() else {
            return;
        };
        let shrunk = row.remove(&value);
        self.pointers_toward = if shrunk.size() == 0 {
            self.pointers_toward.remove(&old)
        } else {
            self.pointers_toward.insert(old, shrunk)
        };
        let new_row = self
            .pointers_toward
            .get(&new)
            .cloned()
            .unwrap_or_default();
        let merged = new_row.get(&value).copied().unwrap_or(0) + count;
        self.pointers_toward = self
            .pointers_toward
            .insert(new, new_row.insert(value, merged));
    }

    /// Drop an object, its edges, its index rows and the points-to edges
    /// aimed at it.
    fn purge_object(&mut self, object: SmgObjectId) {
        debug!(%object, "removing object");
        for edge in self.has_value_edges(object) {
            self.detach_hv_edge(object, edge);
        }
        let mut aimed: Vec<SmgValueId> = self
            .pt_edges
            .iter()
            .filter(|(_, pt)| pt.target == object)
            .map(|(v, _)| *v)
            .collect();
        aimed.sort();
        for vid in aimed {
            self.detach_pt_edge(vid);
        }
        self.objects = self.objects.remove(&object);
        self.hv_edges = self.hv_edges.remove(&object);
        self.values_in_object = self.values_in_object.remove(&object);
        self.pointers_toward = self.pointers_toward.remove(&object);
    }
}

/// Specifier of a retargeted pointer, re-derived rather than copied.
fn rederive_specifier(
    old: TargetSpecifier,
    new_target: &SmgObject,
    switch_first_to_all: bool,
) -> TargetSpecifier {
    if !new_target.is_abstract() {
        return TargetSpecifier::Region;
    }
    if old == TargetSpecifier::First {
        return if switch_first_to_all {
            TargetSpecifier::All
        } else {
            TargetSpecifier::First
        };
    }
    if old.allowed_for(&new_target.kind) {
        old
    } else {
        TargetSpecifier::All
    }
}

/// Nesting level after a retargeting shift, clamped to
/// `[0, min_length - 1]` of the new target.
fn shifted_nesting(level: u32, shift: NestingShift, new_target: &SmgObject) -> u32 {
    let shifted = match shift {
        NestingShift::Keep => level,
        NestingShift::Increment => level.saturating_add(1),
        NestingShift::Decrement => level.saturating_sub(1),
    };
    shifted.min(new_target.max_pointer_nesting())
}

/// Sorted-range coverage sweep: do the zero edges of `edges` cover
/// `[offset, offset + size)` without a gap?
fn covered_by_zero(edges: &[HasValueEdge], offset: i64, size_in_bits: u64) -> bool {
    let end = offset + size_in_bits as i64;
    let mut covered = offset;
    for edge in edges.iter().filter(|e| e.is_zero()) {
        if edge.offset > covered {
            break;
        }
        covered = covered.max(edge.end_offset());
        if covered >= end {
            return true;
        }
    }
    false
}

/// Merge runs of contiguous or overlapping zero sub-edges into single
/// zero spans; non-zero parts pass through untouched.
fn coalesce_zero_parts(sorted: Vec<HasValueEdge>) -> Vec<HasValueEdge> {
    let mut out: Vec<HasValueEdge> = Vec::with_capacity(sorted.len());
    for part in sorted {
        if let Some(last) = out.last_mut() {
            if last.is_zero() && part.is_zero() && part.offset <= last.end_offset() {
                let end = last.end_offset().max(part.end_offset());
                last.size_in_bits = (end - last.offset) as u64;
                continue;
            }
        }
        out.push(part);
    }
    out
}
