//! Graph edges
//!
//! Two edge kinds connect objects and values:
//! - has-value: a bit range of an object currently holds a value;
//! - points-to: a value, read as an address, denotes a location.
//!
//! The target specifier records which role a pointer plays relative to an
//! abstracted list segment. Its admissible values depend on the kind of
//! the target object and are checked when the edge enters a graph.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::object::{SmgObjectId, SmgObjectKind};
use super::value::SmgValueId;

/// Role a pointer plays relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetSpecifier {
    /// Pointer into a concrete region.
    Region,
    /// Pointer at the first node of an abstracted segment.
    First,
    /// Pointer at the last node of a doubly-linked segment.
    Last,
    /// Pointer at every node of an abstracted segment.
    All,
}

impl TargetSpecifier {
    /// Whether this specifier is admissible for a target of the given kind.
    ///
    /// Regions accept only `Region`; singly-linked segments have no
    /// distinguishable last node, so they accept `First` and `All`;
    /// doubly-linked segments accept `First`, `Last` and `All`.
    pub fn allowed_for(&self, kind: &SmgObjectKind) -> bool {
        match kind {
            SmgObjectKind::Region => matches!(self, TargetSpecifier::Region),
            SmgObjectKind::Sll { .. } => {
                matches!(self, TargetSpecifier::First | TargetSpecifier::All)
            }
            SmgObjectKind::Dll { .. } => !matches!(self, TargetSpecifier::Region),
        }
    }
}

impl fmt::Display for TargetSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetSpecifier::Region => "REGION",
            TargetSpecifier::First => "FIRST",
            TargetSpecifier::Last => "LAST",
            TargetSpecifier::All => "ALL",
        };
        write!(f, "{}", s)
    }
}

/// Has-value edge: `[offset, offset + size)` of some object holds `value`.
///
/// The owning object is the key of the edge set this edge lives in, so it
/// is not repeated here. Offsets and sizes are in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HasValueEdge {
    pub value: SmgValueId,
    pub offset: i64,
    pub size_in_bits: u64,
}

impl HasValueEdge {
    #[inline]
    pub fn new(value: SmgValueId, offset: i64, size_in_bits: u64) -> Self {
        Self {
            value,
            offset,
            size_in_bits,
        }
    }

    /// One past the last bit covered by this edge.
    #[inline]
    pub fn end_offset(&self) -> i64 {
        self.offset + self.size_in_bits as i64
    }

    /// Whether this edge intersects `[offset, offset + size)`.
    #[inline]
    pub fn overlaps(&self, offset: i64, size_in_bits: u64) -> bool {
        let field_end = offset + size_in_bits as i64;
        self.offset < field_end && offset < self.end_offset()
    }

    /// Whether this edge covers exactly `[offset, offset + size)`.
    #[inline]
    pub fn matches_range(&self, offset: i64, size_in_bits: u64) -> bool {
        self.offset == offset && self.size_in_bits == size_in_bits
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    /// Copy with a different value.
    #[inline]
    pub fn with_value(&self, value: SmgValueId) -> Self {
        Self { value, ..*self }
    }
}

/// Points-to edge: a value, interpreted as an address, denotes
/// `target` at `offset` in the role given by `specifier`.
///
/// The owning value is the key of the map this edge lives in; a value has
/// at most one points-to edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointsToEdge {
    pub target: SmgObjectId,
    pub offset: i64,
    pub specifier: TargetSpecifier,
}

impl PointsToEdge {
    #[inline]
    pub fn new(target: SmgObjectId, offset: i64, specifier: TargetSpecifier) -> Self {
        Self {
            target,
            offset,
            specifier,
        }
    }

    /// The address of the null object; the zero value carries this edge.
    #[inline]
    pub fn null_address() -> Self {
        Self::new(SmgObjectId::NULL, 0, TargetSpecifier::Region)
    }

    /// Copy with a different target.
    #[inline]
    pub fn with_target(&self, target: SmgObjectId) -> Self {
        Self { target, ..*self }
    }

    /// Copy with a different specifier.
    #[inline]
    pub fn with_specifier(&self, specifier: TargetSpecifier) -> Self {
        Self { specifier, ..*self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specifier_admissibility() {
        let region = SmgObjectKind::Region;
        let sll = SmgObjectKind::Sll {
            min_length: 0,
            next_offset: 0,
        };
        let dll = SmgObjectKind::Dll {
            min_length: 0,
            next_offset: 0,
            prev_offset: 64,
        };

        assert!(TargetSpecifier::Region.allowed_for(&region));
        assert!(!TargetSpecifier::First.allowed_for(&region));

        assert!(TargetSpecifier::First.allowed_for(&sll));
        assert!(TargetSpecifier::All.allowed_for(&sll));
        assert!(!TargetSpecifier::Last.allowed_for(&sll));
        assert!(!TargetSpecifier::Region.allowed_for(&sll));

        assert!(TargetSpecifier::First.allowed_for(&dll));
        assert!(TargetSpecifier::Last.allowed_for(&dll));
        assert!(TargetSpecifier::All.allowed_for(&dll));
        assert!(!TargetSpecifier::Region.allowed_for(&dll));
    }

    #[test]
    fn test_edge_overlap_math() {
        let edge = HasValueEdge::new(SmgValueId(1), 24, 64); // [24, 88)
        assert_eq!(edge.end_offset(), 88);

        assert!(edge.overlaps(0, 25)); // touches first bit
        assert!(edge.overlaps(87, 8)); // touches last bit
        assert!(edge.overlaps(30, 8)); // inside
        assert!(edge.overlaps(0, 256)); // contains
        assert!(!edge.overlaps(0, 24)); // ends exactly at start
        assert!(!edge.overlaps(88, 8)); // starts exactly at end

        assert!(edge.matches_range(24, 64));
        assert!(!edge.matches_range(24, 32));
    }

    #[test]
    fn test_null_address() {
        let pt = PointsToEdge::null_address();
        assert!(pt.target.is_null());
        assert_eq!(pt.offset, 0);
        assert_eq!(pt.specifier, TargetSpecifier::Region);
    }

    #[test]
    fn test_with_builders() {
        let pt = PointsToEdge::new(SmgObjectId(3), 8, TargetSpecifier::First);
        let moved = pt.with_target(SmgObjectId(4)).with_specifier(TargetSpecifier::All);
        assert_eq!(moved.target, SmgObjectId(4));
        assert_eq!(moved.specifier, TargetSpecifier::All);
        assert_eq!(moved.offset, 8);
        assert_eq!(pt.target, SmgObjectId(3));
    }
}
