//! Memory objects
//!
//! An object is either a concrete region or an abstracted list segment
//! that stands for an unbounded number of concrete list nodes. All sizes
//! and offsets are in bits. The reserved null object (id 0) always
//! exists, is permanently invalid and has size 0.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for memory objects. Id 0 is reserved for the null object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SmgObjectId(pub u64);

impl SmgObjectId {
    /// The reserved null object.
    pub const NULL: SmgObjectId = SmgObjectId(0);

    #[inline]
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }
}

impl fmt::Display for SmgObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// What an object stands for: a concrete region or an abstracted segment.
///
/// Linkage offsets locate the next/previous pointer fields inside each
/// collapsed node and are in bits, like every other offset in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SmgObjectKind {
    /// Plain concrete region.
    Region,
    /// Abstracted singly-linked list segment.
    Sll { min_length: u64, next_offset: i64 },
    /// Abstracted doubly-linked list segment.
    Dll {
        min_length: u64,
        next_offset: i64,
        prev_offset: i64,
    },
}

/// Memory object descriptor.
///
/// Descriptors are immutable; graph operations supersede them with
/// modified copies built through the `with_*` builders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmgObject {
    pub id: SmgObjectId,
    /// Object size in bits.
    pub size_in_bits: u64,
    /// Base offset of the object, in bits.
    pub offset: i64,
    /// How many collapsed list elements this object sits under.
    pub nesting_level: u32,
    pub valid: bool,
    pub kind: SmgObjectKind,
}

impl SmgObject {
    /// The reserved null object: permanently invalid, size 0, nesting 0.
    pub fn null_object() -> Self {
        Self {
            id: SmgObjectId::NULL,
            size_in_bits: 0,
            offset: 0,
            nesting_level: 0,
            valid: false,
            kind: SmgObjectKind::Region,
        }
    }

    /// A concrete region of `size_in_bits` bits.
    pub fn region(id: SmgObjectId, size_in_bits: u64) -> Self {
        Self {
            id,
            size_in_bits,
            offset: 0,
            nesting_level: 0,
            valid: true,
            kind: SmgObjectKind::Region,
        }
    }

    /// An abstracted singly-linked list segment.
    pub fn sll(id: SmgObjectId, size_in_bits: u64, min_length: u64, next_offset: i64) -> Self {
        Self {
            id,
            size_in_bits,
            offset: 0,
            nesting_level: 0,
            valid: true,
            kind: SmgObjectKind::Sll {
                min_length,
                next_offset,
            },
        }
    }

    /// An abstracted doubly-linked list segment.
    pub fn dll(
        id: SmgObjectId,
        size_in_bits: u64,
        min_length: u64,
        next_offset: i64,
        prev_offset: i64,
    ) -> Self {
        Self {
            id,
            size_in_bits,
            offset: 0,
            nesting_level: 0,
            valid: true,
            kind: SmgObjectKind::Dll {
                min_length,
                next_offset,
                prev_offset,
            },
        }
    }

    #[inline]
    pub fn is_region(&self) -> bool {
        matches!(self.kind, SmgObjectKind::Region)
    }

    /// Abstracted list segment of either kind.
    #[inline]
    pub fn is_abstract(&self) -> bool {
        !self.is_region()
    }

    /// A doubly-linked segment that may represent an empty list.
    #[inline]
    pub fn is_zero_plus_dll(&self) -> bool {
        matches!(self.kind, SmgObjectKind::Dll { min_length: 0, .. })
    }

    /// Minimum number of concrete nodes this object stands for.
    /// A concrete region always stands for exactly one.
    #[inline]
    pub fn min_length(&self) -> u64 {
        match self.kind {
            SmgObjectKind::Region => 1,
            SmgObjectKind::Sll { min_length, .. } | SmgObjectKind::Dll { min_length, .. } => {
                min_length
            }
        }
    }

    #[inline]
    pub fn next_offset(&self) -> Option<i64> {
        match self.kind {
            SmgObjectKind::Region => None,
            SmgObjectKind::Sll { next_offset, .. } | SmgObjectKind::Dll { next_offset, .. } => {
                Some(next_offset)
            }
        }
    }

    #[inline]
    pub fn prev_offset(&self) -> Option<i64> {
        match self.kind {
            SmgObjectKind::Dll { prev_offset, .. } => Some(prev_offset),
            _ => None,
        }
    }

    /// Largest nesting level a pointer into this object may carry.
    #[inline]
    pub fn max_pointer_nesting(&self) -> u32 {
        self.min_length().saturating_sub(1).min(u32::MAX as u64) as u32
    }

    /// Whether `[offset, offset + size)` lies inside the object.
    #[inline]
    pub fn contains_range(&self, offset: i64, size_in_bits: u64) -> bool {
        offset >= 0 && (offset as u64).saturating_add(size_in_bits) <= self.size_in_bits
    }

    /// Copy with a different validity flag.
    #[inline]
    pub fn with_valid(&self, valid: bool) -> Self {
        Self { valid, ..*self }
    }

    /// Copy with a different nesting level.
    #[inline]
    pub fn with_nesting_level(&self, nesting_level: u32) -> Self {
        Self {
            nesting_level,
            ..*self
        }
    }

    /// Copy with a different minimum length; no-op for regions.
    pub fn with_min_length(&self, new_min: u64) -> Self {
        let kind = match self.kind {
            SmgObjectKind::Region => SmgObjectKind::Region,
            SmgObjectKind::Sll { next_offset, .. } => SmgObjectKind::Sll {
                min_length: new_min,
                next_offset,
            },
            SmgObjectKind::Dll {
                next_offset,
                prev_offset,
                ..
            } => SmgObjectKind::Dll {
                min_length: new_min,
                next_offset,
                prev_offset,
            },
        };
        Self { kind, ..*self }
    }
}
