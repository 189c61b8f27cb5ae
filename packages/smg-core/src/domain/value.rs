//! Abstract values
//!
//! A value is an opaque identifier plus a nesting level. Values carry no
//! payload of their own; all meaning comes from the edges of the graph
//! that mention them. The reserved zero value denotes the null/zero bit
//! pattern and always exists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for abstract values. Id 0 is reserved for the zero value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SmgValueId(pub u64);

impl SmgValueId {
    /// The reserved zero/null value.
    pub const ZERO: SmgValueId = SmgValueId(0);

    #[inline]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for SmgValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Abstract value descriptor: identity plus nesting level.
///
/// The nesting level counts how many collapsed list elements the value has
/// been pushed through during abstraction. It is shifted by the pointer
/// retargeting operations and bounded by the minimum length of the segment
/// the value points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmgValue {
    pub id: SmgValueId,
    pub nesting_level: u32,
}

impl SmgValue {
    #[inline]
    pub fn new(id: SmgValueId, nesting_level: u32) -> Self {
        Self { id, nesting_level }
    }

    /// The reserved zero value (id 0, nesting 0).
    #[inline]
    pub fn zero() -> Self {
        Self::new(SmgValueId::ZERO, 0)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.id.is_zero()
    }

    /// Copy with a different nesting level.
    #[inline]
    pub fn with_nesting_level(&self, nesting_level: u32) -> Self {
        Self {
            nesting_level,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_value_is_reserved() {
        let zero = SmgValue::zero();
        assert!(zero.is_zero());
        assert_eq!(zero.nesting_level, 0);
        assert!(!SmgValue::new(SmgValueId(7), 0).is_zero());
    }

    #[test]
    fn test_with_nesting_level_keeps_identity() {
        let v = SmgValue::new(SmgValueId(3), 1);
        let shifted = v.with_nesting_level(2);
        assert_eq!(shifted.id, v.id);
        assert_eq!(shifted.nesting_level, 2);
        // original untouched
        assert_eq!(v.nesting_level, 1);
    }
}
