//! Domain models for the symbolic memory graph
//!
//! Immutable descriptors with no behavior beyond equality and small
//! copy-on-write builders:
//! - SmgObject: concrete region or abstracted list segment
//! - SmgValue: opaque identifier plus nesting level
//! - HasValueEdge / PointsToEdge: the two edge kinds
//! - TargetSpecifier: pointer role relative to an abstracted segment

pub mod edge;
pub mod object;
pub mod value;

pub use edge::{HasValueEdge, PointsToEdge, TargetSpecifier};
pub use object::{SmgObject, SmgObjectId, SmgObjectKind};
pub use value::{SmgValue, SmgValueId};
