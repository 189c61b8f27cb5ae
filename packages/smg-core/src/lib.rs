//! Symbolic Memory Graph core
//!
//! Heap-abstraction layer of a static program verifier. A graph value
//! represents, at one program point, the set of all concrete memory
//! states still considered possible — including unboundedly long linked
//! structures collapsed into finite abstracted list segments.
//!
//! ## Components
//!
//! - [`domain`] — immutable descriptors: objects (regions and list
//!   segments), values, the two edge kinds, target specifiers
//! - [`graph::Smg`] — the persistent graph with all structural
//!   operations; every mutator returns a new graph sharing unchanged
//!   structure, so snapshots are free to hand to concurrent readers
//! - [`consistency`] — whole-graph invariant audit for debug builds
//! - [`nequality`] — sound-but-incomplete proof that two addresses can
//!   never be equal
//! - [`join`] — structural placeholder for the two-heap merge
//!
//! ## Example
//!
//! ```
//! use smg_core::{Smg, SmgObject, SmgObjectId, SmgValueId, ReadResult};
//!
//! let object = SmgObjectId(1);
//! let smg = Smg::default()
//!     .copy_and_add_object(SmgObject::region(object, 256))
//!     .unwrap();
//! let smg = smg.write_value(object, 0, 256, SmgValueId::ZERO).unwrap();
//! let (smg, result) = smg.read_value(object, 64, 64).unwrap();
//! assert_eq!(result, ReadResult::Value(SmgValueId::ZERO));
//! # let _ = smg;
//! ```

pub mod config;
pub mod consistency;
pub mod domain;
pub mod errors;
pub mod graph;
pub mod join;
pub mod nequality;

pub use config::SmgOptions;
pub use domain::{
    HasValueEdge, PointsToEdge, SmgObject, SmgObjectId, SmgObjectKind, SmgValue, SmgValueId,
    TargetSpecifier,
};
pub use errors::{Result, SmgError};
pub use graph::{NestingShift, ReadResult, Smg};
pub use join::{JoinStatus, SmgJoin};
pub use nequality::prove_inequality;
