//! Error types for smg-core
//!
//! Provides unified error handling across the crate. Every variant here
//! signals a caller bug or a broken internal invariant; the one
//! "expected" negative outcome of the crate — the inequality prover
//! failing to prove — is a plain `false`, never an error.

use thiserror::Error;

/// Main error type for symbolic-memory-graph operations
#[derive(Debug, Error)]
pub enum SmgError {
    /// Access outside an object's declared bounds. Fatal caller bug;
    /// accesses are never clamped.
    #[error("out-of-bounds access: {0}")]
    OutOfBounds(String),

    /// Operation names an object the graph does not contain.
    #[error("unknown object: {0}")]
    UnknownObject(String),

    /// Operation names a value the graph does not contain.
    #[error("unknown value: {0}")]
    UnknownValue(String),

    /// Target specifier not admissible for the target object's kind.
    #[error("target specifier mismatch: {0}")]
    SpecifierMismatch(String),

    /// Structurally ill-formed request, e.g. a has-value edge on an
    /// invalid object or a second points-to edge for a value.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A whole-graph invariant failed. Raised only by the consistency
    /// checker; carries a JSON dump of the offending snapshot.
    #[error("inconsistent SMG: {reason}")]
    Inconsistent { reason: String, dump: String },

    /// The two-heap join is not implemented.
    #[error("join unsupported: {0}")]
    UnsupportedJoin(String),
}

impl SmgError {
    /// Create an out-of-bounds error
    pub fn out_of_bounds(msg: impl Into<String>) -> Self {
        SmgError::OutOfBounds(msg.into())
    }

    /// Create an unknown-object error
    pub fn unknown_object(msg: impl Into<String>) -> Self {
        SmgError::UnknownObject(msg.into())
    }

    /// Create an unknown-value error
    pub fn unknown_value(msg: impl Into<String>) -> Self {
        SmgError::UnknownValue(msg.into())
    }

    /// Create a specifier-mismatch error
    pub fn specifier_mismatch(msg: impl Into<String>) -> Self {
        SmgError::SpecifierMismatch(msg.into())
    }

    /// Create an invalid-operation error
    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        SmgError::InvalidOperation(msg.into())
    }
}

/// Result type alias for smg-core operations
pub type Result<T> = std::result::Result<T, SmgError>;
