//! Graph behavior options
//!
//! Carried inside each graph snapshot so that derived snapshots behave
//! like the one they were copied from.

use serde::{Deserialize, Serialize};

/// Tunable behavior of a symbolic memory graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SmgOptions {
    /// When a read neither matches an edge exactly nor is fully covered
    /// by zero, return the overlapping sub-edges as a structured
    /// multi-part result instead of materializing a fresh value.
    pub precise_reads: bool,
}

impl Default for SmgOptions {
    fn default() -> Self {
        Self {
            precise_reads: false,
        }
    }
}

impl SmgOptions {
    pub fn with_precise_reads(self, precise_reads: bool) -> Self {
        Self { precise_reads }
    }
}
