//! Error types for the layout engine.
//!
//! The force model itself is total by design: degenerate geometry is handled
//! with distance floors and dangling edges are skipped, never raised. Errors
//! exist only at the validation boundary, before a run starts.

use thiserror::Error;

/// Errors produced while validating layout input or settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A settings field is out of range or non-finite.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A node was seeded with a NaN or infinite coordinate.
    #[error("node `{id}` has a non-finite seed coordinate")]
    NonFiniteCoordinate {
        /// The offending node's id.
        id: String,
    },

    /// Two input nodes share the same id.
    #[error("duplicate node id `{id}`")]
    DuplicateNode {
        /// The repeated id.
        id: String,
    },
}
