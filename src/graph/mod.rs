//! Graph data structures for a layout run.
//!
//! This module provides the caller-facing node/edge input shapes and the
//! per-run LayoutGraph store, which keeps topology in petgraph's StableGraph
//! with Structure of Arrays (SoA) buffers for positions, forces, and masses
//! for cache-friendly access in the per-iteration force passes.

mod edge;
mod node;
mod store;

pub use edge::Edge;
pub use node::{Node, Position};
pub use store::LayoutGraph;
