//! Node input record and related types.
//!
//! Nodes are the vertices of the co-occurrence network. Each node has:
//! - A stable, opaque string identifier (typically an entity name)
//! - A seed position (x, y) in layout space
//! - A size, from which the simulation mass is derived

use serde::{Deserialize, Serialize};

/// A node as supplied by the caller.
///
/// The node set is fixed for the duration of a run; only positions (held
/// internally) change as the simulation proceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Stable unique identifier. The final position map is keyed by this.
    pub id: String,
    /// Seed X coordinate.
    pub x: f32,
    /// Seed Y coordinate.
    pub y: f32,
    /// Visual size, used to derive the node's mass (default: 1).
    #[serde(default = "default_size")]
    pub size: f32,
}

fn default_size() -> f32 {
    1.0
}

impl Node {
    /// Create a node with the default size.
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            size: default_size(),
        }
    }

    /// Create a node with an explicit size.
    pub fn with_size(id: impl Into<String>, x: f32, y: f32, size: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            size,
        }
    }

    /// Simulation mass derived from the supplied size.
    ///
    /// Mass must be positive; a zero, negative, or non-finite size falls
    /// back to 1.
    #[inline]
    pub fn mass(&self) -> f32 {
        if self.size.is_finite() && self.size > 0.0 {
            self.size
        } else {
            1.0
        }
    }
}

/// A computed 2D position, keyed by node id in the final position map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}
