//! Edge input record.
//!
//! Edges are co-occurrence links between nodes. An edge is a reference pair
//! into the node set, not an owned entity: an edge whose endpoint id is
//! absent from the node set is inert (it contributes no force) rather than
//! an error.

use serde::{Deserialize, Serialize};

/// An edge as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Id of the source node.
    pub source: String,
    /// Id of the target node.
    pub target: String,
    /// Co-occurrence weight (default: 1). Stored on the topology but not
    /// used by the attraction force, matching the baseline spring model.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

fn default_weight() -> f32 {
    1.0
}

impl Edge {
    /// Create an edge with the default weight.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight: default_weight(),
        }
    }

    /// Create an edge with an explicit weight.
    pub fn with_weight(source: impl Into<String>, target: impl Into<String>, weight: f32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            weight,
        }
    }
}
