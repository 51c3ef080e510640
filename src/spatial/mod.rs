//! Spatial indexing for sub-quadratic repulsion.
//!
//! This module provides the Barnes-Hut quad-tree used to approximate
//! long-range repulsion: distant point clusters are treated as single
//! aggregate points (mass + center-of-mass), controlled by the accuracy
//! parameter theta.

mod quadtree;

pub use quadtree::{MIN_DISTANCE, Particle, QuadTree, QuadTreeConfig};
