//! Per-iteration force passes.
//!
//! Three forces act on every node each iteration:
//! - **Repulsion**: inverse-square n-body force, approximated through the
//!   quad-tree.
//! - **Attraction**: one linear spring per edge pulling its endpoints
//!   together.
//! - **Gravity**: a pull toward the origin, the only centering force; without
//!   it a connected component drifts unbounded under pure repulsion.

use crate::graph::LayoutGraph;
use crate::spatial::{MIN_DISTANCE, QuadTree};

/// Multiplier turning the scaling ratio into the repulsion constant.
const REPULSION_SCALE: f32 = 100.0;

/// Divisor of the linear spring: attraction magnitude is `distance / 100`.
const SPRING_DIVISOR: f32 = 100.0;

/// Repulsion constant for a given scaling ratio.
#[inline]
pub fn repulsion_constant(scaling_ratio: f32) -> f32 {
    scaling_ratio * REPULSION_SCALE
}

/// Accumulate Barnes-Hut repulsion on every node.
pub fn apply_repulsion(graph: &mut LayoutGraph, tree: &QuadTree, scaling_ratio: f32) {
    let repulsion = repulsion_constant(scaling_ratio);
    for slot in 0..graph.node_count() {
        let (x, y) = graph.position(slot);
        let mass = graph.mass(slot);
        let (fx, fy) = tree.repulsion(slot, x, y, mass, repulsion);
        graph.add_force(slot, fx, fy);
    }
}

/// Accumulate one spring per edge, as equal-and-opposite pulls on source and
/// target.
///
/// Magnitude is `distance / 100`, independent of the edge weight (the weight
/// is accepted and stored but deliberately unused, matching the baseline
/// model). Edges with unknown endpoints were already dropped at graph build.
pub fn apply_attraction(graph: &mut LayoutGraph) {
    for i in 0..graph.edges().len() {
        let (source, target, _weight) = graph.edges()[i];
        let (source, target) = (source as usize, target as usize);
        let (sx, sy) = graph.position(source);
        let (tx, ty) = graph.position(target);
        // (dx / d) * (d / 100) reduces to dx / 100; a zero-length edge
        // contributes nothing.
        let fx = (tx - sx) / SPRING_DIVISOR;
        let fy = (ty - sy) / SPRING_DIVISOR;
        graph.add_force(source, fx, fy);
        graph.add_force(target, -fx, -fy);
    }
}

/// Accumulate gravity: every node is pulled toward the origin with magnitude
/// `gravity * mass`, direction normalized by the origin distance (floored at
/// [`MIN_DISTANCE`]).
pub fn apply_gravity(graph: &mut LayoutGraph, gravity: f32) {
    if gravity == 0.0 {
        return;
    }
    for slot in 0..graph.node_count() {
        let (x, y) = graph.position(slot);
        let d = (x * x + y * y).sqrt().max(MIN_DISTANCE);
        let factor = gravity * graph.mass(slot) / d;
        graph.add_force(slot, -x * factor, -y * factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use crate::spatial::QuadTreeConfig;

    fn two_nodes(edges: &[Edge]) -> LayoutGraph {
        let nodes = vec![Node::new("a", 0.0, 0.0), Node::new("b", 10.0, 0.0)];
        LayoutGraph::build(&nodes, edges).unwrap()
    }

    #[test]
    fn test_attraction_equal_and_opposite() {
        let mut graph = two_nodes(&[Edge::new("a", "b")]);
        apply_attraction(&mut graph);
        let (ax, ay) = graph.force(0);
        let (bx, by) = graph.force(1);
        assert!((ax - 0.1).abs() < 1e-6);
        assert_eq!(ay, 0.0);
        assert!((bx + 0.1).abs() < 1e-6);
        assert_eq!(by, 0.0);
    }

    #[test]
    fn test_attraction_ignores_weight() {
        let mut light = two_nodes(&[Edge::new("a", "b")]);
        let mut heavy = two_nodes(&[Edge::with_weight("a", "b", 50.0)]);
        apply_attraction(&mut light);
        apply_attraction(&mut heavy);
        assert_eq!(light.force(0), heavy.force(0));
        assert_eq!(light.force(1), heavy.force(1));
    }

    #[test]
    fn test_dangling_edge_contributes_nothing() {
        // A 2-node graph with a dangling edge must accumulate exactly the
        // forces of the same graph without that edge.
        let mut with_dangling = two_nodes(&[Edge::new("a", "b"), Edge::new("a", "ghost")]);
        let mut without = two_nodes(&[Edge::new("a", "b")]);
        assert_eq!(with_dangling.skipped_edges(), 1);

        apply_attraction(&mut with_dangling);
        apply_attraction(&mut without);
        assert_eq!(with_dangling.force(0), without.force(0));
        assert_eq!(with_dangling.force(1), without.force(1));
    }

    #[test]
    fn test_gravity_magnitude_and_direction() {
        let nodes = vec![Node::with_size("a", 30.0, 40.0, 2.0)];
        let mut graph = LayoutGraph::build(&nodes, &[]).unwrap();
        apply_gravity(&mut graph, 1.5);
        let (fx, fy) = graph.force(0);
        // |F| = gravity * mass, pointing back along (-30, -40) / 50.
        assert!((fx - (1.5 * 2.0 * -30.0 / 50.0)).abs() < 1e-5);
        assert!((fy - (1.5 * 2.0 * -40.0 / 50.0)).abs() < 1e-5);
    }

    #[test]
    fn test_gravity_at_origin_is_finite() {
        let nodes = vec![Node::new("a", 0.0, 0.0)];
        let mut graph = LayoutGraph::build(&nodes, &[]).unwrap();
        apply_gravity(&mut graph, 1.0);
        let (fx, fy) = graph.force(0);
        assert_eq!((fx, fy), (0.0, 0.0));
    }

    #[test]
    fn test_repulsion_pushes_apart() {
        let mut graph = two_nodes(&[]);
        let particles: Vec<_> = graph.particles().collect();
        let tree = QuadTree::build(&particles, QuadTreeConfig::default());
        apply_repulsion(&mut graph, &tree, 10.0);
        let (ax, _) = graph.force(0);
        let (bx, _) = graph.force(1);
        // repulsion = 10 * 100, d = 10 -> magnitude 10 on each, away from
        // the other node.
        assert!((ax + 10.0).abs() < 1e-4);
        assert!((bx - 10.0).abs() < 1e-4);
    }
}
