//! LayoutGraph - the per-run graph store.
//!
//! The store is built once from the caller's node/edge lists and is fixed in
//! topology and mass for the duration of a run. It keeps the topology in
//! petgraph's StableGraph and maintains SoA (Structure of Arrays) buffers for
//! positions, force accumulators, and masses, which the per-iteration force
//! passes walk linearly.

use log::warn;
use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::collections::HashMap;

use super::edge::Edge;
use super::node::{Node, Position};
use crate::error::LayoutError;
use crate::spatial::Particle;

/// The graph state owned by a simulation run.
///
/// Node slots are assigned in input order and are stable for the run, so a
/// slot index doubles as the node's identity inside the engine (the external
/// string id is only needed again when emitting the position map).
#[derive(Debug)]
pub struct LayoutGraph {
    /// Topology. Node weights are unused; edge weights carry the
    /// co-occurrence weight.
    graph: StableGraph<(), f32, Undirected>,

    /// External id per slot, in input order.
    ids: Vec<String>,

    /// Map from external id to petgraph index.
    id_to_index: HashMap<String, NodeIndex>,

    /// Edge list cache as (source slot, target slot, weight), extracted from
    /// the topology once at build time for the per-iteration attraction walk.
    edge_slots: Vec<(u32, u32, f32)>,

    /// X positions (SoA layout).
    pos_x: Vec<f32>,

    /// Y positions (SoA layout).
    pos_y: Vec<f32>,

    /// X force accumulators, reset every iteration.
    force_x: Vec<f32>,

    /// Y force accumulators, reset every iteration.
    force_y: Vec<f32>,

    /// Masses, derived from node sizes at build time.
    mass: Vec<f32>,

    /// Number of input edges dropped because an endpoint id was unknown.
    skipped_edges: u32,
}

impl LayoutGraph {
    /// Build the store from caller-supplied node and edge lists.
    ///
    /// Nodes with non-finite seed coordinates and duplicate ids are rejected.
    /// Edges referencing an unknown node id are skipped (counted and logged),
    /// tolerating client-side node filtering without consistent edge
    /// filtering.
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Result<Self, LayoutError> {
        let mut graph = StableGraph::with_capacity(nodes.len(), edges.len());
        let mut ids = Vec::with_capacity(nodes.len());
        let mut id_to_index = HashMap::with_capacity(nodes.len());
        let mut pos_x = Vec::with_capacity(nodes.len());
        let mut pos_y = Vec::with_capacity(nodes.len());
        let mut mass = Vec::with_capacity(nodes.len());

        for node in nodes {
            if !node.x.is_finite() || !node.y.is_finite() {
                return Err(LayoutError::NonFiniteCoordinate {
                    id: node.id.clone(),
                });
            }
            if id_to_index.contains_key(&node.id) {
                return Err(LayoutError::DuplicateNode {
                    id: node.id.clone(),
                });
            }

            let index = graph.add_node(());
            id_to_index.insert(node.id.clone(), index);
            ids.push(node.id.clone());
            pos_x.push(node.x);
            pos_y.push(node.y);
            mass.push(node.mass());
        }

        let mut skipped_edges = 0u32;
        for edge in edges {
            match (
                id_to_index.get(&edge.source),
                id_to_index.get(&edge.target),
            ) {
                (Some(&source), Some(&target)) => {
                    graph.add_edge(source, target, edge.weight);
                }
                _ => skipped_edges += 1,
            }
        }
        if skipped_edges > 0 {
            warn!("skipped {skipped_edges} edge(s) referencing unknown node ids");
        }

        // Extract the hot edge walk once; slots never change after build.
        let edge_slots = graph
            .edge_references()
            .map(|e| {
                (
                    e.source().index() as u32,
                    e.target().index() as u32,
                    *e.weight(),
                )
            })
            .collect();

        let count = ids.len();
        Ok(Self {
            graph,
            ids,
            id_to_index,
            edge_slots,
            pos_x,
            pos_y,
            force_x: vec![0.0; count],
            force_y: vec![0.0; count],
            mass,
            skipped_edges,
        })
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of live edges (dangling input edges excluded).
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Number of input edges dropped for referencing unknown node ids.
    #[inline]
    pub fn skipped_edges(&self) -> u32 {
        self.skipped_edges
    }

    /// External id of a slot.
    #[inline]
    pub fn id_of(&self, slot: usize) -> &str {
        &self.ids[slot]
    }

    /// Slot of an external id, if present.
    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.id_to_index.get(id).map(|index| index.index())
    }

    /// Position of a slot.
    #[inline]
    pub fn position(&self, slot: usize) -> (f32, f32) {
        (self.pos_x[slot], self.pos_y[slot])
    }

    /// Mass of a slot.
    #[inline]
    pub fn mass(&self, slot: usize) -> f32 {
        self.mass[slot]
    }

    /// Accumulated force on a slot.
    #[inline]
    pub fn force(&self, slot: usize) -> (f32, f32) {
        (self.force_x[slot], self.force_y[slot])
    }

    /// Add to a slot's force accumulator.
    #[inline]
    pub fn add_force(&mut self, slot: usize, fx: f32, fy: f32) {
        self.force_x[slot] += fx;
        self.force_y[slot] += fy;
    }

    /// Zero every force accumulator. Called at the top of each iteration.
    pub fn reset_forces(&mut self) {
        self.force_x.fill(0.0);
        self.force_y.fill(0.0);
    }

    /// Move a slot by a displacement vector.
    #[inline]
    pub fn displace(&mut self, slot: usize, dx: f32, dy: f32) {
        self.pos_x[slot] += dx;
        self.pos_y[slot] += dy;
    }

    /// Edge list as (source slot, target slot, weight).
    #[inline]
    pub fn edges(&self) -> &[(u32, u32, f32)] {
        &self.edge_slots
    }

    /// Iterate current particles (slot, position, mass) for index rebuild.
    pub fn particles(&self) -> impl Iterator<Item = Particle> + '_ {
        (0..self.node_count()).map(|slot| Particle {
            slot,
            x: self.pos_x[slot],
            y: self.pos_y[slot],
            mass: self.mass[slot],
        })
    }

    /// The `{id -> position}` map consumed by renderers.
    pub fn positions_map(&self) -> HashMap<String, Position> {
        self.ids
            .iter()
            .enumerate()
            .map(|(slot, id)| {
                (
                    id.clone(),
                    Position {
                        x: self.pos_x[slot],
                        y: self.pos_y[slot],
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("a", 0.0, 0.0),
            Node::with_size("b", 10.0, 0.0, 2.0),
            Node::new("c", 0.0, 10.0),
        ];
        let edges = vec![
            Edge::new("a", "b"),
            Edge::with_weight("b", "c", 3.0),
            Edge::new("c", "a"),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_build_basic() {
        let (nodes, edges) = triangle();
        let graph = LayoutGraph::build(&nodes, &edges).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.skipped_edges(), 0);
        assert_eq!(graph.position(1), (10.0, 0.0));
        assert_eq!(graph.mass(1), 2.0);
        assert_eq!(graph.id_of(2), "c");
        assert_eq!(graph.slot_of("b"), Some(1));
    }

    #[test]
    fn test_dangling_edges_skipped_and_counted() {
        let (nodes, mut edges) = triangle();
        edges.push(Edge::new("a", "ghost"));
        edges.push(Edge::new("ghost", "phantom"));
        let graph = LayoutGraph::build(&nodes, &edges).unwrap();
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.skipped_edges(), 2);
    }

    #[test]
    fn test_non_finite_seed_rejected() {
        let nodes = vec![Node::new("a", f32::NAN, 0.0)];
        let err = LayoutGraph::build(&nodes, &[]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::NonFiniteCoordinate {
                id: "a".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let nodes = vec![Node::new("a", 0.0, 0.0), Node::new("a", 1.0, 1.0)];
        let err = LayoutGraph::build(&nodes, &[]).unwrap_err();
        assert_eq!(err, LayoutError::DuplicateNode { id: "a".to_string() });
    }

    #[test]
    fn test_empty_graph_allowed() {
        let graph = LayoutGraph::build(&[], &[]).unwrap();
        assert_eq!(graph.node_count(), 0);
        assert!(graph.positions_map().is_empty());
    }

    #[test]
    fn test_forces_accumulate_and_reset() {
        let (nodes, edges) = triangle();
        let mut graph = LayoutGraph::build(&nodes, &edges).unwrap();
        graph.add_force(0, 1.0, -2.0);
        graph.add_force(0, 0.5, 0.5);
        assert_eq!(graph.force(0), (1.5, -1.5));
        graph.reset_forces();
        assert_eq!(graph.force(0), (0.0, 0.0));
    }

    #[test]
    fn test_positions_map_round_trip() {
        let (nodes, edges) = triangle();
        let mut graph = LayoutGraph::build(&nodes, &edges).unwrap();
        graph.displace(0, 5.0, 5.0);
        let map = graph.positions_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["a"].x, 5.0);
        assert_eq!(map["b"].y, 0.0);
    }
}
