//! Cooccur Layout - force-directed layout engine for co-occurrence networks.
//!
//! This crate computes 2D coordinates for a co-occurrence network (nodes are
//! entities, edge weight reflects how often two entities appear together) so
//! it can be rendered interactively. It is the algorithmic core of a larger
//! document-analysis pipeline; rendering, hit-testing, and network
//! construction live in its collaborators.
//!
//! # Architecture
//!
//! - `graph`: input shapes and the per-run LayoutGraph store (petgraph
//!   topology + SoA position/force/mass buffers)
//! - `spatial`: Barnes-Hut quad-tree for O(n log n) repulsion
//! - `layout`: force model and the simulation driver (cooling schedule,
//!   run lifecycle)
//! - `worker`: the message-passing execution boundary (thread + event
//!   channel, cooperative cancellation)
//!
//! # Usage
//!
//! Asynchronous, over the event channel:
//!
//! ```no_run
//! use cooccur_layout::{LayoutEvent, LayoutInput, worker};
//!
//! let input: LayoutInput = serde_json::from_str(r#"{
//!     "nodes": [
//!         {"id": "alice", "x": 0.0, "y": 0.0, "size": 3.0},
//!         {"id": "bob", "x": 10.0, "y": 0.0}
//!     ],
//!     "edges": [{"source": "alice", "target": "bob", "weight": 2.0}]
//! }"#).unwrap();
//!
//! let handle = worker::spawn(input);
//! for event in handle.events().iter() {
//!     match event {
//!         LayoutEvent::Progress(percent) => println!("{percent}%"),
//!         LayoutEvent::Complete(positions) => println!("{} nodes placed", positions.len()),
//!         LayoutEvent::Cancelled => println!("cancelled"),
//!         LayoutEvent::Error(error) => eprintln!("{error}"),
//!     }
//! }
//! handle.join();
//! ```
//!
//! Or synchronously via [`run_layout`].

pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;
pub mod worker;

use std::collections::HashMap;
use std::sync::atomic::AtomicBool;

pub use error::LayoutError;
pub use graph::{Edge, LayoutGraph, Node, Position};
pub use layout::{LayoutSettings, Simulation, SimulationState};
pub use spatial::{Particle, QuadTree, QuadTreeConfig};
pub use worker::{LayoutEvent, LayoutHandle, LayoutInput};

/// Run a layout to completion on the calling thread.
///
/// Convenient for batch callers that neither report progress nor cancel; the
/// worker boundary in [`worker`] wraps the same machinery in a thread and an
/// event channel.
pub fn run_layout(input: LayoutInput) -> Result<HashMap<String, Position>, LayoutError> {
    let graph = LayoutGraph::build(&input.nodes, &input.edges)?;
    let mut simulation = Simulation::new(graph, input.settings)?;
    simulation.run(&AtomicBool::new(false), |_| {});
    Ok(simulation.positions())
}
