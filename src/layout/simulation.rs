//! Simulation driver: iteration loop, cooling schedule, state machine.
//!
//! Each iteration rebuilds the quad-tree from current positions, accumulates
//! repulsion, attraction, and gravity, then integrates the net force into a
//! displacement capped at `max_displacement` and scaled by the cooling factor
//! `1 / (1 + sqrt(iteration))`. Termination is purely iteration-count driven;
//! there is no convergence test.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::forces;
use crate::error::LayoutError;
use crate::graph::{LayoutGraph, Position};
use crate::spatial::{Particle, QuadTree, QuadTreeConfig};

/// Progress is reported every this many iterations (plus the final one).
const PROGRESS_STRIDE: u32 = 10;

/// Externally supplied simulation parameters.
///
/// Wire form uses camelCase field names (`scalingRatio`, `maxDisplacement`);
/// omitted fields take the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutSettings {
    /// Number of iterations to run (default: 100).
    pub iterations: u32,
    /// Strength of the pull toward the origin (default: 1).
    pub gravity: f32,
    /// Repulsion scaling; the repulsion constant is `scaling_ratio * 100`
    /// (default: 10).
    pub scaling_ratio: f32,
    /// Cap on per-iteration displacement length, before cooling
    /// (default: 10).
    pub max_displacement: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            iterations: 100,
            gravity: 1.0,
            scaling_ratio: 10.0,
            max_displacement: 10.0,
        }
    }
}

impl LayoutSettings {
    /// Reject malformed settings.
    ///
    /// The policy is reject-not-clamp: zero iterations and non-finite values
    /// fail fast. Negative gravity or scaling are accepted; they are finite,
    /// well-defined inputs (inverted forces).
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.iterations == 0 {
            return Err(LayoutError::InvalidSettings(
                "iterations must be at least 1".to_string(),
            ));
        }
        if !self.gravity.is_finite() {
            return Err(LayoutError::InvalidSettings(
                "gravity must be finite".to_string(),
            ));
        }
        if !self.scaling_ratio.is_finite() {
            return Err(LayoutError::InvalidSettings(
                "scalingRatio must be finite".to_string(),
            ));
        }
        if !self.max_displacement.is_finite() || self.max_displacement <= 0.0 {
            return Err(LayoutError::InvalidSettings(
                "maxDisplacement must be positive and finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    /// Constructed, no iteration run yet.
    Idle,
    /// At least one iteration run, more remain.
    Running,
    /// All iterations run; final positions available.
    Completed,
    /// Stopped at an iteration boundary by the cancellation flag.
    Cancelled,
}

/// The force-directed simulation over one graph.
pub struct Simulation {
    graph: LayoutGraph,
    settings: LayoutSettings,
    tree_config: QuadTreeConfig,
    state: SimulationState,
    iteration: u32,
    /// Particle scratch buffer, refilled on every rebuild.
    particles: Vec<Particle>,
}

impl Simulation {
    /// Create a simulation; fails if the settings are malformed.
    pub fn new(graph: LayoutGraph, settings: LayoutSettings) -> Result<Self, LayoutError> {
        settings.validate()?;
        let capacity = graph.node_count();
        Ok(Self {
            graph,
            settings,
            tree_config: QuadTreeConfig::default(),
            state: SimulationState::Idle,
            iteration: 0,
            particles: Vec::with_capacity(capacity),
        })
    }

    /// Override the spatial index tuning (defaults preserve baseline
    /// behavior).
    pub fn with_tree_config(mut self, config: QuadTreeConfig) -> Self {
        self.tree_config = config;
        self
    }

    /// Current lifecycle state.
    #[inline]
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Iterations run so far.
    #[inline]
    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    /// The settings this run was configured with.
    #[inline]
    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    /// The underlying graph state.
    #[inline]
    pub fn graph(&self) -> &LayoutGraph {
        &self.graph
    }

    /// Run one iteration: rebuild the index, accumulate forces, integrate.
    pub fn step(&mut self) {
        if self.state == SimulationState::Completed || self.state == SimulationState::Cancelled {
            return;
        }
        self.state = SimulationState::Running;

        self.particles.clear();
        self.particles.extend(self.graph.particles());
        let tree = QuadTree::build(&self.particles, self.tree_config);

        self.graph.reset_forces();
        forces::apply_repulsion(&mut self.graph, &tree, self.settings.scaling_ratio);
        forces::apply_attraction(&mut self.graph);
        forces::apply_gravity(&mut self.graph, self.settings.gravity);

        // Cooling: monotonically decreasing global speed makes the layout
        // settle instead of oscillating.
        let speed = 1.0 / (1.0 + (self.iteration as f32).sqrt());
        for slot in 0..self.graph.node_count() {
            let (fx, fy) = self.graph.force(slot);
            let d = (fx * fx + fy * fy).sqrt();
            if d > 0.0 {
                let limited = d.min(self.settings.max_displacement);
                let scale = limited / d * speed;
                self.graph.displace(slot, fx * scale, fy * scale);
            }
        }

        self.iteration += 1;
        if self.iteration >= self.settings.iterations {
            self.state = SimulationState::Completed;
            debug!(
                "layout completed: {} nodes, {} edges, {} iterations",
                self.graph.node_count(),
                self.graph.edge_count(),
                self.iteration
            );
        }
    }

    /// Drive the full iteration loop.
    ///
    /// The cancellation flag is polled at every iteration boundary; when set,
    /// the run stops with [`SimulationState::Cancelled`] before the next
    /// iteration. `on_progress` receives an integer percent (non-decreasing,
    /// strictly increasing in iteration index) on every
    /// [`PROGRESS_STRIDE`]-th iteration and on the final one.
    pub fn run(&mut self, cancel: &AtomicBool, mut on_progress: impl FnMut(u32)) -> SimulationState {
        let total = self.settings.iterations;
        for index in self.iteration..total {
            if cancel.load(Ordering::Relaxed) {
                self.state = SimulationState::Cancelled;
                debug!("layout cancelled at iteration {index}");
                return self.state;
            }
            self.step();
            if index % PROGRESS_STRIDE == 0 || index + 1 == total {
                on_progress(index * 100 / total);
            }
        }
        self.state
    }

    /// The `{id -> position}` map for the current positions.
    pub fn positions(&self) -> HashMap<String, Position> {
        self.graph.positions_map()
    }
}
