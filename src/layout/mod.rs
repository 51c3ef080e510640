//! Force model and simulation driver.
//!
//! `forces` holds the three per-iteration force passes (repulsion via the
//! quad-tree, per-edge attraction, gravity); `simulation` owns the iteration
//! loop, the cooling schedule, and the run lifecycle.

pub mod forces;
mod simulation;

pub use simulation::{LayoutSettings, Simulation, SimulationState};
