//! Message-passing execution boundary.
//!
//! The engine runs on a dedicated thread that owns copies of its input and
//! communicates with the caller only through a channel of tagged events — no
//! mutable memory is shared while the run is in flight. Ordering guarantees:
//! progress percentages are non-decreasing and strictly increase in iteration
//! index, and exactly one terminal event (`Complete`, `Cancelled`, or
//! `Error`) arrives last, after which the channel disconnects.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crate::error::LayoutError;
use crate::graph::{Edge, LayoutGraph, Node, Position};
use crate::layout::{LayoutSettings, Simulation, SimulationState};

/// Everything a layout run needs, in the wire shape emitted by the upstream
/// network generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutInput {
    /// The node set, fixed for the run.
    pub nodes: Vec<Node>,
    /// The edge set; dangling edges are tolerated and skipped.
    #[serde(default)]
    pub edges: Vec<Edge>,
    /// Simulation parameters; omitted fields take their defaults.
    #[serde(default)]
    pub settings: LayoutSettings,
}

/// An event emitted by the engine thread.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    /// Integer percent complete, 0-100. Emitted every 10th iteration and on
    /// the final iteration.
    Progress(u32),
    /// Terminal: the full `{id -> position}` map.
    Complete(HashMap<String, Position>),
    /// Terminal: the run was cancelled at an iteration boundary.
    Cancelled,
    /// Terminal: the input or settings failed validation.
    Error(LayoutError),
}

/// Caller-side handle to a running layout.
///
/// Dropping the handle without joining is safe: the engine has no side
/// effects beyond message emission, so an abandoned run simply finishes (or
/// cancels) unobserved.
pub struct LayoutHandle {
    events: Receiver<LayoutEvent>,
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl LayoutHandle {
    /// The event stream. Iterating it yields events until the terminal one,
    /// after which the channel disconnects.
    #[inline]
    pub fn events(&self) -> &Receiver<LayoutEvent> {
        &self.events
    }

    /// Request cooperative cancellation. The engine polls the flag at each
    /// iteration boundary and answers with [`LayoutEvent::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the engine thread to finish. Events may still be pending in
    /// the channel afterwards.
    pub fn join(self) {
        let _ = self.thread.join();
    }
}

/// Start a layout run on its own thread, taking ownership of the input.
pub fn spawn(input: LayoutInput) -> LayoutHandle {
    let (sender, events) = unbounded();
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    let thread = thread::spawn(move || {
        let terminal = match drive(input, &flag, &sender) {
            Ok(event) => event,
            Err(error) => LayoutEvent::Error(error),
        };
        // The caller may have dropped the receiver; nothing to do then.
        let _ = sender.send(terminal);
    });
    LayoutHandle {
        events,
        cancel,
        thread,
    }
}

fn drive(
    input: LayoutInput,
    cancel: &AtomicBool,
    sender: &Sender<LayoutEvent>,
) -> Result<LayoutEvent, LayoutError> {
    let graph = LayoutGraph::build(&input.nodes, &input.edges)?;
    let mut simulation = Simulation::new(graph, input.settings)?;
    let state = simulation.run(cancel, |percent| {
        let _ = sender.send(LayoutEvent::Progress(percent));
    });
    Ok(match state {
        SimulationState::Cancelled => LayoutEvent::Cancelled,
        _ => LayoutEvent::Complete(simulation.positions()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_input(iterations: u32) -> LayoutInput {
        LayoutInput {
            nodes: vec![
                Node::new("a", 0.0, 0.0),
                Node::new("b", 10.0, 0.0),
                Node::new("c", 0.0, 10.0),
            ],
            edges: vec![Edge::new("a", "b"), Edge::new("b", "c")],
            settings: LayoutSettings {
                iterations,
                ..LayoutSettings::default()
            },
        }
    }

    #[test]
    fn test_message_cadence_and_terminal_complete() {
        let handle = spawn(small_input(100));
        let events: Vec<_> = handle.events().iter().collect();

        let mut percents = Vec::new();
        for (i, event) in events.iter().enumerate() {
            match event {
                LayoutEvent::Progress(p) => percents.push(*p),
                LayoutEvent::Complete(positions) => {
                    assert_eq!(i, events.len() - 1, "Complete must be last");
                    assert_eq!(positions.len(), 3);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(percents, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 99]);
        handle.join();
    }

    #[test]
    fn test_error_event_for_invalid_settings() {
        let mut input = small_input(0);
        input.settings.iterations = 0;
        let handle = spawn(input);
        let events: Vec<_> = handle.events().iter().collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LayoutEvent::Error(LayoutError::InvalidSettings(_))));
        handle.join();
    }

    #[test]
    fn test_error_event_for_bad_seed() {
        let mut input = small_input(10);
        input.nodes[1].y = f32::INFINITY;
        let handle = spawn(input);
        let events: Vec<_> = handle.events().iter().collect();
        assert_eq!(
            events,
            vec![LayoutEvent::Error(LayoutError::NonFiniteCoordinate {
                id: "b".to_string()
            })]
        );
        handle.join();
    }

    #[test]
    fn test_exactly_one_terminal_event_under_cancellation() {
        // Enough work that cancellation usually lands mid-run; either way
        // there must be exactly one terminal event and it must be last.
        let nodes: Vec<_> = (0..400)
            .map(|i| Node::new(format!("n{i}"), (i % 20) as f32, (i / 20) as f32))
            .collect();
        let edges: Vec<_> = (0..800)
            .map(|i| Edge::new(format!("n{}", i % 400), format!("n{}", (i * 3 + 7) % 400)))
            .collect();
        let input = LayoutInput {
            nodes,
            edges,
            settings: LayoutSettings {
                iterations: 2000,
                ..LayoutSettings::default()
            },
        };

        let handle = spawn(input);
        // Wait for the run to actually start, then cancel.
        let first = handle.events().recv().expect("at least one event");
        handle.cancel();

        let mut events = vec![first];
        events.extend(handle.events().iter());
        handle.join();

        let terminal_count = events
            .iter()
            .filter(|e| !matches!(e, LayoutEvent::Progress(_)))
            .count();
        assert_eq!(terminal_count, 1);
        assert!(!matches!(events.last().unwrap(), LayoutEvent::Progress(_)));
    }

    #[test]
    fn test_cancelled_run_emits_cancelled_terminal() {
        // A run this long takes minutes to finish, so a cancel issued after
        // the first progress event always lands at an iteration boundary
        // long before completion; the worker must answer with the Cancelled
        // terminal, never Complete.
        let nodes: Vec<_> = (0..100)
            .map(|i| Node::new(format!("n{i}"), (i % 10) as f32, (i / 10) as f32))
            .collect();
        let edges: Vec<_> = (0..200)
            .map(|i| Edge::new(format!("n{}", i % 100), format!("n{}", (i * 7 + 3) % 100)))
            .collect();
        let input = LayoutInput {
            nodes,
            edges,
            settings: LayoutSettings {
                iterations: 1_000_000,
                ..LayoutSettings::default()
            },
        };

        let handle = spawn(input);
        assert!(matches!(
            handle.events().recv().expect("run started"),
            LayoutEvent::Progress(_)
        ));
        handle.cancel();

        let rest: Vec<_> = handle.events().iter().collect();
        handle.join();
        assert_eq!(rest.last(), Some(&LayoutEvent::Cancelled));
        assert!(
            !rest
                .iter()
                .any(|e| matches!(e, LayoutEvent::Complete(_))),
            "cancelled run must not deliver positions"
        );
    }

    #[test]
    fn test_wire_format_round_trip() {
        let json = r#"{
            "nodes": [
                {"id": "alice", "x": 0.0, "y": 0.0, "size": 3.0},
                {"id": "bob", "x": 5.0, "y": 5.0}
            ],
            "edges": [{"source": "alice", "target": "bob", "weight": 2.0}],
            "settings": {"iterations": 5, "gravity": 0.5, "scalingRatio": 2.0}
        }"#;
        let input: LayoutInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.nodes[1].size, 1.0);
        assert_eq!(input.settings.iterations, 5);
        assert_eq!(input.settings.max_displacement, 10.0);

        let handle = spawn(input);
        let terminal = handle.events().iter().last().unwrap();
        let LayoutEvent::Complete(positions) = terminal else {
            panic!("expected Complete, got {terminal:?}");
        };
        // The map serializes to the `{id -> {x, y}}` shape renderers consume.
        let out = serde_json::to_value(&positions).unwrap();
        assert!(out.get("alice").and_then(|p| p.get("x")).is_some());
        handle.join();
    }

    #[test]
    fn test_input_defaults_tolerate_missing_sections() {
        let input: LayoutInput =
            serde_json::from_str(r#"{"nodes": [{"id": "solo", "x": 1.0, "y": 2.0}]}"#).unwrap();
        assert!(input.edges.is_empty());
        assert_eq!(input.settings, LayoutSettings::default());
    }
}
