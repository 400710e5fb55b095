//! Reachability analysis deciding which ports take part in the next solve.
//!
//! A pass walks every simple path from a source port to a sink port, following
//! the state-dependent adjacency exposed by component models. Ports on a path
//! that reaches the sink are marked connected; dead branches are not.
//!
//! Each pass owns its scratch flags, so no pass can observe flags left behind
//! by an earlier pass or an earlier solve. The board merges the passes' results
//! into [`crate::port::Port::connected`].

use tracing::debug;

use crate::graph::CircuitGraph;
use crate::port::PortId;

#[derive(Debug, Clone)]
pub struct Pass {
    visited: Vec<bool>,
    connected: Vec<bool>,
}

impl Pass {
    pub fn new(port_count: usize) -> Self {
        Self { visited: vec![false; port_count], connected: vec![false; port_count] }
    }

    pub fn run(graph: &CircuitGraph, source: PortId, sink: PortId) -> Self {
        let mut pass = Self::new(graph.port_count());
        pass.search(graph, source, sink);
        debug_assert!(pass.is_clean());
        pass
    }

    fn search(&mut self, graph: &CircuitGraph, current: PortId, sink: PortId) -> bool {
        self.visited[current.0] = true;
        if current == sink {
            self.connected[current.0] = true;
        } else {
            let next: Vec<PortId> = graph
                .opposite_ports(current)
                .into_iter()
                .filter(|p| !self.visited[p.0])
                .collect();
            for port in next {
                if self.search(graph, port, sink) {
                    self.connected[current.0] = true;
                }
            }
        }
        self.visited[current.0] = false;
        self.connected[current.0]
    }

    pub fn is_connected(&self, port: PortId) -> bool {
        self.connected[port.0]
    }

    pub fn connected_ports(&self) -> impl Iterator<Item = PortId> + '_ {
        self.connected.iter().enumerate().filter(|(_, c)| **c).map(|(i, _)| PortId(i))
    }

    /// True when no port is left marked visited.
    pub fn is_clean(&self) -> bool {
        self.visited.iter().all(|v| !v)
    }
}

pub struct ConnectivityAnalyzer;

impl ConnectivityAnalyzer {
    /// Clears every port's `connected` flag, runs one independent pass per
    /// root pair, and marks the union of their results. Returns the number of
    /// connected ports.
    pub fn analyze(graph: &mut CircuitGraph, roots: &[(PortId, PortId)]) -> usize {
        graph.reset_connectivity();
        let passes: Vec<Pass> = roots.iter().map(|&(source, sink)| Pass::run(graph, source, sink)).collect();
        for (pass, (source, sink)) in passes.iter().zip(roots) {
            debug!(
                source = %graph.port(*source).id,
                sink = %graph.port(*sink).id,
                connected = pass.connected_ports().count(),
                "connectivity pass"
            );
            for port in pass.connected_ports() {
                graph.mark_connected(port);
            }
        }
        graph.ports().iter().filter(|p| p.connected).count()
    }
}
