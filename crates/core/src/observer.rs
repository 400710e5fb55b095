//! Notifications raised while solver results are propagated, and the command
//! buffer observers use to act on them.
//!
//! Observers never touch the board directly. They see a read-only
//! [`CircuitGraph`] and queue [`Command`]s, which the board applies after the
//! current dispatch has propagated and before the next one starts.

use crate::component::{ComponentId, ComponentKind};
use crate::graph::CircuitGraph;
use crate::port::PortId;
use crate::scheduler::SolveStatus;

#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    VoltageChanged { port: PortId, voltage: f64 },
    /// A component finished its debounce and recomputed its readings.
    ValuesUpdated { component: ComponentId },
    /// Raised once per dispatch, after every port has been written.
    Solved { sequence: u64, status: SolveStatus },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Solve,
    PlaceCable { id: String, a: String, b: String, is_faulty: bool },
    RemoveCable { id: String },
    SetConnected { name: String, connected: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn push(&mut self, command: Command) {
        self.queue.push(command);
    }

    pub fn solve(&mut self) {
        self.push(Command::Solve);
    }

    pub fn place_cable(&mut self, id: &str, a: &str, b: &str, is_faulty: bool) {
        self.push(Command::PlaceCable {
            id: id.to_string(),
            a: a.to_string(),
            b: b.to_string(),
            is_faulty,
        });
    }

    pub fn remove_cable(&mut self, id: &str) {
        self.push(Command::RemoveCable { id: id.to_string() });
    }

    pub fn set_connected(&mut self, name: &str, connected: bool) {
        self.push(Command::SetConnected { name: name.to_string(), connected });
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }
}

pub trait BoardObserver {
    fn on_event(&mut self, event: &BoardEvent, graph: &CircuitGraph, commands: &mut Commands);
}

impl<F> BoardObserver for F
where
    F: FnMut(&BoardEvent, &CircuitGraph, &mut Commands),
{
    fn on_event(&mut self, event: &BoardEvent, graph: &CircuitGraph, commands: &mut Commands) {
        self(event, graph, commands)
    }
}

/// Blows a fuse when its current exceeds `rating`: the fuse is disconnected
/// and a re-solve is requested. The trip latches until [`FuseMonitor::rearm`].
#[derive(Debug, Clone, PartialEq)]
pub struct FuseMonitor {
    fuse: String,
    rating: f64,
    tripped: bool,
}

impl FuseMonitor {
    pub fn new(fuse: impl Into<String>, rating: f64) -> Self {
        Self { fuse: fuse.into(), rating, tripped: false }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn rearm(&mut self) {
        self.tripped = false;
    }
}

impl BoardObserver for FuseMonitor {
    fn on_event(&mut self, event: &BoardEvent, graph: &CircuitGraph, commands: &mut Commands) {
        let BoardEvent::ValuesUpdated { component } = event else {
            return;
        };
        if self.tripped {
            return;
        }
        let Some(fuse) = graph.component(*component).filter(|c| c.name == self.fuse) else {
            return;
        };
        let ComponentKind::Fuse(model) = &fuse.kind else {
            return;
        };
        if model.base.is_connected && fuse.readings.current > self.rating {
            tracing::warn!(fuse = %self.fuse, current = fuse.readings.current, rating = self.rating, "fuse blown");
            self.tripped = true;
            commands.set_connected(&self.fuse, false);
            commands.solve();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_drain_in_push_order() {
        let mut commands = Commands::default();
        assert!(commands.is_empty());
        commands.set_connected("fuse", false);
        commands.solve();
        assert_eq!(commands.len(), 2);

        let drained = commands.take();
        assert!(commands.is_empty());
        assert_eq!(
            drained,
            vec![Command::SetConnected { name: "fuse".into(), connected: false }, Command::Solve]
        );
    }
}
