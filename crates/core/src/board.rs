use tracing::{debug, warn};

use crate::component::{AfterRecompute, Component, ComponentId, ComponentKind, Readings};
use crate::components::{
    Battery, Cable, ElectronicFlasher, Fuse, Lightbulb, Multimeter, MultimeterMode, Potentiometer,
    Relay,
};
use crate::config::BoardConfig;
use crate::connectivity::ConnectivityAnalyzer;
use crate::errors::{BoardError, CircuitError};
use crate::graph::CircuitGraph;
use crate::layout::BoardLayout;
use crate::netlist::{Netlist, SolveRequest};
use crate::observer::{BoardEvent, BoardObserver, Command, Commands};
use crate::port::{Port, PortId};
use crate::scheduler::{CircuitSolver, Dispatch};
use crate::solver::NetworkSolver;
use crate::units::{Capacitance, Voltage};

/// A training board: fixed components from a [`BoardLayout`], user-placed
/// cables, and the scheduler that solves it.
///
/// All mutation goes through `&mut self`, so the graph is only ever changed
/// from the thread driving the solves. Observers react to propagation by
/// queueing [`Command`]s; see [`crate::observer`].
pub struct Board<S> {
    graph: CircuitGraph,
    config: BoardConfig,
    board_voltage: f64,
    scheduler: CircuitSolver<S>,
    observers: Vec<Box<dyn BoardObserver>>,
    commands: Commands,
}

impl<S: NetworkSolver> Board<S> {
    pub fn new(layout: BoardLayout, solver: S) -> Result<Self, BoardError> {
        let board_voltage = f64::from(Voltage::new(layout.board_voltage)?);
        Capacitance::new(layout.config.flasher_capacitance)?;

        let mut graph = CircuitGraph::new();
        for spec in &layout.components {
            spec.validate()?;
            let mut kind = ComponentKind::build(spec.kind.clone(), &layout.config);
            if let ComponentKind::Battery(battery) = &mut kind {
                battery.reset(board_voltage);
            }
            let ports = spec
                .port_ids(kind.terminal_names())
                .iter()
                .map(|id| graph.add_port(id))
                .collect();
            graph.add_component(&spec.name, kind, ports)?;
        }
        debug!(
            components = layout.components.len(),
            ports = graph.port_count(),
            board_voltage,
            "board built"
        );

        Ok(Self {
            graph,
            config: layout.config,
            board_voltage,
            scheduler: CircuitSolver::new(solver),
            observers: Vec::new(),
            commands: Commands::default(),
        })
    }

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn get_voltage(&self, port: &str) -> Result<f64, BoardError> {
        self.graph.voltage(port)
    }

    pub fn port(&self, id: &str) -> Result<&Port, BoardError> {
        Ok(self.graph.port(self.graph.port_id(id)?))
    }

    pub fn port_ids(&self) -> impl Iterator<Item = &str> {
        self.graph.ports().iter().map(|p| p.id.as_str())
    }

    // Cables

    pub fn place_cable(&mut self, id: &str, a: &str, b: &str, is_faulty: bool) -> Result<ComponentId, BoardError> {
        let (pa, pb) = (self.graph.port_id(a)?, self.graph.port_id(b)?);
        let cable = ComponentKind::Cable(Cable::new(&self.config, is_faulty));
        let idx = self.graph.add_cable(id, cable, pa, pb)?;
        debug!(cable = id, a, b, is_faulty, "cable placed");
        Ok(idx)
    }

    pub fn remove_cable(&mut self, id: &str) -> Result<(), BoardError> {
        self.graph.remove_cable(id)?;
        debug!(cable = id, "cable removed");
        Ok(())
    }

    // Solving

    /// Clears every port voltage, runs the connectivity passes and collects
    /// the contributions of every component and cable.
    pub fn get_circuit(&mut self) -> Netlist {
        self.graph.clear_voltages();
        let roots = self.connectivity_roots();
        let connected = ConnectivityAnalyzer::analyze(&mut self.graph, &roots);
        let netlist = self.graph.build_netlist();
        debug!(passes = roots.len(), connected, elements = netlist.len(), "netlist built");
        netlist
    }

    /// One pass per battery, plus one per multimeter measuring resistance.
    fn connectivity_roots(&self) -> Vec<(PortId, PortId)> {
        self.graph
            .components()
            .filter_map(|(_, c)| match &c.kind {
                ComponentKind::Battery(_) => Some((c.ports[Battery::V], c.ports[Battery::G])),
                ComponentKind::Multimeter(m) if m.mode == MultimeterMode::Resistance => {
                    Some((c.ports[Multimeter::V], c.ports[Multimeter::G]))
                }
                _ => None,
            })
            .collect()
    }

    /// Queues a solve and runs it, along with every re-solve it cascades
    /// into. A failing observer command does not stop the queue; the first
    /// such error is returned once the cascade is done.
    pub fn solve_circuit(&mut self) -> Result<(), BoardError> {
        self.scheduler.enqueue();
        self.pump()
    }

    /// Builds the request for a dequeued sequence number from the board as
    /// it stands now.
    fn snapshot(&mut self, sequence: u64) -> SolveRequest {
        let netlist = self.get_circuit();
        let ohmmeter = self.graph.components().find_map(|(_, c)| match &c.kind {
            ComponentKind::Multimeter(m) if m.mode == MultimeterMode::Resistance => Some(m.source_voltage()),
            _ => None,
        });
        SolveRequest::new(sequence, netlist, self.supply_voltage(), ohmmeter)
    }

    fn pump(&mut self) -> Result<(), BoardError> {
        let mut first_error = None;
        let mut budget = self.config.max_cascade;
        while budget > 0 {
            let Some(sequence) = self.scheduler.begin_next() else {
                break;
            };
            budget -= 1;
            let request = self.snapshot(sequence);
            let dispatch = self.scheduler.execute(&request);
            self.propagate(&dispatch);
            let applied = self.apply_commands();
            self.scheduler.finish();
            if let Err(err) = applied {
                first_error.get_or_insert(err);
            }
        }
        if budget == 0 && self.scheduler.queued() > 0 {
            warn!(
                queued = self.scheduler.queued(),
                limit = self.config.max_cascade,
                "re-solve cascade limit reached"
            );
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Writes the dispatch result into every port, NaN where the solver gave
    /// nothing, and forwards the resulting notifications.
    fn propagate(&mut self, dispatch: &Dispatch) {
        for idx in 0..self.graph.port_count() {
            let port = PortId(idx);
            let voltage = dispatch.voltage(&self.graph.port(port).id);
            let recomputed = self.graph.write_voltage(port, voltage);
            self.emit(BoardEvent::VoltageChanged { port, voltage });
            for (component, after) in recomputed {
                self.emit(BoardEvent::ValuesUpdated { component });
                if after == AfterRecompute::ResolveRequested {
                    self.commands.solve();
                }
            }
        }
        self.emit(BoardEvent::Solved { sequence: dispatch.sequence, status: dispatch.status.clone() });
    }

    fn emit(&mut self, event: BoardEvent) {
        for observer in self.observers.iter_mut() {
            observer.on_event(&event, &self.graph, &mut self.commands);
        }
    }

    /// Applies every queued command in order, returning the first failure.
    fn apply_commands(&mut self) -> Result<(), BoardError> {
        let mut result = Ok(());
        for command in self.commands.take() {
            let applied = match command {
                Command::Solve => {
                    self.scheduler.enqueue();
                    Ok(())
                }
                Command::PlaceCable { id, a, b, is_faulty } => self.place_cable(&id, &a, &b, is_faulty).map(drop),
                Command::RemoveCable { id } => self.remove_cable(&id),
                Command::SetConnected { name, connected } => self.set_connected(&name, connected),
            };
            if let Err(err) = applied {
                warn!(%err, "observer command failed");
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }

    /// Clears the transient traversal and debounce state.
    pub fn reset(&mut self) {
        self.graph.reset_connectivity();
        self.graph.reset_debounce();
    }

    pub fn subscribe<O: BoardObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Registers a closure observer.
    pub fn observe<F>(&mut self, f: F)
    where
        F: FnMut(&BoardEvent, &CircuitGraph, &mut Commands) + 'static,
    {
        self.subscribe(f);
    }

    pub fn is_busy(&self) -> bool {
        self.scheduler.is_busy()
    }

    pub fn pending_solves(&self) -> usize {
        self.scheduler.queued()
    }

    pub fn solve_count(&self) -> u64 {
        self.scheduler.dispatched()
    }

    pub fn solver(&self) -> &S {
        self.scheduler.solver()
    }

    pub fn solver_mut(&mut self) -> &mut S {
        self.scheduler.solver_mut()
    }

    // Components

    pub fn component(&self, name: &str) -> Result<&Component, BoardError> {
        self.graph.named(name)
    }

    pub fn readings(&self, name: &str) -> Result<Readings, BoardError> {
        Ok(self.component(name)?.readings)
    }

    fn kind_mut(&mut self, name: &str) -> Result<&mut ComponentKind, BoardError> {
        let idx = self.graph.component_id(name)?;
        self.graph
            .component_mut(idx)
            .map(|c| &mut c.kind)
            .ok_or_else(|| BoardError::UnknownComponent(name.to_string()))
    }

    pub fn battery(&self, name: &str) -> Result<&Battery, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Battery(b) => Ok(b),
            _ => Err(mismatch(name, "battery")),
        }
    }

    pub fn relay(&self, name: &str) -> Result<&Relay, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Relay(r) => Ok(r),
            _ => Err(mismatch(name, "relay")),
        }
    }

    pub fn multimeter(&self, name: &str) -> Result<&Multimeter, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Multimeter(m) => Ok(m),
            _ => Err(mismatch(name, "multimeter")),
        }
    }

    pub fn lightbulb(&self, name: &str) -> Result<&Lightbulb, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Lightbulb(l) => Ok(l),
            _ => Err(mismatch(name, "lightbulb")),
        }
    }

    pub fn fuse(&self, name: &str) -> Result<&Fuse, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Fuse(f) => Ok(f),
            _ => Err(mismatch(name, "fuse")),
        }
    }

    pub fn potentiometer(&self, name: &str) -> Result<&Potentiometer, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::Potentiometer(p) => Ok(p),
            _ => Err(mismatch(name, "potentiometer")),
        }
    }

    pub fn flasher(&self, name: &str) -> Result<&ElectronicFlasher, BoardError> {
        match &self.component(name)?.kind {
            ComponentKind::ElectronicFlasher(f) => Ok(f),
            _ => Err(mismatch(name, "electronic flasher")),
        }
    }

    /// Opens or closes a switch, pulls or inserts a fuse, and so on for every
    /// removable two-terminal part.
    pub fn set_connected(&mut self, name: &str, connected: bool) -> Result<(), BoardError> {
        if !self.kind_mut(name)?.set_connected(connected) {
            return Err(mismatch(name, "removable part"));
        }
        debug!(component = name, connected, "component presence changed");
        Ok(())
    }

    pub fn set_wiper(&mut self, name: &str, ohms: f64) -> Result<(), BoardError> {
        if !ohms.is_finite() {
            return Err(CircuitError::InvalidResistance(ohms).into());
        }
        match self.kind_mut(name)? {
            ComponentKind::Potentiometer(p) => {
                p.set_wiper(ohms);
                Ok(())
            }
            _ => Err(mismatch(name, "potentiometer")),
        }
    }

    pub fn set_multimeter_mode(&mut self, name: &str, mode: MultimeterMode) -> Result<(), BoardError> {
        match self.kind_mut(name)? {
            ComponentKind::Multimeter(m) => {
                m.mode = mode;
                Ok(())
            }
            _ => Err(mismatch(name, "multimeter")),
        }
    }

    pub fn reset_multimeter_fuse(&mut self, name: &str) -> Result<(), BoardError> {
        match self.kind_mut(name)? {
            ComponentKind::Multimeter(m) => {
                m.fuse_blown = false;
                Ok(())
            }
            _ => Err(mismatch(name, "multimeter")),
        }
    }

    pub fn set_flasher_signal(&mut self, name: &str, on: bool) -> Result<(), BoardError> {
        match self.kind_mut(name)? {
            ComponentKind::ElectronicFlasher(f) => {
                f.is_signal_on = on;
                Ok(())
            }
            _ => Err(mismatch(name, "electronic flasher")),
        }
    }

    pub fn set_fuse_defective(&mut self, name: &str, defective: bool) -> Result<(), BoardError> {
        match self.kind_mut(name)? {
            ComponentKind::Fuse(f) => {
                f.is_defective = defective;
                Ok(())
            }
            _ => Err(mismatch(name, "fuse")),
        }
    }

    // Supply

    pub fn board_voltage(&self) -> f64 {
        self.board_voltage
    }

    /// Voltage the next snapshot drives the supply with; 0 while shorted.
    pub fn supply_voltage(&self) -> f64 {
        self.graph
            .components()
            .find_map(|(_, c)| match &c.kind {
                ComponentKind::Battery(b) => Some(b.source_voltage()),
                _ => None,
            })
            .unwrap_or(self.board_voltage)
    }

    /// Changes the nominal supply voltage. A latched short stays latched.
    pub fn set_board_voltage(&mut self, voltage: f64) -> Result<(), BoardError> {
        self.board_voltage = Voltage::new(voltage)?.into();
        for battery in self.batteries_mut() {
            battery.voltage = voltage;
        }
        Ok(())
    }

    /// Clears short and overload on every battery and restores `voltage`.
    pub fn reset_battery(&mut self, voltage: f64) -> Result<(), BoardError> {
        self.board_voltage = Voltage::new(voltage)?.into();
        for battery in self.batteries_mut() {
            battery.reset(voltage);
        }
        debug!(voltage, "battery reset");
        Ok(())
    }

    fn batteries_mut(&mut self) -> impl Iterator<Item = &mut Battery> {
        self.graph.components_mut().filter_map(|c| match &mut c.kind {
            ComponentKind::Battery(b) => Some(b),
            _ => None,
        })
    }
}

fn mismatch(name: &str, expected: &'static str) -> BoardError {
    BoardError::KindMismatch { name: name.to_string(), expected }
}
