use crate::components::{
    Battery, Cable, Diode, ElectronicFlasher, Fuse, Lightbulb, Motor, Multimeter, Potentiometer,
    Relay, Resistor, Switch,
};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::port::{Port, PortId};

/// Handle to a component slot on a board. Cables get fresh handles when placed;
/// handles of removed cables are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentId(pub usize);

#[derive(Debug, Clone)]
pub enum ComponentKind {
    Resistor(Resistor),
    Cable(Cable),
    Switch(Switch),
    Fuse(Fuse),
    Lightbulb(Lightbulb),
    Motor(Motor),
    Battery(Battery),
    Diode(Diode),
    Potentiometer(Potentiometer),
    Relay(Relay),
    ElectronicFlasher(ElectronicFlasher),
    Multimeter(Multimeter),
}

impl ComponentKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Resistor(_) => "resistor",
            Self::Cable(_) => "cable",
            Self::Switch(_) => "switch",
            Self::Fuse(_) => "fuse",
            Self::Lightbulb(_) => "lightbulb",
            Self::Motor(_) => "motor",
            Self::Battery(_) => "battery",
            Self::Diode(_) => "diode",
            Self::Potentiometer(_) => "potentiometer",
            Self::Relay(_) => "relay",
            Self::ElectronicFlasher(_) => "electronic flasher",
            Self::Multimeter(_) => "multimeter",
        }
    }

    /// Terminal names, in port order. Port ids of layout-built boards are
    /// `<component>.<terminal>`.
    pub fn terminal_names(&self) -> &'static [&'static str] {
        match self {
            Self::Resistor(_)
            | Self::Cable(_)
            | Self::Switch(_)
            | Self::Fuse(_)
            | Self::Lightbulb(_)
            | Self::Motor(_) => Resistor::TERMINALS,
            Self::Battery(_) => Battery::TERMINALS,
            Self::Diode(_) => Diode::TERMINALS,
            Self::Potentiometer(_) => Potentiometer::TERMINALS,
            Self::Relay(_) => Relay::TERMINALS,
            Self::ElectronicFlasher(_) => ElectronicFlasher::TERMINALS,
            Self::Multimeter(_) => Multimeter::TERMINALS,
        }
    }

    pub fn arity(&self) -> usize {
        self.terminal_names().len()
    }

    /// Terminals whose updates must all arrive before a recompute.
    pub fn watched(&self) -> &'static [usize] {
        match self {
            Self::Battery(_) => Battery::WATCHED,
            Self::Multimeter(_) => Multimeter::WATCHED,
            Self::Resistor(_)
            | Self::Cable(_)
            | Self::Switch(_)
            | Self::Fuse(_)
            | Self::Lightbulb(_)
            | Self::Motor(_)
            | Self::Diode(_) => &[0, 1],
            Self::Potentiometer(_) | Self::ElectronicFlasher(_) => &[0, 1, 2],
            Self::Relay(_) => Relay::WATCHED,
        }
    }

    pub fn contribute(&self, name: &str, terminals: &Terminals<'_>, netlist: &mut Netlist) {
        match self {
            Self::Resistor(r) => r.contribute(name, terminals, netlist),
            Self::Cable(c) => c.contribute(name, terminals, netlist),
            Self::Switch(s) => s.contribute(name, terminals, netlist),
            Self::Fuse(f) => f.contribute(name, terminals, netlist),
            Self::Lightbulb(l) => l.contribute(name, terminals, netlist),
            Self::Motor(m) => m.contribute(name, terminals, netlist),
            Self::Battery(b) => b.contribute(name, terminals, netlist),
            Self::Diode(d) => d.contribute(name, terminals, netlist),
            Self::Potentiometer(p) => p.contribute(name, terminals, netlist),
            Self::Relay(r) => r.contribute(name, terminals, netlist),
            Self::ElectronicFlasher(f) => f.contribute(name, terminals, netlist),
            Self::Multimeter(m) => m.contribute(name, terminals, netlist),
        }
    }

    /// Terminals adjacent to `terminal` for traversal, in the current state.
    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match self {
            Self::Resistor(r) => r.opposite(terminal),
            Self::Cable(c) => c.base.opposite(terminal),
            Self::Switch(s) => s.base.opposite(terminal),
            Self::Fuse(f) => f.base.opposite(terminal),
            Self::Lightbulb(l) => l.base.opposite(terminal),
            Self::Motor(m) => m.base.opposite(terminal),
            Self::Battery(_) => &[],
            Self::Diode(d) => d.opposite(terminal),
            Self::Potentiometer(p) => p.opposite(terminal),
            Self::Relay(r) => r.opposite(terminal),
            Self::ElectronicFlasher(f) => f.opposite(terminal),
            Self::Multimeter(m) => m.opposite(terminal),
        }
    }

    fn recompute(&mut self, name: &str, terminals: &Terminals<'_>) -> (Readings, AfterRecompute) {
        match self {
            Self::Resistor(r) => (r.readings(terminals), AfterRecompute::Settled),
            Self::Cable(c) => (c.base.readings(terminals), AfterRecompute::Settled),
            Self::Switch(s) => (s.base.readings(terminals), AfterRecompute::Settled),
            Self::Fuse(f) => (f.readings(terminals), AfterRecompute::Settled),
            Self::Lightbulb(l) => (l.recompute(terminals), AfterRecompute::Settled),
            Self::Motor(m) => (m.readings(terminals), AfterRecompute::Settled),
            Self::Battery(b) => (b.recompute(name, terminals), AfterRecompute::Settled),
            Self::Diode(d) => (d.readings(terminals), AfterRecompute::Settled),
            Self::Potentiometer(p) => (p.readings(terminals), AfterRecompute::Settled),
            Self::Relay(r) => r.recompute(name, terminals),
            Self::ElectronicFlasher(f) => (f.readings(terminals), AfterRecompute::Settled),
            Self::Multimeter(m) => m.recompute(name, terminals),
        }
    }

    /// The removable-part flag, for kinds that have one.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        let base = match self {
            Self::Resistor(r) => r,
            Self::Cable(c) => &mut c.base,
            Self::Switch(s) => &mut s.base,
            Self::Fuse(f) => &mut f.base,
            Self::Lightbulb(l) => &mut l.base,
            Self::Motor(m) => &mut m.base,
            _ => return false,
        };
        base.is_connected = connected;
        true
    }

    pub fn build(kind: KindSpec, config: &BoardConfig) -> Self {
        match kind {
            KindSpec::Resistor(ohms) => Self::Resistor(Resistor::new(ohms)),
            KindSpec::Switch { closed } => Self::Switch(Switch::new(config, closed)),
            KindSpec::Fuse { defective } => Self::Fuse(Fuse::new(config, defective)),
            KindSpec::Lightbulb { base_resistance, coefficient, reference_voltage } => {
                Self::Lightbulb(Lightbulb::new(config, base_resistance, coefficient, reference_voltage))
            }
            KindSpec::Motor(ohms) => Self::Motor(Motor::new(ohms)),
            KindSpec::Battery => Self::Battery(Battery::new(config)),
            KindSpec::Diode => Self::Diode(Diode::new(config)),
            KindSpec::Potentiometer { total, wiper } => {
                Self::Potentiometer(Potentiometer::new(config, total, wiper))
            }
            KindSpec::Relay => Self::Relay(Relay::new(config)),
            KindSpec::ElectronicFlasher => Self::ElectronicFlasher(ElectronicFlasher::new(config)),
            KindSpec::Multimeter => Self::Multimeter(Multimeter::new(config)),
        }
    }
}

/// Layout-level description of a fixed component, turned into a
/// [`ComponentKind`] against the board's [`BoardConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum KindSpec {
    Resistor(f64),
    Switch { closed: bool },
    Fuse { defective: bool },
    Lightbulb { base_resistance: f64, coefficient: f64, reference_voltage: f64 },
    Motor(f64),
    Battery,
    Diode,
    Potentiometer { total: f64, wiper: f64 },
    Relay,
    ElectronicFlasher,
    Multimeter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterRecompute {
    Settled,
    /// A state transition changed this component's netlist contribution.
    ResolveRequested,
}

/// Derived quantities of the last recompute. NaN when undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub voltage: f64,
    pub current: f64,
    pub resistance: f64,
}

impl Readings {
    pub fn undefined() -> Self {
        Self { voltage: f64::NAN, current: f64::NAN, resistance: f64::NAN }
    }
}

impl Default for Readings {
    fn default() -> Self {
        Self::undefined()
    }
}

/// A component's view of its own ports.
pub struct Terminals<'a> {
    ids: &'a [PortId],
    ports: &'a [Port],
}

impl<'a> Terminals<'a> {
    pub fn new(ids: &'a [PortId], ports: &'a [Port]) -> Self {
        Self { ids, ports }
    }

    pub fn port(&self, terminal: usize) -> &'a Port {
        &self.ports[self.ids[terminal].0]
    }

    pub fn id(&self, terminal: usize) -> &'a str {
        &self.port(terminal).id
    }

    pub fn voltage(&self, terminal: usize) -> f64 {
        self.port(terminal).voltage
    }

    pub fn connected(&self, terminal: usize) -> bool {
        self.port(terminal).connected
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    pub name: String,
    pub ports: Vec<PortId>,
    pub kind: ComponentKind,
    pub readings: Readings,
    updated: Vec<bool>,
}

impl Component {
    pub fn new(name: impl Into<String>, kind: ComponentKind, ports: Vec<PortId>) -> Self {
        debug_assert_eq!(ports.len(), kind.arity());
        let updated = vec![false; ports.len()];
        Self { name: name.into(), ports, kind, readings: Readings::undefined(), updated }
    }

    pub fn terminals<'a>(&'a self, arena: &'a [Port]) -> Terminals<'a> {
        Terminals::new(&self.ports, arena)
    }

    pub fn contribute(&self, arena: &[Port], netlist: &mut Netlist) {
        self.kind.contribute(&self.name, &self.terminals(arena), netlist);
    }

    /// Ports directly reachable from `port` through this component.
    pub fn opposite_ports(&self, port: PortId) -> Vec<PortId> {
        let mut out = Vec::new();
        for (terminal, _) in self.ports.iter().enumerate().filter(|(_, p)| **p == port) {
            for &other in self.kind.opposite(terminal) {
                let id = self.ports[other];
                if id != port && !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }

    /// Second phase of the debounce: records that `port` was written and, once
    /// every watched terminal has reported, recomputes the readings.
    pub fn port_updated(&mut self, port: PortId, arena: &[Port]) -> Option<AfterRecompute> {
        let watched = self.kind.watched();
        let mut relevant = false;
        for &terminal in watched {
            if self.ports[terminal] == port {
                self.updated[terminal] = true;
                relevant = true;
            }
        }
        if !relevant || !watched.iter().all(|&t| self.updated[t]) {
            return None;
        }
        self.reset_debounce();
        let terminals = Terminals::new(&self.ports, arena);
        let (readings, after) = self.kind.recompute(&self.name, &terminals);
        self.readings = readings;
        Some(after)
    }

    pub fn reset_debounce(&mut self) {
        self.updated.iter_mut().for_each(|u| *u = false);
    }

    pub fn pending_updates(&self) -> usize {
        self.kind.watched().iter().filter(|&&t| self.updated[t]).count()
    }
}
