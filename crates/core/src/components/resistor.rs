use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Two-terminal linear resistance, the base of the resistor family.
///
/// `is_connected` models physical presence or closure and is independent of
/// graph connectivity: a part that is pulled out (or a switch that is open)
/// contributes nothing and is invisible to traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    pub resistance: f64,
    pub is_connected: bool,
}

impl Resistor {
    pub const TERMINALS: &'static [&'static str] = &["a", "b"];

    pub fn new(resistance: f64) -> Self {
        Self { resistance, is_connected: true }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.contribute_with(name, t, netlist, self.resistance);
    }

    pub(crate) fn contribute_with(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist, ohms: f64) {
        if self.is_connected && t.connected(0) && t.connected(1) {
            netlist.resistor(name, t.id(0), t.id(1), ohms);
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match (self.is_connected, terminal) {
            (true, 0) => &[1],
            (true, 1) => &[0],
            _ => &[],
        }
    }

    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        readings_for(t, self.resistance)
    }
}

pub(crate) fn readings_for(t: &Terminals<'_>, resistance: f64) -> Readings {
    let (va, vb) = (t.voltage(0), t.voltage(1));
    if !both_defined(va, vb) {
        return Readings { resistance, ..Readings::undefined() };
    }
    let voltage = (va - vb).abs();
    Readings { voltage, current: voltage / resistance, resistance }
}

/// A user-placed link between two ports: a plain wire, or a faulty cable with
/// a fixed, noticeable resistance.
#[derive(Debug, Clone, PartialEq)]
pub struct Cable {
    pub base: Resistor,
    pub is_faulty: bool,
}

impl Cable {
    pub fn new(config: &BoardConfig, is_faulty: bool) -> Self {
        let ohms = if is_faulty { config.faulty_cable_resistance } else { config.wire_resistance };
        Self { base: Resistor::new(ohms), is_faulty }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.base.contribute(name, t, netlist);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Switch {
    pub base: Resistor,
}

impl Switch {
    pub fn new(config: &BoardConfig, closed: bool) -> Self {
        Self { base: Resistor { resistance: config.wire_resistance, is_connected: closed } }
    }

    pub fn is_closed(&self) -> bool {
        self.base.is_connected
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.base.contribute(name, t, netlist);
    }
}

/// Blade fuse. A defective fuse is an authoring flag that forces a large
/// resistance regardless of the nominal value. A blown fuse is a runtime trip
/// decided by an observer (see [`crate::observer::FuseMonitor`]), which simply
/// disconnects it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fuse {
    pub base: Resistor,
    pub is_defective: bool,
    defective_resistance: f64,
}

impl Fuse {
    pub fn new(config: &BoardConfig, is_defective: bool) -> Self {
        Self {
            base: Resistor::new(config.fuse_resistance),
            is_defective,
            defective_resistance: config.defective_fuse_resistance,
        }
    }

    pub fn resistance(&self) -> f64 {
        if self.is_defective { self.defective_resistance } else { self.base.resistance }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.base.contribute_with(name, t, netlist, self.resistance());
    }

    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        readings_for(t, self.resistance())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Port, PortId};

    fn ports(va: f64, vb: f64, connected: bool) -> Vec<Port> {
        let mut a = Port::new("a");
        let mut b = Port::new("b");
        a.voltage = va;
        b.voltage = vb;
        a.connected = connected;
        b.connected = connected;
        vec![a, b]
    }

    const IDS: [PortId; 2] = [PortId(0), PortId(1)];

    #[test]
    fn disconnected_resistor_is_invisible() {
        let mut r = Resistor::new(10.0);
        r.is_connected = false;
        let arena = ports(1.0, 0.0, true);
        let mut netlist = Netlist::new();
        r.contribute("r", &Terminals::new(&IDS, &arena), &mut netlist);
        assert!(netlist.is_empty());
        assert!(r.opposite(0).is_empty());
        assert!(r.opposite(1).is_empty());
    }

    #[test]
    fn resistor_needs_both_ports_connected() {
        let r = Resistor::new(10.0);
        let mut arena = ports(1.0, 0.0, true);
        arena[1].connected = false;
        let mut netlist = Netlist::new();
        r.contribute("r", &Terminals::new(&IDS, &arena), &mut netlist);
        assert!(netlist.is_empty());
    }

    #[test]
    fn defective_fuse_overrides_nominal_resistance() {
        let config = BoardConfig::default();
        let fuse = Fuse::new(&config, true);
        assert_eq!(fuse.resistance(), 93.0);
        let arena = ports(9.3, 0.0, true);
        let mut netlist = Netlist::new();
        fuse.contribute("fuse", &Terminals::new(&IDS, &arena), &mut netlist);
        assert_eq!(
            netlist.element("fuse").map(|e| e.kind.clone()),
            Some(crate::netlist::ElementKind::Resistor {
                a: "a".into(),
                b: "b".into(),
                ohms: 93.0
            })
        );
        let readings = fuse.readings(&Terminals::new(&IDS, &arena));
        assert!((readings.current - 0.1).abs() < 1e-12);
    }

    #[test]
    fn undefined_terminal_gives_nan_readings() {
        let r = Resistor::new(4.0);
        let arena = ports(f64::NAN, 0.0, false);
        let readings = r.readings(&Terminals::new(&IDS, &arena));
        assert!(readings.voltage.is_nan());
        assert!(readings.current.is_nan());
        assert_eq!(readings.resistance, 4.0);
    }
}
