use crate::component::{Readings, Terminals};
use crate::netlist::Netlist;
use crate::units::both_defined;

/// DC motor modelled as a resistor whose voltage keeps its sign, so consumers
/// can tell the direction of rotation.
#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    pub base: super::Resistor,
}

impl Motor {
    pub fn new(resistance: f64) -> Self {
        Self { base: super::Resistor::new(resistance) }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.base.contribute(name, t, netlist);
    }

    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        let (va, vb) = (t.voltage(0), t.voltage(1));
        let resistance = self.base.resistance;
        if !both_defined(va, vb) {
            return Readings { resistance, ..Readings::undefined() };
        }
        let voltage = va - vb;
        Readings { voltage, current: voltage / resistance, resistance }
    }
}
