use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::{DiodeParams, Netlist};
use crate::units::both_defined;

/// Junction diode. The real I-V curve is solved by the network solver; the
/// local readings use a simple forward-only approximation for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Diode {
    pub params: DiodeParams,
    display_resistance: f64,
}

impl Diode {
    pub const TERMINALS: &'static [&'static str] = &["anode", "cathode"];

    pub fn new(config: &BoardConfig) -> Self {
        Self { params: config.diode, display_resistance: config.diode_display_resistance }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        if t.connected(0) && t.connected(1) {
            netlist.diode(name, t.id(0), t.id(1), self.params);
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match terminal {
            0 => &[1],
            1 => &[0],
            _ => &[],
        }
    }

    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        let (va, vk) = (t.voltage(0), t.voltage(1));
        if !both_defined(va, vk) {
            return Readings::undefined();
        }
        let voltage = va - vk;
        Readings {
            voltage,
            current: (voltage / self.display_resistance).max(0.0),
            resistance: self.display_resistance,
        }
    }
}
