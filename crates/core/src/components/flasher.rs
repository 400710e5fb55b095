use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Electronic turn-signal flasher.
///
/// The timing oscillator is external; it drives `is_signal_on`, which switches
/// the `anode`–`signal` path between a closed and an open resistance.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectronicFlasher {
    pub is_signal_on: bool,
    capacitance: f64,
    closed_resistance: f64,
    open_resistance: f64,
}

impl ElectronicFlasher {
    pub const TERMINALS: &'static [&'static str] = &["anode", "cathode", "signal"];

    pub const ANODE: usize = 0;
    pub const CATHODE: usize = 1;
    pub const SIGNAL: usize = 2;

    pub fn new(config: &BoardConfig) -> Self {
        Self {
            is_signal_on: false,
            capacitance: config.flasher_capacitance,
            closed_resistance: config.flasher_closed_resistance,
            open_resistance: config.flasher_open_resistance,
        }
    }

    pub fn signal_resistance(&self) -> f64 {
        if self.is_signal_on { self.closed_resistance } else { self.open_resistance }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        if t.connected(Self::ANODE) && t.connected(Self::CATHODE) {
            netlist.capacitor(
                format!("{name}.supply"),
                t.id(Self::ANODE),
                t.id(Self::CATHODE),
                self.capacitance,
            );
        }
        if t.connected(Self::ANODE) && t.connected(Self::SIGNAL) {
            netlist.resistor(
                format!("{name}.signal"),
                t.id(Self::ANODE),
                t.id(Self::SIGNAL),
                self.signal_resistance(),
            );
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match terminal {
            Self::ANODE => &[Self::CATHODE, Self::SIGNAL],
            Self::CATHODE | Self::SIGNAL => &[Self::ANODE],
            _ => &[],
        }
    }

    /// Readings of the switched `anode`–`signal` path.
    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        let (va, vs) = (t.voltage(Self::ANODE), t.voltage(Self::SIGNAL));
        let resistance = self.signal_resistance();
        if !both_defined(va, vs) {
            return Readings { resistance, ..Readings::undefined() };
        }
        let voltage = (va - vs).abs();
        Readings { voltage, current: voltage / resistance, resistance }
    }
}
