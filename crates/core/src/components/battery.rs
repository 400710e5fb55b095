use tracing::{debug, warn};

use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Board supply: an ideal source in series with a tiny sense resistor.
///
/// Ports: `v` (positive), `g` (ground), `sense` (between the sense resistor and
/// the ideal source). The battery is always in the netlist and is the root of
/// the main connectivity pass; it is never traversal-adjacent itself.
///
/// A terminal voltage below the short tolerance latches `is_shorted`, which
/// forces the source to 0 V and keeps `is_overloaded` set until
/// [`Battery::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct Battery {
    pub voltage: f64,
    pub is_shorted: bool,
    pub is_overloaded: bool,
    sense_resistance: f64,
    short_tolerance: f64,
    max_current: f64,
}

impl Battery {
    pub const TERMINALS: &'static [&'static str] = &["v", "g", "sense"];
    pub const WATCHED: &'static [usize] = &[Self::V, Self::G];

    pub const V: usize = 0;
    pub const G: usize = 1;
    pub const SENSE: usize = 2;

    pub fn new(config: &BoardConfig) -> Self {
        Self {
            voltage: 0.0,
            is_shorted: false,
            is_overloaded: false,
            sense_resistance: config.battery_sense_resistance,
            short_tolerance: config.battery_short_tolerance,
            max_current: config.battery_max_current,
        }
    }

    /// Voltage the ideal source is driven with in the next solve.
    pub fn source_voltage(&self) -> f64 {
        if self.is_shorted { 0.0 } else { self.voltage }
    }

    pub fn reset(&mut self, voltage: f64) {
        self.voltage = voltage;
        self.is_shorted = false;
        self.is_overloaded = false;
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        netlist.resistor(
            format!("{name}.sense"),
            t.id(Self::V),
            t.id(Self::SENSE),
            self.sense_resistance,
        );
        netlist.voltage_source(
            format!("{name}.source"),
            t.id(Self::SENSE),
            t.id(Self::G),
            self.source_voltage(),
        );
    }

    pub fn recompute(&mut self, name: &str, t: &Terminals<'_>) -> Readings {
        let (vv, vg) = (t.voltage(Self::V), t.voltage(Self::G));
        if !both_defined(vv, vg) {
            return Readings { resistance: self.sense_resistance, ..Readings::undefined() };
        }
        let terminal = vv - vg;
        let current = (self.source_voltage() - terminal) / self.sense_resistance;

        if !self.is_shorted && self.voltage > self.short_tolerance && terminal < self.short_tolerance {
            warn!(battery = name, terminal, "battery shorted, clamping source to 0 V");
            self.is_shorted = true;
        }
        let overloaded = self.is_shorted || current > self.max_current;
        if overloaded != self.is_overloaded {
            debug!(battery = name, current, overloaded, "battery overload changed");
        }
        self.is_overloaded = overloaded;

        Readings { voltage: terminal, current, resistance: self.sense_resistance }
    }
}
