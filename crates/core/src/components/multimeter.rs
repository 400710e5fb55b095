use tracing::{debug, warn};

use crate::component::{AfterRecompute, Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Canonical "nothing measurable" resistance shown by the ohmmeter.
pub const OPEN_CIRCUIT: f64 = f64::INFINITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultimeterMode {
    #[default]
    Off,
    DcVoltage,
    DcCurrent,
    Resistance,
    Undefined,
}

/// Handheld multimeter with probe jacks `v`, `g` (COM) and `a`, plus two
/// internal nodes that only carry the ohmmeter source in resistance mode.
///
/// In resistance mode the meter injects its own source, so it is not
/// traversal-adjacent at all and the board runs a separate connectivity pass
/// rooted at `v`/`g`.
#[derive(Debug, Clone, PartialEq)]
pub struct Multimeter {
    pub mode: MultimeterMode,
    pub fuse_blown: bool,
    input_impedance: f64,
    shunt_resistance: f64,
    blown_resistance: f64,
    fuse_current: f64,
    source_voltage: f64,
    series_resistance: f64,
    return_resistance: f64,
    max_resistance: f64,
}

impl Multimeter {
    pub const TERMINALS: &'static [&'static str] = &["v", "g", "a", "ohm_pos", "ohm_neg"];
    pub const WATCHED: &'static [usize] = &[Self::V, Self::G, Self::A];

    pub const V: usize = 0;
    pub const G: usize = 1;
    pub const A: usize = 2;
    pub const OHM_POS: usize = 3;
    pub const OHM_NEG: usize = 4;

    pub fn new(config: &BoardConfig) -> Self {
        Self {
            mode: MultimeterMode::Off,
            fuse_blown: false,
            input_impedance: config.multimeter_input_impedance,
            shunt_resistance: config.multimeter_shunt_resistance,
            blown_resistance: config.multimeter_blown_resistance,
            fuse_current: config.multimeter_fuse_current,
            source_voltage: config.ohmmeter_source_voltage,
            series_resistance: config.ohmmeter_series_resistance,
            return_resistance: config.wire_resistance,
            max_resistance: config.ohmmeter_max_resistance,
        }
    }

    pub fn source_voltage(&self) -> f64 {
        self.source_voltage
    }

    fn ammeter_resistance(&self) -> f64 {
        if self.fuse_blown { self.blown_resistance } else { self.shunt_resistance }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        match self.mode {
            MultimeterMode::DcVoltage => {
                if t.connected(Self::V) && t.connected(Self::G) {
                    netlist.resistor(
                        format!("{name}.input"),
                        t.id(Self::V),
                        t.id(Self::G),
                        self.input_impedance,
                    );
                }
            }
            MultimeterMode::DcCurrent => {
                if t.connected(Self::A) && t.connected(Self::G) {
                    netlist.resistor(
                        format!("{name}.shunt"),
                        t.id(Self::A),
                        t.id(Self::G),
                        self.ammeter_resistance(),
                    );
                }
            }
            MultimeterMode::Resistance => {
                if t.connected(Self::V) && t.connected(Self::G) {
                    netlist.resistor(
                        format!("{name}.ohm_series"),
                        t.id(Self::V),
                        t.id(Self::OHM_POS),
                        self.series_resistance,
                    );
                    netlist.voltage_source(
                        format!("{name}.ohm_source"),
                        t.id(Self::OHM_POS),
                        t.id(Self::OHM_NEG),
                        self.source_voltage,
                    );
                    netlist.resistor(
                        format!("{name}.ohm_return"),
                        t.id(Self::OHM_NEG),
                        t.id(Self::G),
                        self.return_resistance,
                    );
                }
            }
            MultimeterMode::Off | MultimeterMode::Undefined => {}
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match (self.mode, terminal) {
            (MultimeterMode::DcVoltage, Self::V) => &[Self::G],
            (MultimeterMode::DcVoltage, Self::G) => &[Self::V],
            (MultimeterMode::DcCurrent, Self::A) => &[Self::G],
            (MultimeterMode::DcCurrent, Self::G) => &[Self::A],
            _ => &[],
        }
    }

    pub fn recompute(&mut self, name: &str, t: &Terminals<'_>) -> (Readings, AfterRecompute) {
        let (vv, vg, va) = (t.voltage(Self::V), t.voltage(Self::G), t.voltage(Self::A));
        match self.mode {
            MultimeterMode::DcVoltage => {
                let voltage = if both_defined(vv, vg) { vv - vg } else { f64::NAN };
                let readings = Readings { voltage, current: f64::NAN, resistance: self.input_impedance };
                (readings, AfterRecompute::Settled)
            }
            MultimeterMode::DcCurrent => {
                let resistance = self.ammeter_resistance();
                if !both_defined(va, vg) {
                    return (Readings { resistance, ..Readings::undefined() }, AfterRecompute::Settled);
                }
                let voltage = va - vg;
                let current = voltage / resistance;
                let readings = Readings { voltage, current, resistance };
                if !self.fuse_blown && current.abs() > self.fuse_current {
                    warn!(multimeter = name, current, "multimeter fuse tripped");
                    self.fuse_blown = true;
                    return (readings, AfterRecompute::ResolveRequested);
                }
                (readings, AfterRecompute::Settled)
            }
            MultimeterMode::Resistance => {
                let measured = if both_defined(vv, vg) { vv - vg } else { f64::NAN };
                let resistance = ohmmeter_resistance(
                    self.source_voltage,
                    self.series_resistance,
                    measured,
                    self.max_resistance,
                );
                debug!(multimeter = name, measured, resistance, "ohmmeter reading");
                let current = (self.source_voltage - measured) / self.series_resistance;
                (Readings { voltage: measured, current, resistance }, AfterRecompute::Settled)
            }
            MultimeterMode::Off | MultimeterMode::Undefined => {
                (Readings::undefined(), AfterRecompute::Settled)
            }
        }
    }
}

/// Resistance seen by a source `vs` behind series resistance `ro` when the
/// voltage across the probes is `measured`. Negative, non-finite and
/// out-of-range results collapse to [`OPEN_CIRCUIT`].
pub fn ohmmeter_resistance(vs: f64, ro: f64, measured: f64, max: f64) -> f64 {
    let current = (vs - measured) / ro;
    let resistance = measured / current;
    if resistance.is_finite() && (0.0..=max).contains(&resistance) {
        resistance
    } else {
        OPEN_CIRCUIT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ohmmeter_derives_external_resistance() {
        let (vs, ro, measured) = (0.01, 0.01, 0.005);
        let expected = measured / ((vs - measured) / ro);
        assert_eq!(ohmmeter_resistance(vs, ro, measured, 20e6), expected);
        assert!((expected - 0.01).abs() < 1e-15);
    }

    #[test]
    fn negative_resistance_is_open_circuit() {
        assert_eq!(ohmmeter_resistance(0.01, 0.01, -0.002, 20e6), OPEN_CIRCUIT);
        assert_eq!(ohmmeter_resistance(0.01, 0.01, 0.02, 20e6), OPEN_CIRCUIT);
    }

    #[test]
    fn undefined_or_out_of_range_is_open_circuit() {
        assert_eq!(ohmmeter_resistance(0.01, 0.01, f64::NAN, 20e6), OPEN_CIRCUIT);
        assert_eq!(ohmmeter_resistance(0.01, 0.01, 0.01, 20e6), OPEN_CIRCUIT);
        assert_eq!(ohmmeter_resistance(0.01, 0.01, 0.0099999, 1.0), OPEN_CIRCUIT);
    }

    #[test]
    fn adjacency_follows_mode() {
        let mut meter = Multimeter::new(&BoardConfig::default());
        assert!(meter.opposite(Multimeter::V).is_empty());

        meter.mode = MultimeterMode::DcVoltage;
        assert_eq!(meter.opposite(Multimeter::V), &[Multimeter::G]);
        assert!(meter.opposite(Multimeter::A).is_empty());

        meter.mode = MultimeterMode::DcCurrent;
        assert_eq!(meter.opposite(Multimeter::A), &[Multimeter::G]);
        assert!(meter.opposite(Multimeter::V).is_empty());

        meter.mode = MultimeterMode::Resistance;
        for terminal in 0..Multimeter::TERMINALS.len() {
            assert!(meter.opposite(terminal).is_empty());
        }
    }
}
