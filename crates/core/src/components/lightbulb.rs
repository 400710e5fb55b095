use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Incandescent bulb with a voltage-dependent filament resistance.
///
/// After every recompute the resistance is re-linearised around the voltage
/// just measured: `R = base + coefficient * (V - reference)`. The next solve
/// therefore uses a resistance derived from the previous solve, and repeated
/// solves relax toward the bulb's operating point.
#[derive(Debug, Clone, PartialEq)]
pub struct Lightbulb {
    pub base: super::Resistor,
    pub base_resistance: f64,
    pub coefficient: f64,
    pub reference_voltage: f64,
    min_resistance: f64,
}

impl Lightbulb {
    pub fn new(config: &BoardConfig, base_resistance: f64, coefficient: f64, reference_voltage: f64) -> Self {
        Self {
            base: super::Resistor::new(base_resistance),
            base_resistance,
            coefficient,
            reference_voltage,
            min_resistance: config.lightbulb_min_resistance,
        }
    }

    pub fn resistance(&self) -> f64 {
        self.base.resistance
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        self.base.contribute(name, t, netlist);
    }

    pub fn recompute(&mut self, t: &Terminals<'_>) -> Readings {
        let (va, vb) = (t.voltage(0), t.voltage(1));
        if !both_defined(va, vb) {
            self.base.resistance = self.base_resistance;
            return Readings { resistance: self.base_resistance, ..Readings::undefined() };
        }
        let voltage = (va - vb).abs();
        let current = voltage / self.base.resistance;
        let next = self.base_resistance + self.coefficient * (voltage - self.reference_voltage);
        self.base.resistance = next.max(self.min_resistance);
        Readings { voltage, current, resistance: self.base.resistance }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Port, PortId};

    fn arena(va: f64, vb: f64) -> Vec<Port> {
        let mut a = Port::new("bulb.a");
        let mut b = Port::new("bulb.b");
        a.voltage = va;
        b.voltage = vb;
        vec![a, b]
    }

    #[test]
    fn resistance_follows_previous_voltage() {
        let config = BoardConfig::default();
        let mut bulb = Lightbulb::new(&config, 6.0, 0.5, 12.0);
        let ports = arena(10.0, 0.0);
        let readings = bulb.recompute(&Terminals::new(&[PortId(0), PortId(1)], &ports));
        assert_eq!(readings.current, 10.0 / 6.0);
        assert_eq!(bulb.resistance(), 5.0);
        assert_eq!(readings.resistance, 5.0);
    }

    #[test]
    fn undefined_voltage_restores_base_resistance() {
        let config = BoardConfig::default();
        let mut bulb = Lightbulb::new(&config, 6.0, 0.5, 12.0);
        bulb.base.resistance = 7.5;
        let ports = arena(f64::NAN, 0.0);
        let readings = bulb.recompute(&Terminals::new(&[PortId(0), PortId(1)], &ports));
        assert_eq!(bulb.resistance(), 6.0);
        assert!(readings.voltage.is_nan());
        assert!(readings.current.is_nan());
    }

    #[test]
    fn resistance_never_drops_below_minimum() {
        let config = BoardConfig::default();
        let mut bulb = Lightbulb::new(&config, 1.0, 1.0, 12.0);
        let ports = arena(0.0, 0.0);
        bulb.recompute(&Terminals::new(&[PortId(0), PortId(1)], &ports));
        assert_eq!(bulb.resistance(), config.lightbulb_min_resistance);
    }
}
