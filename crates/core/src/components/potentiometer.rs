use crate::component::{Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

/// Three-terminal potentiometer: track ends `g` and `i`, wiper `h`.
///
/// The wiper is the only terminal bridged to both ends; `g` and `i` are never
/// adjacent to each other directly, so a path across the track always goes
/// through `h`.
#[derive(Debug, Clone, PartialEq)]
pub struct Potentiometer {
    /// Total track resistance `g`–`i`.
    pub gi: f64,
    /// Wiper-to-`i` resistance.
    pub hi: f64,
    min_resistance: f64,
}

impl Potentiometer {
    pub const TERMINALS: &'static [&'static str] = &["g", "h", "i"];

    pub const G: usize = 0;
    pub const H: usize = 1;
    pub const I: usize = 2;

    pub fn new(config: &BoardConfig, total: f64, wiper: f64) -> Self {
        let mut pot = Self { gi: total, hi: 0.0, min_resistance: config.wire_resistance };
        pot.set_wiper(wiper);
        pot
    }

    pub fn set_wiper(&mut self, hi: f64) {
        self.hi = hi.clamp(0.0, self.gi);
    }

    pub fn gh(&self) -> f64 {
        self.gi - self.hi
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        let (g, h, i) = (t.connected(Self::G), t.connected(Self::H), t.connected(Self::I));
        if g && (h || i) {
            netlist.resistor(
                format!("{name}.gh"),
                t.id(Self::G),
                t.id(Self::H),
                self.gh().max(self.min_resistance),
            );
        }
        if i && (h || g) {
            netlist.resistor(
                format!("{name}.hi"),
                t.id(Self::H),
                t.id(Self::I),
                self.hi.max(self.min_resistance),
            );
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match terminal {
            Self::H => &[Self::G, Self::I],
            Self::G | Self::I => &[Self::H],
            _ => &[],
        }
    }

    /// Readings across the wiper section `h`–`i`.
    pub fn readings(&self, t: &Terminals<'_>) -> Readings {
        let (vh, vi) = (t.voltage(Self::H), t.voltage(Self::I));
        if !both_defined(vh, vi) {
            return Readings { resistance: self.hi, ..Readings::undefined() };
        }
        let voltage = (vh - vi).abs();
        let resistance = self.hi.max(self.min_resistance);
        Readings { voltage, current: voltage / resistance, resistance: self.hi }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{Port, PortId};

    fn arena(connected: [bool; 3]) -> Vec<Port> {
        ["pot.g", "pot.h", "pot.i"]
            .iter()
            .zip(connected)
            .map(|(id, c)| {
                let mut p = Port::new(*id);
                p.connected = c;
                p
            })
            .collect()
    }

    const IDS: [PortId; 3] = [PortId(0), PortId(1), PortId(2)];

    #[test]
    fn ends_are_only_adjacent_to_wiper() {
        let pot = Potentiometer::new(&BoardConfig::default(), 100.0, 40.0);
        assert_eq!(pot.opposite(Potentiometer::H), &[0, 2]);
        assert_eq!(pot.opposite(Potentiometer::G), &[1]);
        assert_eq!(pot.opposite(Potentiometer::I), &[1]);
    }

    #[test]
    fn track_sections_follow_wiper() {
        let pot = Potentiometer::new(&BoardConfig::default(), 100.0, 40.0);
        let ports = arena([true, true, true]);
        let mut netlist = Netlist::new();
        pot.contribute("pot", &Terminals::new(&IDS, &ports), &mut netlist);
        assert_eq!(netlist.len(), 2);
        assert_eq!(pot.gh(), 60.0);
    }

    #[test]
    fn unused_wiper_still_carries_the_whole_track() {
        let pot = Potentiometer::new(&BoardConfig::default(), 100.0, 40.0);
        let ports = arena([true, false, true]);
        let mut netlist = Netlist::new();
        pot.contribute("pot", &Terminals::new(&IDS, &ports), &mut netlist);
        assert_eq!(netlist.len(), 2);

        let ports = arena([true, false, false]);
        let mut netlist = Netlist::new();
        pot.contribute("pot", &Terminals::new(&IDS, &ports), &mut netlist);
        assert!(netlist.is_empty());
    }

    #[test]
    fn wiper_is_clamped_to_track() {
        let mut pot = Potentiometer::new(&BoardConfig::default(), 100.0, 0.0);
        pot.set_wiper(250.0);
        assert_eq!(pot.hi, 100.0);
        pot.set_wiper(-3.0);
        assert_eq!(pot.hi, 0.0);
    }
}
