use tracing::debug;

use crate::component::{AfterRecompute, Readings, Terminals};
use crate::config::BoardConfig;
use crate::netlist::Netlist;
use crate::units::both_defined;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelayState {
    #[default]
    NotActuated,
    Actuated,
}

/// Automotive changeover relay.
///
/// Ports, in order: coil `85` (negative), coil `86` (positive), normally-open
/// `87`, normally-closed `87A`, common `30`. The common terminal is joined to
/// exactly one armature contact at a time. Actuation uses two thresholds so a
/// coil current hovering near one of them cannot make the armature chatter.
#[derive(Debug, Clone, PartialEq)]
pub struct Relay {
    pub state: RelayState,
    pub coil_resistance: f64,
    pub threshold_high: f64,
    pub threshold_low: f64,
    contact_resistance: f64,
}

impl Relay {
    pub const TERMINALS: &'static [&'static str] = &["85", "86", "87", "87A", "30"];
    pub const WATCHED: &'static [usize] = &[Self::COIL_NEG, Self::COIL_POS];

    pub const COIL_NEG: usize = 0;
    pub const COIL_POS: usize = 1;
    pub const NO: usize = 2;
    pub const NC: usize = 3;
    pub const COMMON: usize = 4;

    pub fn new(config: &BoardConfig) -> Self {
        debug_assert!(config.relay_threshold_low < config.relay_threshold_high);
        Self {
            state: RelayState::NotActuated,
            coil_resistance: config.relay_coil_resistance,
            threshold_high: config.relay_threshold_high,
            threshold_low: config.relay_threshold_low,
            contact_resistance: config.wire_resistance,
        }
    }

    pub fn is_actuated(&self) -> bool {
        self.state == RelayState::Actuated
    }

    fn closed_contact(&self) -> usize {
        match self.state {
            RelayState::NotActuated => Self::NC,
            RelayState::Actuated => Self::NO,
        }
    }

    pub fn contribute(&self, name: &str, t: &Terminals<'_>, netlist: &mut Netlist) {
        if t.connected(Self::COIL_NEG) && t.connected(Self::COIL_POS) {
            netlist.resistor(
                format!("{name}.coil"),
                t.id(Self::COIL_NEG),
                t.id(Self::COIL_POS),
                self.coil_resistance,
            );
        }
        let contact = self.closed_contact();
        if t.connected(Self::COMMON) && t.connected(contact) {
            let suffix = if contact == Self::NO { "87" } else { "87A" };
            netlist.resistor(
                format!("{name}.{suffix}"),
                t.id(Self::COMMON),
                t.id(contact),
                self.contact_resistance,
            );
        }
    }

    pub fn opposite(&self, terminal: usize) -> &'static [usize] {
        match (terminal, self.state) {
            (Self::COIL_NEG, _) => &[Self::COIL_POS],
            (Self::COIL_POS, _) => &[Self::COIL_NEG],
            (Self::COMMON, RelayState::NotActuated) => &[Self::NC],
            (Self::COMMON, RelayState::Actuated) => &[Self::NO],
            (Self::NO, RelayState::Actuated) => &[Self::COMMON],
            (Self::NC, RelayState::NotActuated) => &[Self::COMMON],
            _ => &[],
        }
    }

    /// Applies the hysteresis rule for a coil current. Returns true on a state change.
    pub fn apply_coil_current(&mut self, current: f64) -> bool {
        let next = match self.state {
            RelayState::NotActuated if current >= self.threshold_high => RelayState::Actuated,
            RelayState::Actuated if current <= self.threshold_low => RelayState::NotActuated,
            state => state,
        };
        let changed = next != self.state;
        self.state = next;
        changed
    }

    pub fn recompute(&mut self, name: &str, t: &Terminals<'_>) -> (Readings, AfterRecompute) {
        let (v85, v86) = (t.voltage(Self::COIL_NEG), t.voltage(Self::COIL_POS));
        let readings = if both_defined(v85, v86) {
            let voltage = (v85 - v86).abs();
            Readings { voltage, current: voltage / self.coil_resistance, resistance: self.coil_resistance }
        } else {
            Readings { resistance: self.coil_resistance, ..Readings::undefined() }
        };

        // An unpowered coil carries no current.
        let current = if readings.current.is_nan() { 0.0 } else { readings.current };
        if self.apply_coil_current(current) {
            debug!(relay = name, state = ?self.state, current, "relay changed state");
            return (readings, AfterRecompute::ResolveRequested);
        }
        (readings, AfterRecompute::Settled)
    }
}
