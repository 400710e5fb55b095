//! Component models. Each variant owns its electrical state and knows how to
//! contribute to a netlist, which of its terminals are adjacent for traversal,
//! and how to derive readings from its terminal voltages.

pub mod battery;
pub mod diode;
pub mod flasher;
pub mod lightbulb;
pub mod motor;
pub mod multimeter;
pub mod potentiometer;
pub mod relay;
pub mod resistor;

pub use battery::Battery;
pub use diode::Diode;
pub use flasher::ElectronicFlasher;
pub use lightbulb::Lightbulb;
pub use motor::Motor;
pub use multimeter::{Multimeter, MultimeterMode, OPEN_CIRCUIT};
pub use potentiometer::Potentiometer;
pub use relay::{Relay, RelayState};
pub use resistor::{Cable, Fuse, Resistor, Switch};
