use std::collections::BTreeSet;
use std::fmt;

use crate::component::ComponentId;

/// Index of a port in the board's port arena. Stable for the board's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortId(pub usize);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An electrical node.
///
/// `voltage` is the last solver result for this node, or NaN when the node was
/// left out of the last solved netlist. `connected` is the merged result of the
/// most recent connectivity analysis and gates netlist contributions; the
/// per-pass `visited` bookkeeping lives in [`crate::connectivity::Pass`].
#[derive(Debug, Clone)]
pub struct Port {
    pub id: String,
    pub voltage: f64,
    pub connected: bool,
    pub terminators: BTreeSet<ComponentId>,
}

impl Port {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            voltage: f64::NAN,
            connected: false,
            terminators: BTreeSet::new(),
        }
    }

    pub fn has_voltage(&self) -> bool {
        !self.voltage.is_nan()
    }
}
