//! Netlist snapshot handed to a [`crate::solver::NetworkSolver`].
//!
//! Nodes are named by port id. Elements keep insertion order, which is the
//! order components contributed them.

use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeParams {
    /// Saturation current (A).
    pub saturation_current: f64,
    /// Emission coefficient.
    pub emission_coefficient: f64,
    /// Zero-bias junction capacitance (F). Ignored at DC.
    pub junction_capacitance: f64,
    /// Junction potential (V).
    pub junction_potential: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self {
            saturation_current: 1e-14,
            emission_coefficient: 1.0,
            junction_capacitance: 0.0,
            junction_potential: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementKind {
    Resistor { a: String, b: String, ohms: f64 },
    VoltageSource { pos: String, neg: String, volts: f64 },
    Diode { anode: String, cathode: String, params: DiodeParams },
    Capacitor { a: String, b: String, farads: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub kind: ElementKind,
}

impl Element {
    pub fn nodes(&self) -> (&str, &str) {
        match &self.kind {
            ElementKind::Resistor { a, b, .. } | ElementKind::Capacitor { a, b, .. } => (a, b),
            ElementKind::VoltageSource { pos, neg, .. } => (pos, neg),
            ElementKind::Diode { anode, cathode, .. } => (anode, cathode),
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self.kind, ElementKind::VoltageSource { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Netlist {
    elements: Vec<Element>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resistor(&mut self, name: impl Into<String>, a: &str, b: &str, ohms: f64) {
        self.push(name, ElementKind::Resistor { a: a.to_string(), b: b.to_string(), ohms });
    }

    pub fn voltage_source(&mut self, name: impl Into<String>, pos: &str, neg: &str, volts: f64) {
        self.push(
            name,
            ElementKind::VoltageSource { pos: pos.to_string(), neg: neg.to_string(), volts },
        );
    }

    pub fn diode(&mut self, name: impl Into<String>, anode: &str, cathode: &str, params: DiodeParams) {
        self.push(
            name,
            ElementKind::Diode { anode: anode.to_string(), cathode: cathode.to_string(), params },
        );
    }

    pub fn capacitor(&mut self, name: impl Into<String>, a: &str, b: &str, farads: f64) {
        self.push(name, ElementKind::Capacitor { a: a.to_string(), b: b.to_string(), farads });
    }

    fn push(&mut self, name: impl Into<String>, kind: ElementKind) {
        self.elements.push(Element { name: name.into(), kind });
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Every node named by at least one element, sorted.
    pub fn nodes(&self) -> BTreeSet<&str> {
        self.elements
            .iter()
            .flat_map(|e| {
                let (a, b) = e.nodes();
                [a, b]
            })
            .collect()
    }

    pub fn mentions(&self, node: &str) -> bool {
        self.elements.iter().any(|e| {
            let (a, b) = e.nodes();
            a == node || b == node
        })
    }
}

/// Snapshot of the board taken when a queued solve reaches the head of the
/// queue; `sequence` is the enqueue order.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRequest {
    pub sequence: u64,
    pub netlist: Netlist,
    pub board_voltage: f64,
    pub ohmmeter_enabled: bool,
    pub ohmmeter_source_voltage: f64,
}

impl SolveRequest {
    pub fn new(sequence: u64, netlist: Netlist, board_voltage: f64, ohmmeter: Option<f64>) -> Self {
        Self {
            sequence,
            netlist,
            board_voltage,
            ohmmeter_enabled: ohmmeter.is_some(),
            ohmmeter_source_voltage: ohmmeter.unwrap_or(0.0),
        }
    }
}

/// Per-node voltages produced by a solver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    voltages: HashMap<String, f64>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<String>, voltage: f64) {
        self.voltages.insert(node.into(), voltage);
    }

    pub fn voltage(&self, node: &str) -> Option<f64> {
        self.voltages.get(node).copied()
    }

    pub fn len(&self) -> usize {
        self.voltages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voltages.is_empty()
    }
}

impl FromIterator<(String, f64)> for Solution {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self { voltages: iter.into_iter().collect() }
    }
}
