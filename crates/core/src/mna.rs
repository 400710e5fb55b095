//! Reference DC solver using modified nodal analysis.
//!
//! Every connected group of nodes is referenced to the negative node of its
//! first voltage source. Capacitors are open at DC; a `gmin` conductance from
//! every node to reference keeps capacitor-only nodes solvable. Diodes are
//! linearised around the previous Newton iterate with junction voltage
//! limiting.

use std::collections::{HashMap, HashSet};

use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

use crate::errors::SolverError;
use crate::netlist::{DiodeParams, ElementKind, Netlist, Solution, SolveRequest};
use crate::solver::NetworkSolver;

/// kT/q at 300 K.
pub const THERMAL_VOLTAGE: f64 = 0.025852;

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceCriteria {
    /// Absolute voltage tolerance (V).
    pub v_abstol: f64,
    /// Relative voltage tolerance.
    pub v_reltol: f64,
    pub max_iterations: usize,
    /// Shunt conductance from every node to reference (S).
    pub gmin: f64,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self { v_abstol: 1e-6, v_reltol: 1e-3, max_iterations: 100, gmin: 1e-12 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MnaSolver {
    pub criteria: ConvergenceCriteria,
}

impl MnaSolver {
    pub fn new(criteria: ConvergenceCriteria) -> Self {
        Self { criteria }
    }

    pub fn solve_netlist(&self, netlist: &Netlist) -> Result<Solution, SolverError> {
        if netlist.is_empty() {
            return Ok(Solution::new());
        }
        let references = validate(netlist)?;
        let map = NodeMap::new(netlist, &references);
        let diode_count = netlist
            .elements()
            .iter()
            .filter(|e| matches!(e.kind, ElementKind::Diode { .. }))
            .count();

        let mut x = DVector::zeros(map.size());
        let mut junctions = vec![0.0; diode_count];
        for iteration in 0..self.criteria.max_iterations {
            let (a, b) = self.assemble(netlist, &map, &x, &mut junctions);
            let next = solve_dense(a, &b)?;
            let converged = diode_count == 0 || (iteration > 0 && self.converged(&x, &next, map.num_nodes));
            x = next;
            trace!(iteration, converged, "newton iteration");
            if converged {
                debug!(nodes = map.num_nodes, sources = map.num_sources, iterations = iteration + 1, "dc solve");
                return Ok(map.solution(&x));
            }
        }
        Err(SolverError::ConvergenceFailed { iterations: self.criteria.max_iterations })
    }

    fn assemble(
        &self,
        netlist: &Netlist,
        map: &NodeMap<'_>,
        x: &DVector<f64>,
        junctions: &mut [f64],
    ) -> (DMatrix<f64>, DVector<f64>) {
        let n = map.num_nodes;
        let mut a = DMatrix::zeros(map.size(), map.size());
        let mut rhs = DVector::zeros(map.size());
        for i in 0..n {
            a[(i, i)] += self.criteria.gmin;
        }

        let mut source = 0;
        let mut diode = 0;
        for element in netlist.elements() {
            match &element.kind {
                ElementKind::Resistor { a: na, b: nb, ohms } => {
                    stamp_conductance(&mut a, map.index(na), map.index(nb), 1.0 / ohms);
                }
                ElementKind::Capacitor { .. } => {}
                ElementKind::VoltageSource { pos, neg, volts } => {
                    let row = n + source;
                    source += 1;
                    if let Some(i) = map.index(pos) {
                        a[(i, row)] += 1.0;
                        a[(row, i)] += 1.0;
                    }
                    if let Some(j) = map.index(neg) {
                        a[(j, row)] -= 1.0;
                        a[(row, j)] -= 1.0;
                    }
                    rhs[row] = *volts;
                }
                ElementKind::Diode { anode, cathode, params } => {
                    let (ia, ik) = (map.index(anode), map.index(cathode));
                    let raw = node_voltage(x, ia) - node_voltage(x, ik);
                    let vd = limit_junction(raw, junctions[diode], params);
                    junctions[diode] = vd;
                    diode += 1;

                    let (id, gd) = evaluate_diode(vd, params, self.criteria.gmin);
                    let ieq = id - gd * vd;
                    stamp_conductance(&mut a, ia, ik, gd);
                    if let Some(i) = ia {
                        rhs[i] -= ieq;
                    }
                    if let Some(k) = ik {
                        rhs[k] += ieq;
                    }
                }
            }
        }
        (a, rhs)
    }

    fn converged(&self, old: &DVector<f64>, new: &DVector<f64>, num_nodes: usize) -> bool {
        (0..num_nodes).all(|i| {
            let tol = self.criteria.v_reltol * new[i].abs().max(old[i].abs()) + self.criteria.v_abstol;
            (new[i] - old[i]).abs() <= tol
        })
    }
}

impl NetworkSolver for MnaSolver {
    fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError> {
        self.solve_netlist(&request.netlist)
    }
}

/// Rejects netlists no DC solve can make sense of and returns the reference
/// node of every partition.
pub fn validate(netlist: &Netlist) -> Result<HashSet<&str>, SolverError> {
    let mut violations = Vec::new();
    let mut names = HashSet::new();
    let mut source_pairs: HashMap<(&str, &str), &str> = HashMap::new();

    for element in netlist.elements() {
        let name = element.name.as_str();
        if !names.insert(name) {
            violations.push(format!("duplicate element name {name}"));
        }
        match &element.kind {
            ElementKind::Resistor { ohms, .. } if !(ohms.is_finite() && *ohms > 0.0) => {
                violations.push(format!("{name}: resistance {ohms} must be positive and finite"));
            }
            ElementKind::Capacitor { farads, .. } if !(farads.is_finite() && *farads > 0.0) => {
                violations.push(format!("{name}: capacitance {farads} must be positive and finite"));
            }
            ElementKind::VoltageSource { volts, .. } if !volts.is_finite() => {
                violations.push(format!("{name}: source voltage {volts} must be finite"));
            }
            ElementKind::Diode { params, .. }
                if !(params.saturation_current > 0.0 && params.emission_coefficient > 0.0) =>
            {
                violations.push(format!("{name}: invalid diode parameters"));
            }
            _ => {}
        }
        if element.is_source() {
            let (pos, neg) = element.nodes();
            if pos == neg {
                violations.push(format!("{name}: source connects {pos} to itself"));
            }
            let key = if pos < neg { (pos, neg) } else { (neg, pos) };
            if let Some(previous) = source_pairs.insert(key, name) {
                violations.push(format!("{previous} and {name} both drive {pos}-{neg}"));
            }
        }
    }

    let partitions = Partitions::new(netlist);
    let mut references: HashMap<usize, &str> = HashMap::new();
    for element in netlist.elements() {
        if let ElementKind::VoltageSource { pos, neg, .. } = &element.kind {
            references.entry(partitions.root(pos)).or_insert(neg.as_str());
        }
    }
    for (root, nodes) in partitions.groups() {
        if !references.contains_key(&root) {
            violations.push(format!("floating subcircuit without a source: {}", nodes.join(", ")));
        }
    }

    if violations.is_empty() {
        Ok(references.into_values().collect())
    } else {
        Err(SolverError::Validation { violations })
    }
}

/// Union-find over node names.
struct Partitions<'a> {
    index: HashMap<&'a str, usize>,
    parent: Vec<usize>,
}

impl<'a> Partitions<'a> {
    fn new(netlist: &'a Netlist) -> Self {
        let index: HashMap<&str, usize> =
            netlist.nodes().into_iter().enumerate().map(|(i, n)| (n, i)).collect();
        let mut partitions = Self { parent: (0..index.len()).collect(), index };
        for element in netlist.elements() {
            let (a, b) = element.nodes();
            let (ra, rb) = (partitions.root(a), partitions.root(b));
            if ra != rb {
                partitions.parent[ra] = rb;
            }
        }
        partitions
    }

    fn find(&self, mut i: usize) -> usize {
        while self.parent[i] != i {
            i = self.parent[i];
        }
        i
    }

    fn root(&self, node: &str) -> usize {
        self.find(self.index[node])
    }

    fn groups(&self) -> Vec<(usize, Vec<&'a str>)> {
        let mut groups: HashMap<usize, Vec<&str>> = HashMap::new();
        for (&node, &i) in &self.index {
            groups.entry(self.find(i)).or_default().push(node);
        }
        let mut groups: Vec<(usize, Vec<&str>)> = groups.into_iter().collect();
        for (_, nodes) in groups.iter_mut() {
            nodes.sort_unstable();
        }
        groups.sort_by(|a, b| a.1.cmp(&b.1));
        groups
    }
}

/// Matrix rows: one per non-reference node, then one per voltage source.
struct NodeMap<'a> {
    index: HashMap<&'a str, Option<usize>>,
    num_nodes: usize,
    num_sources: usize,
}

impl<'a> NodeMap<'a> {
    fn new(netlist: &'a Netlist, references: &HashSet<&str>) -> Self {
        let mut index = HashMap::new();
        let mut num_nodes = 0;
        for node in netlist.nodes() {
            if references.contains(node) {
                index.insert(node, None);
            } else {
                index.insert(node, Some(num_nodes));
                num_nodes += 1;
            }
        }
        let num_sources = netlist.elements().iter().filter(|e| e.is_source()).count();
        Self { index, num_nodes, num_sources }
    }

    fn size(&self) -> usize {
        self.num_nodes + self.num_sources
    }

    fn index(&self, node: &str) -> Option<usize> {
        self.index.get(node).copied().flatten()
    }

    fn solution(&self, x: &DVector<f64>) -> Solution {
        self.index.iter().map(|(node, idx)| (node.to_string(), node_voltage(x, *idx))).collect()
    }
}

fn node_voltage(x: &DVector<f64>, idx: Option<usize>) -> f64 {
    idx.map_or(0.0, |i| x[i])
}

fn stamp_conductance(a: &mut DMatrix<f64>, i: Option<usize>, j: Option<usize>, g: f64) {
    if let Some(i) = i {
        a[(i, i)] += g;
    }
    if let Some(j) = j {
        a[(j, j)] += g;
    }
    if let (Some(i), Some(j)) = (i, j) {
        a[(i, j)] -= g;
        a[(j, i)] -= g;
    }
}

fn solve_dense(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
    let x = a.lu().solve(b).ok_or(SolverError::SingularMatrix)?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SolverError::Failure("non-finite node voltage".to_string()))
    }
}

/// Shockley current and small-signal conductance at junction voltage `vd`.
pub fn evaluate_diode(vd: f64, params: &DiodeParams, gmin: f64) -> (f64, f64) {
    let nvt = params.emission_coefficient * THERMAL_VOLTAGE;
    let exp = (vd / nvt).exp();
    let id = params.saturation_current * (exp - 1.0);
    let gd = (params.saturation_current * exp / nvt).max(gmin);
    (id, gd)
}

/// Limits the change of a junction voltage between Newton iterations so the
/// exponential cannot overflow.
pub fn limit_junction(vnew: f64, vold: f64, params: &DiodeParams) -> f64 {
    let nvt = params.emission_coefficient * THERMAL_VOLTAGE;
    let vcrit = nvt * (nvt / (std::f64::consts::SQRT_2 * params.saturation_current)).ln();
    if vnew <= vcrit || (vnew - vold).abs() <= 2.0 * nvt {
        return vnew;
    }
    if vold > 0.0 {
        let arg = 1.0 + (vnew - vold) / nvt;
        if arg > 0.0 { vold + nvt * arg.ln() } else { vcrit }
    } else {
        nvt * (vnew / nvt).ln()
    }
}
