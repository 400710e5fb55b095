use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CircuitError {
    #[error("Invalid resistance: {0} Ω (must be > 0 and finite)")]
    InvalidResistance(f64),
    #[error("Invalid capacitance: {0} F (must be > 0 and finite)")]
    InvalidCapacitance(f64),
    #[error("Invalid voltage: {0} V (must be finite)")]
    InvalidVoltage(f64),
}

/// Caller bugs: unknown identifiers, duplicate insertions, wrong component kind.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("Unknown port: {0}")]
    UnknownPort(String),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Unknown cable: {0}")]
    UnknownCable(String),
    #[error("Cable already placed: {0}")]
    DuplicateCable(String),
    #[error("Component already defined: {0}")]
    DuplicateComponent(String),
    #[error("Component {name} is not a {expected}")]
    KindMismatch { name: String, expected: &'static str },
    #[error("Component {name} needs {expected} ports, got {actual}")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("Netlist validation failed: {}", violations.join("; "))]
    Validation { violations: Vec<String> },
    #[error("Singular matrix")]
    SingularMatrix,
    #[error("Convergence failed after {iterations} iterations")]
    ConvergenceFailed { iterations: usize },
    #[error("Solver failure: {0}")]
    Failure(String),
}
