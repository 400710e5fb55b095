//! Shared builders and fake solvers for the integration tests.
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use electro_bench_core::component::KindSpec;
use electro_bench_core::netlist::{Solution, SolveRequest};
use electro_bench_core::{Board, BoardLayout, MnaSolver, NetworkSolver, SolverError};

pub fn standard_board() -> Board<MnaSolver> {
    standard_board_at(12.0)
}

pub fn standard_board_at(voltage: f64) -> Board<MnaSolver> {
    Board::new(BoardLayout::standard().with_board_voltage(voltage), MnaSolver::default()).unwrap()
}

/// Battery plus plain resistors: no component on it changes state between
/// solves, so repeated solves of the same wiring are bit-identical.
pub fn resistor_layout() -> BoardLayout {
    BoardLayout::new()
        .component("battery", KindSpec::Battery)
        .component("r1", KindSpec::Resistor(10.0))
        .component("r2", KindSpec::Resistor(22.0))
        .component("r3", KindSpec::Resistor(47.0))
}

pub fn wire<S: NetworkSolver>(board: &mut Board<S>, cables: &[(&str, &str, &str)]) {
    for (id, a, b) in cables {
        board.place_cable(id, a, b, false).unwrap();
    }
}

pub fn volts<S: NetworkSolver>(board: &Board<S>, port: &str) -> f64 {
    board.get_voltage(port).unwrap()
}

/// Shared view of what a [`RecordingSolver`] saw.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub sequences: Rc<RefCell<Vec<u64>>>,
    pub in_flight: Rc<Cell<usize>>,
    pub max_in_flight: Rc<Cell<usize>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<u64> {
        self.sequences.borrow().clone()
    }
}

/// Delegates to [`MnaSolver`] and records every invocation.
pub struct RecordingSolver {
    log: CallLog,
    inner: MnaSolver,
}

impl RecordingSolver {
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        (Self { log: log.clone(), inner: MnaSolver::default() }, log)
    }
}

impl NetworkSolver for RecordingSolver {
    fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError> {
        let depth = self.log.in_flight.get() + 1;
        self.log.in_flight.set(depth);
        self.log.max_in_flight.set(self.log.max_in_flight.get().max(depth));
        self.log.sequences.borrow_mut().push(request.sequence);
        let result = self.inner.solve(request);
        self.log.in_flight.set(depth - 1);
        result
    }
}

/// Solves normally until told to fail.
#[derive(Default)]
pub struct FlakySolver {
    pub failure: Option<SolverError>,
    inner: MnaSolver,
}

impl NetworkSolver for FlakySolver {
    fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError> {
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => self.inner.solve(request),
        }
    }
}
