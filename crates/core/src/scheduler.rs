use std::collections::VecDeque;

use tracing::{debug, warn};

use crate::errors::SolverError;
use crate::netlist::{Solution, SolveRequest};
use crate::solver::NetworkSolver;

/// How a dispatch ended. Every status is followed by the same propagation
/// step; only `Solved` carries voltages.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveStatus {
    Solved,
    ValidationFailed { violations: Vec<String> },
    Failed { reason: String },
}

impl SolveStatus {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved)
    }
}

/// Result of running one request against the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub sequence: u64,
    pub status: SolveStatus,
    pub solution: Option<Solution>,
}

impl Dispatch {
    fn from_result(sequence: u64, result: Result<Solution, SolverError>) -> Self {
        match result {
            Ok(solution) => Self { sequence, status: SolveStatus::Solved, solution: Some(solution) },
            Err(SolverError::Validation { violations }) => {
                warn!(sequence, violations = violations.len(), "netlist rejected: {}", violations.join("; "));
                Self { sequence, status: SolveStatus::ValidationFailed { violations }, solution: None }
            }
            Err(err) => {
                warn!(sequence, %err, "solve failed");
                Self { sequence, status: SolveStatus::Failed { reason: err.to_string() }, solution: None }
            }
        }
    }

    /// Voltage to write into `port`: the solved value, or NaN when the port
    /// was not solved or the dispatch failed.
    pub fn voltage(&self, port: &str) -> f64 {
        self.solution.as_ref().and_then(|s| s.voltage(port)).unwrap_or(f64::NAN)
    }
}

/// FIFO of solve requests in front of a [`NetworkSolver`], with at most one
/// request in flight.
///
/// The queue holds sequence numbers only; the owner builds the
/// [`SolveRequest`] snapshot when a request reaches the head, so a request
/// that is still waiting never touches the board. A dispatch runs in three
/// steps: [`CircuitSolver::begin_next`] takes the head of the queue and marks
/// the scheduler busy, [`CircuitSolver::execute`] runs the solver, and
/// [`CircuitSolver::finish`] clears the busy flag once results have been
/// propagated. Requests enqueued in between only append.
#[derive(Debug)]
pub struct CircuitSolver<S> {
    solver: S,
    queue: VecDeque<u64>,
    busy: bool,
    next_sequence: u64,
    dispatched: u64,
}

impl<S: NetworkSolver> CircuitSolver<S> {
    pub fn new(solver: S) -> Self {
        Self { solver, queue: VecDeque::new(), busy: false, next_sequence: 0, dispatched: 0 }
    }

    /// Appends a request and returns its sequence number.
    pub fn enqueue(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.queue.push_back(sequence);
        debug!(sequence, queued = self.queue.len(), busy = self.busy, "solve enqueued");
        sequence
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Dequeues the next sequence number and marks the scheduler busy.
    /// Returns `None` while a request is in flight or when the queue is empty.
    pub fn begin_next(&mut self) -> Option<u64> {
        if self.busy {
            return None;
        }
        let sequence = self.queue.pop_front()?;
        self.busy = true;
        debug!(sequence, remaining = self.queue.len(), "dispatching solve");
        Some(sequence)
    }

    pub fn execute(&mut self, request: &SolveRequest) -> Dispatch {
        debug_assert!(self.busy, "execute outside begin_next/finish");
        self.dispatched += 1;
        let result = self.solver.solve(request);
        Dispatch::from_result(request.sequence, result)
    }

    pub fn finish(&mut self) {
        self.busy = false;
    }

    /// Number of solver invocations so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut S {
        &mut self.solver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::Netlist;

    struct Echo;

    impl NetworkSolver for Echo {
        fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError> {
            let mut solution = Solution::new();
            solution.insert("seq", request.sequence as f64);
            Ok(solution)
        }
    }

    struct Reject;

    impl NetworkSolver for Reject {
        fn solve(&mut self, _: &SolveRequest) -> Result<Solution, SolverError> {
            Err(SolverError::Validation { violations: vec!["floating".into()] })
        }
    }

    #[test]
    fn one_request_in_flight() {
        let mut scheduler = CircuitSolver::new(Echo);
        assert_eq!(scheduler.enqueue(), 0);
        assert_eq!(scheduler.enqueue(), 1);

        let first = scheduler.begin_next().unwrap();
        assert!(scheduler.is_busy());
        assert!(scheduler.begin_next().is_none());
        let request = SolveRequest::new(first, Netlist::new(), 12.0, None);
        assert_eq!(scheduler.execute(&request).voltage("seq"), 0.0);
        scheduler.finish();

        let second = scheduler.begin_next().unwrap();
        let request = SolveRequest::new(second, Netlist::new(), 12.0, Some(0.01));
        assert!(request.ohmmeter_enabled);
        assert_eq!(scheduler.execute(&request).voltage("seq"), 1.0);
        scheduler.finish();
        assert!(scheduler.begin_next().is_none());
        assert_eq!(scheduler.dispatched(), 2);
    }

    #[test]
    fn validation_failure_yields_nan_everywhere() {
        let mut scheduler = CircuitSolver::new(Reject);
        scheduler.enqueue();
        let sequence = scheduler.begin_next().unwrap();
        let request = SolveRequest::new(sequence, Netlist::new(), 12.0, None);
        let dispatch = scheduler.execute(&request);
        assert!(matches!(dispatch.status, SolveStatus::ValidationFailed { .. }));
        assert!(dispatch.voltage("anything").is_nan());
    }
}
