use crate::errors::SolverError;
use crate::netlist::{Solution, SolveRequest};

/// The numeric DC solver behind the scheduler.
///
/// Implementations return a voltage for every node they solved. Nodes missing
/// from the [`Solution`] read NaN on the board. Malformed netlists should be
/// reported as [`SolverError::Validation`]; every other error is treated as a
/// generic failure. Both recover the same way.
pub trait NetworkSolver {
    fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError>;
}

impl<S: NetworkSolver + ?Sized> NetworkSolver for Box<S> {
    fn solve(&mut self, request: &SolveRequest) -> Result<Solution, SolverError> {
        (**self).solve(request)
    }
}
