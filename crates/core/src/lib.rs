pub mod board;
pub mod component;
pub mod components;
pub mod config;
pub mod connectivity;
pub mod errors;
pub mod graph;
pub mod layout;
pub mod mna;
pub mod netlist;
pub mod observer;
pub mod port;
pub mod scheduler;
pub mod solver;
pub mod units;

pub use board::Board;
pub use errors::{BoardError, CircuitError, SolverError};
pub use layout::BoardLayout;
pub use mna::MnaSolver;
pub use solver::NetworkSolver;
