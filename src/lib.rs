#[macro_use]
extern crate log;

pub mod sat;

pub use crate::sat::core::budget::Budget;
pub use crate::sat::formula::{LBool, Lit, Var};
pub use crate::sat::{CoreSettings, SolveResult, Solver, Stats};
