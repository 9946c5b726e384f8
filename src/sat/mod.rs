pub mod core;
pub mod formula;

pub use self::core::{CoreSettings, SolveResult, Solver, Stats};
