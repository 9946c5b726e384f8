pub mod budget;
pub mod clause_db;
pub mod conflict;
pub mod decision_heuristic;
pub mod random;
pub mod restart;
mod search;
pub mod watches;

pub use self::search::{SolveResult, Solver, Stats};

use self::clause_db::ClauseDBSettings;
use self::decision_heuristic::DecisionHeuristicSettings;
use self::restart::RestartSettings;

/// Every option enumerated in spec.md §6, grouped by the subsystem that
/// consumes it. `conf_limit`/`prop_limit` are not here: they belong to a
/// `Budget`, supplied per `solve` call (spec.md §5).
pub struct CoreSettings {
    pub verbose: bool,
    pub no_simplify: bool,
    pub decision: DecisionHeuristicSettings,
    pub clause_db: ClauseDBSettings,
    pub restart: RestartSettings,
    /// Fraction of (originals + learnts) the learnt set may reach before
    /// triggering reduction, independent of the conflict-count schedule.
    pub learnt_ratio: f64,
    pub garbage_max_ratio: f64,
}

impl Default for CoreSettings {
    fn default() -> CoreSettings {
        CoreSettings {
            verbose: false,
            no_simplify: false,
            decision: DecisionHeuristicSettings::default(),
            clause_db: ClauseDBSettings::default(),
            restart: RestartSettings::default(),
            learnt_ratio: 1.0 / 3.0,
            garbage_max_ratio: 0.2,
        }
    }
}
