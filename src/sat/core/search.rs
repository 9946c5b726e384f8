use crate::sat::formula::assignment::{self, Assignment, DecisionLevel, GROUND_LEVEL};
use crate::sat::formula::clause::ClauseRef;
use crate::sat::formula::{LBool, Lit, Var};

use super::budget::Budget;
use super::clause_db::ClauseDB;
use super::conflict::{AnalyzeContext, CCMinMode, Conflict};
use super::decision_heuristic::DecisionHeuristic;
use super::restart::RestartPolicy;
use super::watches::Watches;
use super::CoreSettings;

/// Running counters surfaced to callers after `solve` returns (spec.md §6).
#[derive(Default, Debug)]
pub struct Stats {
    pub solves: u64,
    pub restarts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
    pub tot_literals: u64,
    pub del_literals: u64,
}

/// The outcome of a `solve` call (spec.md §3, §6). `Undetermined` is
/// returned once a supplied `Budget` is exhausted; the solver's internal
/// state is left exactly as the search loop found it, so a later call with
/// a looser budget resumes rather than restarts from scratch.
#[derive(PartialEq, Eq, Debug)]
pub enum SolveResult {
    Sat,
    Unsat,
    Undetermined,
}

enum Step {
    Decided(Lit),
    AssumptionFailed(Lit),
    Exhausted,
}

/// The CDCL core (spec.md §2-§4): owns the assignment trail, the clause
/// arena, the watch lists, the variable-activity order and the restart and
/// reduction policies, and drives them through one `search` loop per
/// `solve` call.
pub struct Solver {
    settings: CoreSettings,
    assigns: Assignment,
    watches: Watches,
    db: ClauseDB,
    decision: DecisionHeuristic,
    analyze: AnalyzeContext,
    restart: RestartPolicy,

    assumptions: Vec<Lit>,
    conflict: Vec<Lit>,
    model: Vec<LBool>,
    unsat: bool,

    stats: Stats,
}

impl Solver {
    pub fn new(settings: CoreSettings) -> Solver {
        let decision = DecisionHeuristic::new(settings.decision.clone());
        let ccmin_mode = CCMinMode::Deep;
        Solver {
            db: ClauseDB::new(settings.clause_db.clone()),
            restart: RestartPolicy::new(settings.restart.clone()),
            settings,
            assigns: Assignment::new(),
            watches: Watches::new(),
            decision,
            analyze: AnalyzeContext::new(ccmin_mode),
            assumptions: Vec::new(),
            conflict: Vec::new(),
            model: Vec::new(),
            unsat: false,
            stats: Stats::default(),
        }
    }

    pub fn n_vars(&self) -> usize {
        self.assigns.number_of_vars()
    }

    pub fn n_clauses(&self) -> usize {
        self.db.number_of_originals()
    }

    pub fn new_var(&mut self, upol: Option<bool>, dvar: bool) -> Var {
        let v = self.assigns.new_var();
        self.watches.init_var(v);
        self.decision.init_var(v, upol, dvar);
        self.analyze.init_var(v);
        v
    }

    /// Adds a clause of any size at the ground level (spec.md §4.1, §4.6).
    /// Duplicate literals are removed, tautologies are dropped, and
    /// literals already falsified at the ground level are removed since
    /// they can never become true again. Returns `false` once this call
    /// (or a prior one) makes the formula trivially unsatisfiable.
    pub fn add_clause(&mut self, literals: &[Lit]) -> bool {
        if self.unsat {
            return false;
        }
        assert!(self.assigns.is_ground_level(), "clauses may only be added at the ground level");

        let mut lits = literals.to_vec();
        lits.sort();
        lits.dedup();

        for w in lits.windows(2) {
            if w[0].var() == w[1].var() {
                return true; // tautology: p and ~p both present, trivially satisfied
            }
        }

        if lits.iter().any(|&l| self.assigns.is_sat(l)) {
            return true;
        }
        lits.retain(|&l| !self.assigns.is_unsat(l));

        match lits.len() {
            0 => {
                self.unsat = true;
                false
            }
            1 => {
                self.assigns.assign_lit(lits[0], None);
                if self.propagate().is_some() {
                    self.unsat = true;
                    false
                } else {
                    true
                }
            }
            _ => {
                self.db.add_clause(&lits, &mut self.watches);
                true
            }
        }
    }

    pub fn assume(&mut self, lit: Lit) {
        self.assumptions.push(lit);
    }

    pub fn clear_assumptions(&mut self) {
        self.assumptions.clear();
    }

    pub fn value(&self, v: Var) -> LBool {
        self.assigns.value(v)
    }

    pub fn model(&self) -> &[LBool] {
        &self.model
    }

    pub fn final_conflict(&self) -> &[Lit] {
        &self.conflict
    }

    pub fn stats(&self) -> Stats {
        Stats {
            solves: self.stats.solves,
            restarts: self.stats.restarts,
            decisions: self.stats.decisions,
            rnd_decisions: self.decision.rnd_decisions,
            conflicts: self.stats.conflicts,
            propagations: self.watches.propagations,
            tot_literals: self.analyze.tot_literals,
            del_literals: self.analyze.max_literals.saturating_sub(self.analyze.tot_literals),
        }
    }

    /// Runs CDCL search until the formula (together with the current
    /// assumptions) is decided or `budget` is exhausted (spec.md §4.7).
    pub fn solve(&mut self, budget: &Budget) -> SolveResult {
        self.stats.solves += 1;
        self.cancel_until(GROUND_LEVEL);

        if self.unsat {
            return SolveResult::Unsat;
        }

        info!("solve #{}: {} vars, {} clauses, {} assumptions", self.stats.solves, self.n_vars(), self.n_clauses(), self.assumptions.len());

        loop {
            if !budget.within(self.stats.conflicts, self.watches.propagations) {
                return SolveResult::Undetermined;
            }

            match self.propagate() {
                Some(confl) => {
                    self.stats.conflicts += 1;
                    self.handle_conflict(confl);
                    if self.unsat {
                        return SolveResult::Unsat;
                    }
                }

                None => {
                    if self.assigns.is_ground_level() && !self.settings.no_simplify {
                        self.db.remove_satisfied_originals(&self.assigns, &mut self.watches);
                        if self.db.garbage_ratio_exceeds(self.settings.garbage_max_ratio) {
                            self.db.reloc_gc(&mut self.assigns, &mut self.watches);
                        }
                    }

                    if self.assigns.number_of_assigns() == self.assigns.number_of_vars() {
                        self.model = assignment::extract_model(&self.assigns);
                        return SolveResult::Sat;
                    }

                    if self.restart.should_restart(self.stats.conflicts, self.assigns.number_of_assigns()) {
                        self.stats.restarts += 1;
                        if self.settings.verbose {
                            info!("restart #{}: {} conflicts, {} learnts", self.stats.restarts, self.stats.conflicts, self.db.number_of_learnts());
                        }
                        self.cancel_until(self.assumption_level());
                        self.restart.reset_fast();
                        continue;
                    }

                    let n_learnts = self.db.number_of_learnts();
                    let learnt_fraction = n_learnts as f64 / (self.db.number_of_originals() + n_learnts).max(1) as f64;
                    if n_learnts > 0 && (self.stats.conflicts >= self.db.n_confl_bfr_reduce || learnt_fraction >= self.settings.learnt_ratio) {
                        self.db.reduce(&self.assigns, &mut self.watches);
                        if self.db.garbage_ratio_exceeds(self.settings.garbage_max_ratio) {
                            self.db.reloc_gc(&mut self.assigns, &mut self.watches);
                        }
                    }

                    match self.next_step() {
                        Step::Decided(lit) => {
                            self.assigns.assign_lit(lit, None);
                        }
                        Step::AssumptionFailed(p) => {
                            // analyze_final reports the core in resolution polarity (the
                            // negation of each responsible assumption); flip it back so
                            // `final_conflict` lists literals as they were assumed.
                            let conflict = self.analyze.analyze_final(self.db.ca(), &self.assigns, !p);
                            self.conflict = conflict.iter().map(|(l, _)| !l).collect();
                            return SolveResult::Unsat;
                        }
                        Step::Exhausted => {
                            self.model = assignment::extract_model(&self.assigns);
                            return SolveResult::Sat;
                        }
                    }
                }
            }
        }
    }

    fn propagate(&mut self) -> Option<ClauseRef> {
        self.watches.propagate(self.db.ca_mut(), &mut self.assigns)
    }

    /// The decision level every assumption literal has been pushed below
    /// (spec.md §4.7): restarts never unwind past the assumptions.
    fn assumption_level(&self) -> DecisionLevel {
        DecisionLevel::new(0)
    }

    /// Picks the next literal to assign: the next still-open assumption, a
    /// branch variable from the activity order, or `Exhausted` once every
    /// variable is assigned (spec.md §4.2, §4.7).
    fn next_step(&mut self) -> Step {
        loop {
            let level = self.assigns.current_level().offset();
            if level >= self.assumptions.len() {
                break;
            }
            let p = self.assumptions[level];
            self.assigns.new_decision_level();
            if self.assigns.is_sat(p) {
                continue; // already implied; this decision level carries no literal of its own
            } else if self.assigns.is_unsat(p) {
                return Step::AssumptionFailed(p);
            } else {
                return Step::Decided(p);
            }
        }

        match self.decision.pick_branch_lit(&self.assigns) {
            Some(lit) => {
                self.stats.decisions += 1;
                self.assigns.new_decision_level();
                Step::Decided(lit)
            }
            None => Step::Exhausted,
        }
    }

    fn handle_conflict(&mut self, confl: ClauseRef) {
        self.decision.decay_activity();
        self.db.decay_activity();

        let decision = &mut self.decision;
        let conflict = self.analyze.analyze(&self.assigns, &mut self.db, confl, |v| decision.bump_activity(&v));

        match conflict {
            Conflict::Ground => {
                self.unsat = true;
            }

            Conflict::Unit(lit) => {
                self.cancel_until(GROUND_LEVEL);
                self.assigns.assign_lit(lit, None);
            }

            Conflict::Learned { backjump_level, asserting, clause, lbd } => {
                self.restart.record_conflict(lbd, self.assigns.number_of_assigns());

                self.cancel_until(DecisionLevel::new(backjump_level));

                if clause.len() == 1 {
                    self.assigns.assign_lit(asserting, None);
                } else {
                    let cr = self.db.learn_clause(&clause, lbd, &mut self.watches);
                    self.assigns.assign_lit(asserting, Some(cr));
                }
            }
        }
    }

    /// Unwinds the trail to `level`, restoring polarity and re-inserting
    /// freed variables into the decision heap (spec.md §4.2, §4.7).
    fn cancel_until(&mut self, level: DecisionLevel) {
        let top_level = level == GROUND_LEVEL;
        let decision = &mut self.decision;
        self.assigns.rewind_until_level(level, |lit| decision.cancel(lit, top_level));
    }
}
