use crate::sat::formula::assignment::Assignment;
use crate::sat::formula::{Lit, Var, VarMap, VarHeap};
use super::random::Random;

#[derive(PartialEq, Eq, Clone, Copy)]
pub enum PhaseSaving {
    None,
    Limited,
    Full,
}

#[derive(Clone)]
pub struct DecisionHeuristicSettings {
    pub var_decay: f64,
    pub random_seed: f64,
    pub random_var_freq: f64,
    pub phase_saving: PhaseSaving,
    pub rnd_pol: bool,
    pub rnd_init_act: bool,
}

impl Default for DecisionHeuristicSettings {
    fn default() -> DecisionHeuristicSettings {
        DecisionHeuristicSettings {
            var_decay: 0.95,
            random_seed: 91648253.0,
            random_var_freq: 0.0,
            phase_saving: PhaseSaving::Full,
            rnd_pol: false,
            rnd_init_act: false,
        }
    }
}

struct VarLine {
    polarity: bool,
    user_pol: Option<bool>,
    decision: bool,
}

/// Activity-ordered variable selection with sticky polarity saving
/// (spec.md §4.2, §9). The heap holds every variable ever marked as a
/// decision variable; assigned variables are filtered out lazily at pop
/// time rather than removed eagerly.
pub struct DecisionHeuristic {
    settings: DecisionHeuristicSettings,
    var_inc: f64,
    rand: Random,
    var: VarMap<VarLine>,
    activity: VarMap<f64>,
    queue: VarHeap,

    pub dec_vars: usize,
    pub rnd_decisions: u64,
}

impl DecisionHeuristic {
    pub fn new(settings: DecisionHeuristicSettings) -> DecisionHeuristic {
        let seed = settings.random_seed;
        DecisionHeuristic {
            settings,
            var_inc: 1.0,
            rand: Random::new(seed),
            var: VarMap::new(),
            activity: VarMap::new(),
            queue: VarHeap::new(),
            dec_vars: 0,
            rnd_decisions: 0,
        }
    }

    pub fn init_var(&mut self, v: Var, upol: Option<bool>, dvar: bool) {
        self.activity.insert(&v, if self.settings.rnd_init_act { self.rand.drand() * 0.00001 } else { 0.0 });
        self.var.insert(&v, VarLine { polarity: true, user_pol: upol, decision: false });
        self.set_decision_var(v, dvar);
    }

    pub fn set_decision_var(&mut self, v: Var, b: bool) {
        let ln = &mut self.var[&v];
        if b != ln.decision {
            ln.decision = b;
            if b {
                self.dec_vars += 1;
                let act = &self.activity;
                self.queue.insert(v, |a, b| act[a] > act[b]);
            } else {
                self.dec_vars -= 1;
            }
        }
    }

    /// Called when `lit` is unassigned by backtracking: saves its polarity
    /// and makes the variable eligible for selection again.
    pub fn cancel(&mut self, lit: Lit, top_level: bool) {
        let ln = &mut self.var[&lit.var()];
        match self.settings.phase_saving {
            PhaseSaving::Full => ln.polarity = lit.sign(),
            PhaseSaving::Limited if top_level => ln.polarity = lit.sign(),
            _ => {}
        }
        if ln.decision {
            let act = &self.activity;
            self.queue.insert(lit.var(), |a, b| act[a] > act[b]);
        }
    }

    pub fn bump_activity(&mut self, v: &Var) {
        let new = self.activity[v] + self.var_inc;
        if new > 1e100 {
            self.var_inc *= 1e-100;
            for (_, act) in self.activity.iter_mut() {
                *act *= 1e-100;
            }
            self.activity[v] = new * 1e-100;
        } else {
            self.activity[v] = new;
        }

        let act = &self.activity;
        self.queue.update(v, |a, b| act[a] > act[b]);
    }

    pub fn decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.settings.var_decay;
    }

    pub fn rebuild_order_heap(&mut self, assigns: &Assignment) {
        let mut tmp = Vec::with_capacity(self.queue.len());
        for (v, vl) in self.var.iter() {
            if vl.decision && assigns.is_undef(v) {
                tmp.push(v);
            }
        }
        let act = &self.activity;
        self.queue.heapify_from(tmp, |a, b| act[a] > act[b]);
    }

    fn pick_branch_var(&mut self, assigns: &Assignment) -> Option<Var> {
        if self.rand.chance(self.settings.random_var_freq) && !self.queue.is_empty() {
            let v = self.queue[self.rand.irand(self.queue.len())];
            if assigns.is_undef(v) && self.var[&v].decision {
                self.rnd_decisions += 1;
                return Some(v);
            }
        }

        while let Some(v) = {
            let act = &self.activity;
            self.queue.pop(|a, b| act[a] > act[b])
        } {
            if assigns.is_undef(v) && self.var[&v].decision {
                return Some(v);
            }
        }

        None
    }

    pub fn pick_branch_lit(&mut self, assigns: &Assignment) -> Option<Lit> {
        self.pick_branch_var(assigns).map(|v| {
            let ln = &self.var[&v];
            let s = match ln.user_pol {
                Some(s) => s,
                None if self.settings.rnd_pol => self.rand.chance(0.5),
                None => ln.polarity,
            };
            v.sign_lit(s)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristic(settings: DecisionHeuristicSettings) -> (DecisionHeuristic, Vec<Var>, Assignment) {
        let mut dh = DecisionHeuristic::new(settings);
        let mut assigns = Assignment::new();
        let vars: Vec<Var> = (0..4)
            .map(|_| {
                let v = assigns.new_var();
                dh.init_var(v, None, true);
                v
            })
            .collect();
        (dh, vars, assigns)
    }

    #[test]
    fn picks_the_most_bumped_variable_first() {
        let (mut dh, vars, assigns) = heuristic(DecisionHeuristicSettings::default());
        dh.bump_activity(&vars[2]);
        dh.bump_activity(&vars[2]);
        dh.bump_activity(&vars[0]);

        let lit = dh.pick_branch_lit(&assigns).expect("a decision variable remains");
        assert_eq!(lit.var(), vars[2]);
    }

    #[test]
    fn full_phase_saving_remembers_the_last_polarity() {
        let settings = DecisionHeuristicSettings { phase_saving: PhaseSaving::Full, ..DecisionHeuristicSettings::default() };
        let (mut dh, vars, mut assigns) = heuristic(settings);

        assigns.new_decision_level();
        let neg = vars[0].neg_lit();
        assigns.assign_lit(neg, None);
        dh.cancel(neg, false);
        assigns.rewind_until_level(crate::sat::formula::assignment::GROUND_LEVEL, |_| {});

        let lit = dh.pick_branch_lit(&assigns).expect("a decision variable remains");
        assert_eq!(lit.var(), vars[0]);
        assert!(lit.sign());
    }

    #[test]
    fn already_assigned_variables_are_skipped() {
        let (mut dh, vars, mut assigns) = heuristic(DecisionHeuristicSettings::default());
        assigns.assign_lit(vars[0].pos_lit(), None);
        assigns.assign_lit(vars[2].pos_lit(), None);
        assigns.assign_lit(vars[3].pos_lit(), None);

        let lit = dh.pick_branch_lit(&assigns).expect("vars[1] is still undecided");
        assert_eq!(lit.var(), vars[1]);
    }

    #[test]
    fn non_decision_variables_are_never_picked() {
        let (mut dh, vars, assigns) = heuristic(DecisionHeuristicSettings::default());
        for &v in &vars {
            if v != vars[3] {
                dh.set_decision_var(v, false);
            }
        }

        let lit = dh.pick_branch_lit(&assigns).expect("vars[3] is the only decision var");
        assert_eq!(lit.var(), vars[3]);
    }
}
